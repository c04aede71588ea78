use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use scanpipe_core::consts::MAX_PREFIX;
use scanpipe_core::layout::{detect_layout, list_scans};
use scanpipe_core::output::OutputDirs;
use scanpipe_core::pipeline::stages::list_tiffs;

#[derive(Args)]
pub struct InfoArgs {
    /// Experiment root directory
    pub root: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let layout = detect_layout(&args.root);
    let scans = list_scans(&args.root, layout)
        .with_context(|| format!("Failed to list scans in {}", args.root.display()))?;

    println!("Root:        {}", args.root.display());
    println!("Layout:      {}", layout);
    println!("Scans:       {}", scans.len());

    for scan in &scans {
        let basename = layout.strategy().resolve_basename(scan);
        let dirs = OutputDirs::for_scan(scan);
        println!();
        println!("  {}", basename);
        if !dirs.processed.is_dir() {
            println!("    not processed");
            continue;
        }
        // Filtered projections first, they are what gets reviewed.
        for dir in [&dirs.max_filtered, &dirs.max_raw] {
            if !dir.is_dir() {
                continue;
            }
            for path in list_tiffs(dir, |name| name.starts_with(MAX_PREFIX))? {
                println!("    {}", path.display());
            }
        }
    }

    Ok(())
}
