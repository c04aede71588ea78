use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use scanpipe_core::hyperstack::ChannelColor;
use scanpipe_core::pipeline::config::BatchConfig;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save a full default BatchConfig as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let mut config = BatchConfig::new("/path/to/experiment");
    config.channel_colors = vec![ChannelColor::Green, ChannelColor::Magenta];
    let toml_str = toml::to_string_pretty(&config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
