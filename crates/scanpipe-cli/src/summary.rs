use std::path::Path;

use console::Style;
use scanpipe_core::pipeline::config::BatchConfig;
use scanpipe_core::pipeline::{BatchSummary, ScanStatus};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    ok: Style,
    failed: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            ok: Style::new().green().bold(),
            failed: Style::new().red().bold(),
        }
    }
}

pub fn print_batch_summary(config: &BatchConfig, backend_name: &str) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Scanpipe Batch"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(14)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Root"),
        s.path.apply_to(config.root.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Backend"),
        s.method.apply_to(backend_name)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Layout"),
        s.value.apply_to(config.layout)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Planes"),
        s.value.apply_to(config.plane_mode)
    );
    println!();

    println!("  {}", s.header.apply_to("Channels"));
    for (i, color) in config.channel_colors.iter().enumerate() {
        println!(
            "    {:<12}{}",
            s.label.apply_to(format!("C{}", i + 1)),
            s.method.apply_to(color)
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Processing"));
    if config.filtered_pass {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Median"),
            s.value.apply_to(format!("radius {}", config.median_radius))
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Median"),
            s.disabled.apply_to("disabled")
        );
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Projection"),
        s.value.apply_to(config.projection_policy)
    );
    if config.difference_number > 0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Difference"),
            s.value.apply_to(format!(
                "shift {} from {}",
                config.difference_number, config.difference_source
            ))
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Difference"),
            s.disabled.apply_to("disabled")
        );
    }
    println!();
}

pub fn print_batch_results(summary: &BatchSummary, log_path: &Path) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Results"));
    for outcome in &summary.outcomes {
        match &outcome.status {
            ScanStatus::Succeeded(report) => {
                println!(
                    "    {:<24}{}  {}",
                    outcome.basename,
                    s.ok.apply_to("ok"),
                    s.label.apply_to(report.dims)
                );
            }
            ScanStatus::Failed { stage, kind, .. } => {
                println!(
                    "    {:<24}{}  {}",
                    outcome.basename,
                    s.failed.apply_to("failed"),
                    s.label.apply_to(format!("{} during {}", kind, stage))
                );
            }
        }
    }
    println!();
    println!(
        "  {:<14}{} succeeded, {} failed",
        s.label.apply_to("Scans"),
        s.value.apply_to(summary.succeeded()),
        s.value.apply_to(summary.failed())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Run log"),
        s.path.apply_to(log_path.display())
    );
}
