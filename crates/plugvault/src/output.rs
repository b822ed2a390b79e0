//! Terminal output utilities

use chrono::{DateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use plugvault_core::PluginStatus;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Status label colored by severity
pub fn status(status: PluginStatus) -> String {
    let label = style(status.label());
    match status {
        PluginStatus::UpToDate | PluginStatus::Local => label.green(),
        PluginStatus::OutOfDate | PluginStatus::Downloading => label.yellow(),
        PluginStatus::Broken => label.red(),
        PluginStatus::NotInstalled | PluginStatus::Unavailable => label.dim(),
    }
    .to_string()
}

/// Render a unix timestamp as a UTC date, or "-" when unknown
pub fn timestamp(secs: i64) -> String {
    if secs <= 0 {
        return "-".to_string();
    }
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Create a spinner
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(spinner_style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Create a byte progress bar for a download
pub fn download_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(bar_style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
    ) {
        pb.set_style(bar_style.progress_chars("#>-"));
    }
    pb.set_message(msg.to_string());
    pb
}
