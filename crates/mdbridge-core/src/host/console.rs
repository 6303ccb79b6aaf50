//! Notification sink that writes to stderr

use super::NotificationSink;
use colored::Colorize;

/// Prints notifications to stderr, keeping stdout free for formatted output
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn info(&self, message: &str) {
        eprintln!("{} {}", "info:".cyan().bold(), message);
    }

    fn warn(&self, message: &str) {
        eprintln!("{} {}", "Warning:".yellow().bold(), message);
    }

    fn error(&self, message: &str, detail: Option<&str>) {
        eprintln!("{} {}", "Error:".red().bold(), message);
        if let Some(detail) = detail {
            eprintln!("  {}", detail.dimmed());
        }
    }
}
