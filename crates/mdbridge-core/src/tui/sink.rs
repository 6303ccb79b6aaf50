//! Notification sink rendered with cliclack

use crate::host::NotificationSink;

/// Routes notifications into the cliclack log so they line up with prompts
#[derive(Debug, Clone, Copy, Default)]
pub struct CliclackSink;

impl NotificationSink for CliclackSink {
    fn info(&self, message: &str) {
        let _ = cliclack::log::success(message);
    }

    fn warn(&self, message: &str) {
        let _ = cliclack::log::warning(message);
    }

    fn error(&self, message: &str, detail: Option<&str>) {
        let text = match detail {
            Some(detail) => format!("{}\n{}", message, console::style(detail).dim()),
            None => message.to_string(),
        };
        let _ = cliclack::log::error(text);
    }
}
