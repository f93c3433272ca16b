//! CLI presenter for output formatting

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::recording::METERING_FLOOR_DB;
use crate::domain::session::{ProgressEvent, RecordStatus};

/// Lowest level shown on the meter
const METER_RANGE_DB: f64 = 60.0;
const METER_WIDTH: usize = 20;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Print a line above the spinner, or to stderr when there is none
    fn line(&self, text: String) {
        match self.spinner {
            Some(ref spinner) => spinner.println(text),
            None => eprintln!("{}", text),
        }
    }

    pub fn info(&self, message: &str) {
        self.line(format!("{} {}", "ℹ".cyan(), message));
    }

    pub fn success(&self, message: &str) {
        self.line(format!("{} {}", "✓".green(), message));
    }

    pub fn warn(&self, message: &str) {
        self.line(format!("{} {}", "⚠".yellow(), message));
    }

    pub fn error(&self, message: &str) {
        self.line(format!("{} {}", "✗".red(), message));
    }

    /// Output text to stdout (URIs, config values, status JSON)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Render one progress event on the spinner line, and status changes above it
    pub fn show_progress(&self, event: &ProgressEvent) {
        if let Some(status) = event.status {
            let message = format!(
                "{} at {}",
                describe(status),
                format_position(event.current_position)
            );
            match status {
                RecordStatus::PausedByNative | RecordStatus::FailResumeByNative => {
                    self.warn(&message)
                }
                _ => self.info(&message),
            }
        }
        self.update_spinner(&format_progress(event.current_position, event.current_metering));
    }

    /// Print daemon status
    pub fn daemon_status(&self, state: &str) {
        self.line(format!("{} Daemon: {}", "●".cyan(), state));
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(status: RecordStatus) -> &'static str {
    match status {
        RecordStatus::Paused => "No input detected",
        RecordStatus::Resume => "Input restored",
        RecordStatus::PausedByNative => "Paused by the system",
        RecordStatus::ResumeByNative => "Resumed after interruption",
        RecordStatus::FailResumeByNative => "Interruption ended, waiting for resume",
    }
}

/// `mm:ss.t` position
pub fn format_position(position_ms: u64) -> String {
    let tenths = (position_ms % 1000) / 100;
    let secs = position_ms / 1000;
    format!("{:02}:{:02}.{}", secs / 60, secs % 60, tenths)
}

/// Position plus an optional level meter
pub fn format_progress(position_ms: u64, metering_db: Option<f64>) -> String {
    let position = format_position(position_ms);
    let Some(db) = metering_db else {
        return format!("Recording {}", position);
    };

    let level = ((db + METER_RANGE_DB) / METER_RANGE_DB).clamp(0.0, 1.0);
    let filled = (level * METER_WIDTH as f64).round() as usize;
    let label = if db <= METERING_FLOOR_DB {
        "  -inf dB".to_string()
    } else {
        format!("{:>6.1} dB", db)
    };

    format!(
        "Recording {} [{}{}] {}",
        position,
        "█".repeat(filled).green(),
        "░".repeat(METER_WIDTH - filled),
        label
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_formatting() {
        assert_eq!(format_position(0), "00:00.0");
        assert_eq!(format_position(1_500), "00:01.5");
        assert_eq!(format_position(125_250), "02:05.2");
    }

    #[test]
    fn progress_without_metering() {
        assert_eq!(format_progress(2_000, None), "Recording 00:02.0");
    }

    #[test]
    fn progress_meter_bounds() {
        colored::control::set_override(false);
        let full = format_progress(0, Some(0.0));
        assert!(full.contains(&"█".repeat(METER_WIDTH)));
        assert!(full.contains("0.0 dB"));

        let floor = format_progress(0, Some(METERING_FLOOR_DB));
        assert!(floor.contains(&"░".repeat(METER_WIDTH)));
        assert!(floor.contains("-inf dB"));
    }
}
