//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

use crate::domain::recording::Duration;
use crate::domain::session::{CallState, RouteChangeReason};

/// recorder-bridge - pausable audio recording with metering and interruption handling
#[derive(Parser, Debug)]
#[command(name = "recorder-bridge")]
#[command(version)]
#[command(about = "Record audio with live metering, pause/resume and interruption handling")]
#[command(long_about = None)]
pub struct Cli {
    /// Output path, file:// URI or DEFAULT for the cache directory
    #[arg(short = 'p', long, value_name = "PATH", conflicts_with = "daemon")]
    pub path: Option<String>,

    /// Report input level with each progress tick
    #[arg(short = 'm', long, conflicts_with = "no_metering")]
    pub metering: bool,

    /// Report position only
    #[arg(long)]
    pub no_metering: bool,

    /// Progress interval (e.g., 500ms, 0.25s)
    #[arg(short = 'i', long, value_name = "TIME")]
    pub interval: Option<String>,

    /// Stop automatically after this long (e.g., 30s, 2m)
    #[arg(short = 'd', long, value_name = "TIME", conflicts_with = "daemon")]
    pub duration: Option<String>,

    /// Output format (e.g., flac)
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Audio encoder (e.g., flac)
    #[arg(short = 'e', long, value_name = "ENCODER")]
    pub encoder: Option<String>,

    /// Sample rate in Hz
    #[arg(long, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Channel count (1 or 2)
    #[arg(long, value_name = "N")]
    pub channels: Option<u16>,

    /// Encoder bit rate in bits per second
    #[arg(long, value_name = "BPS")]
    pub bit_rate: Option<u32>,

    /// Show keep-alive desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Run as daemon (control via: recorder-bridge daemon start/pause/resume/stop)
    #[arg(long)]
    pub daemon: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Metering override from the command line, if any
    pub fn metering_override(&self) -> Option<bool> {
        if self.metering {
            Some(true)
        } else if self.no_metering {
            Some(false)
        } else {
            None
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Send commands to running daemon
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

/// Daemon control actions
#[derive(Subcommand, Debug, Clone)]
pub enum DaemonAction {
    /// Start a new recording
    Start {
        /// Output path, file:// URI or DEFAULT
        path: Option<String>,
        /// Disable level reporting for this recording
        #[arg(long)]
        no_metering: bool,
    },
    /// Pause the recording
    Pause,
    /// Resume a paused recording
    Resume,
    /// Stop the recording and print the output URI
    Stop,
    /// Show session status as JSON
    Status,
    /// Set the progress interval in seconds
    Interval {
        seconds: f64,
    },
    /// Simulate an audio interruption starting
    InterruptBegin,
    /// Simulate an audio interruption ending
    InterruptEnd {
        /// The system does not allow automatic resume
        #[arg(long)]
        no_resume: bool,
    },
    /// Simulate a phone call state change (idle, ringing, offhook)
    Call {
        state: CallState,
    },
    /// Simulate an audio route change
    Route {
        reason: RouteChangeReason,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed options for a foreground recording
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub path: String,
    pub duration: Option<Duration>,
    pub metering: bool,
    pub notify: bool,
}

/// Parsed daemon options
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub metering: bool,
    pub notify: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "subscription_duration",
    "silence_threshold",
    "default_file_name",
    "output_format",
    "audio_encoder",
    "sample_rate",
    "channels",
    "bit_rate",
    "metering",
    "permission_timeout",
    "notify",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["recorder-bridge"]);
        assert!(cli.path.is_none());
        assert!(cli.duration.is_none());
        assert!(cli.metering_override().is_none());
        assert!(!cli.notify);
        assert!(!cli.daemon);
    }

    #[test]
    fn cli_parses_recording_flags() {
        let cli = Cli::parse_from([
            "recorder-bridge",
            "-p",
            "/tmp/take.flac",
            "-m",
            "-i",
            "250ms",
            "-d",
            "30s",
            "--sample-rate",
            "48000",
            "--channels",
            "1",
        ]);
        assert_eq!(cli.path.as_deref(), Some("/tmp/take.flac"));
        assert_eq!(cli.metering_override(), Some(true));
        assert_eq!(cli.interval.as_deref(), Some("250ms"));
        assert_eq!(cli.duration.as_deref(), Some("30s"));
        assert_eq!(cli.sample_rate, Some(48000));
        assert_eq!(cli.channels, Some(1));
    }

    #[test]
    fn metering_flags_conflict() {
        assert!(Cli::try_parse_from(["recorder-bridge", "--metering", "--no-metering"]).is_err());
    }

    #[test]
    fn daemon_conflicts_with_duration() {
        assert!(Cli::try_parse_from(["recorder-bridge", "--daemon", "-d", "10s"]).is_err());
    }

    #[test]
    fn cli_parses_daemon_call() {
        let cli = Cli::parse_from(["recorder-bridge", "daemon", "call", "offhook"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Daemon {
                action: DaemonAction::Call {
                    state: CallState::OffHook
                }
            })
        ));
    }

    #[test]
    fn cli_rejects_unknown_route_reason() {
        assert!(Cli::try_parse_from(["recorder-bridge", "daemon", "route", "sideways"]).is_err());
    }

    #[test]
    fn cli_parses_interrupt_end_without_resume() {
        let cli = Cli::parse_from(["recorder-bridge", "daemon", "interrupt-end", "--no-resume"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Daemon {
                action: DaemonAction::InterruptEnd { no_resume: true }
            })
        ));
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["recorder-bridge", "config", "set", "silence_threshold", "5"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "silence_threshold");
            assert_eq!(value, "5");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("subscription_duration"));
        assert!(is_valid_config_key("notify"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
