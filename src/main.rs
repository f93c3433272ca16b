//! recorder-bridge CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use recorder_bridge::cli::{
    app::{controller_config, load_merged_config, run_foreground, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
    RecordOptions,
};
use recorder_bridge::domain::config::AppConfig;
use recorder_bridge::domain::recording::{AudioEncoder, Duration, OutputFormat, DEFAULT_DESTINATION};
use recorder_bridge::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut cli = Cli::parse();
    let presenter = Presenter::new();

    // Handle subcommands
    match cli.command.take() {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Daemon { action }) => return daemon_command(action, &presenter).await,
        None => {}
    }

    if let Err(message) = validate_cli(&cli) {
        presenter.error(&message);
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let cli_config = AppConfig {
        subscription_duration: cli.interval.clone(),
        output_format: cli.format.clone(),
        audio_encoder: cli.encoder.clone(),
        sample_rate: cli.sample_rate,
        channels: cli.channels,
        bit_rate: cli.bit_rate,
        metering: cli.metering_override(),
        notify: if cli.notify { Some(true) } else { None },
        ..AppConfig::empty()
    };
    let config = load_merged_config(cli_config).await;

    if cli.daemon {
        start_daemon(&config, &presenter).await
    } else {
        let duration = match cli.duration.as_deref().map(str::parse::<Duration>).transpose() {
            Ok(d) => d,
            Err(e) => {
                presenter.error(&format!("Invalid duration: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        };

        let options = RecordOptions {
            path: cli.path.clone().unwrap_or_else(|| DEFAULT_DESTINATION.to_string()),
            duration,
            metering: config.metering_or_default(),
            notify: config.notify_or_default(),
        };

        run_foreground(options, controller_config(&config)).await
    }
}

/// Reject malformed command-line values before touching the config file
fn validate_cli(cli: &Cli) -> Result<(), String> {
    if let Some(ref interval) = cli.interval {
        interval
            .parse::<Duration>()
            .map_err(|e| format!("Invalid interval: {}", e))?;
    }
    if let Some(ref format) = cli.format {
        format.parse::<OutputFormat>().map_err(|e| e.to_string())?;
    }
    if let Some(ref encoder) = cli.encoder {
        encoder.parse::<AudioEncoder>().map_err(|e| e.to_string())?;
    }
    if matches!(cli.channels, Some(c) if c == 0 || c > 2) {
        return Err("Channel count must be 1 or 2".to_string());
    }
    Ok(())
}

#[cfg(unix)]
async fn start_daemon(config: &AppConfig, _presenter: &Presenter) -> ExitCode {
    let options = recorder_bridge::cli::DaemonOptions {
        metering: config.metering_or_default(),
        notify: config.notify_or_default(),
    };
    recorder_bridge::cli::run_daemon(options, controller_config(config)).await
}

#[cfg(not(unix))]
async fn start_daemon(_config: &AppConfig, presenter: &Presenter) -> ExitCode {
    presenter.error("Daemon mode requires a Unix platform");
    ExitCode::from(EXIT_ERROR)
}

#[cfg(unix)]
async fn daemon_command(
    action: recorder_bridge::cli::DaemonAction,
    presenter: &Presenter,
) -> ExitCode {
    match recorder_bridge::cli::handle_daemon_command(action, presenter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            presenter.error(&e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(not(unix))]
async fn daemon_command(
    _action: recorder_bridge::cli::DaemonAction,
    presenter: &Presenter,
) -> ExitCode {
    presenter.error("Daemon mode requires a Unix platform");
    ExitCode::from(EXIT_ERROR)
}
