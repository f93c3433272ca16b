//! Foreground recording runner and shared wiring

use std::process::ExitCode;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::ports::{ConfigStore, EventEmitter};
use crate::application::{
    spawn_session, ControllerConfig, InterruptionSender, RecorderBridge, SessionController,
};
use crate::domain::config::AppConfig;
use crate::domain::recording::EncodingOptions;
use crate::infrastructure::{
    create_keep_alive, create_recorder, CacheDirResolver, ChannelEmitter, DevicePermission,
    XdgConfigStore,
};

use super::args::RecordOptions;
use super::presenter::Presenter;
use super::signals;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Controller settings derived from the merged config
pub fn controller_config(config: &AppConfig) -> ControllerConfig {
    ControllerConfig {
        metering_interval: config.subscription_duration_or_default(),
        silence_threshold: config.silence_threshold_or_default(),
        default_file_name: config.default_file_name.clone(),
        base_options: config.encoding_options(),
        permission_timeout: Some(config.permission_timeout_or_default()),
    }
}

/// Spawn a session on the desktop adapters
pub fn spawn_desktop_session<E>(
    config: ControllerConfig,
    notify: bool,
    emitter: E,
) -> (RecorderBridge, InterruptionSender, JoinHandle<()>)
where
    E: EventEmitter + 'static,
{
    let paths = CacheDirResolver::new();
    let permission = DevicePermission::new(paths.dir());
    let controller = SessionController::new(
        create_recorder(),
        permission,
        create_keep_alive(notify),
        paths,
        emitter,
        config,
    );
    spawn_session(controller)
}

/// Record in the foreground until Ctrl+C or the optional duration elapses
pub async fn run_foreground(options: RecordOptions, config: ControllerConfig) -> ExitCode {
    let mut presenter = Presenter::new();
    let (emitter, mut events) = ChannelEmitter::channel();
    let (bridge, _interruptions, session) =
        spawn_desktop_session(config, options.notify, emitter);

    let uri = match bridge
        .start_with_options(&options.path, EncodingOptions::default(), options.metering)
        .await
    {
        Ok(uri) => uri,
        Err(e) => {
            presenter.error(&format!("{} ({})", e, e.code()));
            return ExitCode::from(EXIT_ERROR);
        }
    };
    debug!(%uri, "Recording started");

    presenter.start_spinner("Recording...");
    presenter.info("Press Ctrl+C to stop");

    let deadline = async {
        match options.duration {
            Some(duration) => tokio::time::sleep(duration.as_std()).await,
            None => std::future::pending().await,
        }
    };
    let interrupted = signals::ctrl_c();
    tokio::pin!(deadline, interrupted);

    loop {
        tokio::select! {
            Some(event) = events.recv() => presenter.show_progress(&event),
            result = &mut interrupted => {
                if let Err(e) = result {
                    presenter.warn(&format!("Signal handler failed: {}", e));
                }
                break;
            }
            _ = &mut deadline => {
                presenter.info("Duration reached");
                break;
            }
        }
    }

    let code = match bridge.stop_recorder().await {
        Ok(uri) => {
            presenter.spinner_success("Recording saved");
            presenter.output(&uri);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.spinner_fail(&format!("{} ({})", e, e.code()));
            ExitCode::from(EXIT_ERROR)
        }
    };

    drop(bridge);
    let _ = session.await;
    code
}

/// Load and merge configuration: defaults < file < CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;
    AppConfig::defaults().merge(file_config).merge(cli_config)
}
