//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::{AudioEncoder, Duration, OutputFormat};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => {
            presenter.output(&store.path().to_string_lossy());
            Ok(())
        }
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let mut config = store.load().await?;
    set_value(&mut config, key, value)?;
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;
    presenter.output(get_value(&config, key).as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, get_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(invalid(
            key,
            format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        ))
    }
}

fn invalid(key: &str, message: impl ToString) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Validate `value` for `key` and store it, normalized
fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    match key {
        "subscription_duration" | "permission_timeout" => {
            let duration = value.parse::<Duration>().map_err(|e| invalid(key, e))?;
            let normalized = Some(duration.to_string());
            if key == "subscription_duration" {
                config.subscription_duration = normalized;
            } else {
                config.permission_timeout = normalized;
            }
        }
        "silence_threshold" => {
            let n = parse_number::<u32>(key, value)?;
            if n == 0 {
                return Err(invalid(key, "Value must be at least 1"));
            }
            config.silence_threshold = Some(n);
        }
        "default_file_name" => {
            if value.is_empty() || value.contains(std::path::is_separator) {
                return Err(invalid(key, "Value must be a plain file name"));
            }
            config.default_file_name = Some(value.to_string());
        }
        "output_format" => {
            let format = value.parse::<OutputFormat>().map_err(|e| invalid(key, e))?;
            config.output_format = Some(format.as_str().to_string());
        }
        "audio_encoder" => {
            let encoder = value.parse::<AudioEncoder>().map_err(|e| invalid(key, e))?;
            config.audio_encoder = Some(encoder.as_str().to_string());
        }
        "sample_rate" => {
            let rate = parse_number::<u32>(key, value)?;
            if !(8_000..=192_000).contains(&rate) {
                return Err(invalid(key, "Value must be between 8000 and 192000"));
            }
            config.sample_rate = Some(rate);
        }
        "channels" => {
            let channels = parse_number::<u16>(key, value)?;
            if !(1..=2).contains(&channels) {
                return Err(invalid(key, "Value must be 1 or 2"));
            }
            config.channels = Some(channels);
        }
        "bit_rate" => {
            let rate = parse_number::<u32>(key, value)?;
            if rate == 0 {
                return Err(invalid(key, "Value must be positive"));
            }
            config.bit_rate = Some(rate);
        }
        "metering" => config.metering = Some(parse_bool(key, value)?),
        "notify" => config.notify = Some(parse_bool(key, value)?),
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

fn get_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "subscription_duration" => config.subscription_duration.clone(),
        "silence_threshold" => config.silence_threshold.map(|n| n.to_string()),
        "default_file_name" => config.default_file_name.clone(),
        "output_format" => config.output_format.clone(),
        "audio_encoder" => config.audio_encoder.clone(),
        "sample_rate" => config.sample_rate.map(|n| n.to_string()),
        "channels" => config.channels.map(|n| n.to_string()),
        "bit_rate" => config.bit_rate.map(|n| n.to_string()),
        "metering" => config.metering.map(|b| b.to_string()),
        "permission_timeout" => config.permission_timeout.clone(),
        "notify" => config.notify.map(|b| b.to_string()),
        _ => None,
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse::<T>()
        .map_err(|_| invalid(key, format!("Invalid number '{}'", value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, "Value must be 'true' or 'false'")),
    }
}
