//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::error::ConfigError;
use crate::domain::interview::Duration;
use crate::domain::session::Seniority;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

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
        ConfigAction::Path => handle_path(store, presenter),
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
    // Validate key
    if !is_valid_config_key(key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        });
    }

    // Validate value based on key type
    validate_config_value(key, value)?;

    // Load existing config
    let mut config = store.load().await?;

    // Update the appropriate field
    match key {
        "server_url" => config.server_url = Some(value.to_string()),
        "api_key" => config.api_key = Some(value.to_string()),
        "speech_url" => config.speech_url = Some(value.to_string()),
        "role" => config.role = Some(value.to_string()),
        "seniority" => config.seniority = Some(value.to_lowercase()),
        "questions" => {
            config.questions = Some(value.parse::<u32>().map_err(|_| {
                ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Value must be a positive number".to_string(),
                }
            })?)
        }
        "time_limit" => config.time_limit = Some(value.to_string()),
        "notify" => {
            config.notify = Some(parse_bool(value).map_err(|_| ConfigError::ValidationError {
                key: key.to_string(),
                message: "Value must be 'true' or 'false'".to_string(),
            })?)
        }
        _ => unreachable!(), // Already validated
    }

    // Save config
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    // Validate key
    if !is_valid_config_key(key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        });
    }

    let config = store.load().await?;

    let value = match key {
        "server_url" => config.server_url,
        "api_key" => config.api_key.map(|s| mask_api_key(&s)),
        "speech_url" => config.speech_url,
        "role" => config.role,
        "seniority" => config.seniority,
        "questions" => config.questions.map(|n| n.to_string()),
        "time_limit" => config.time_limit,
        "notify" => config.notify.map(|b| b.to_string()),
        _ => unreachable!(),
    };

    match value {
        Some(v) => presenter.output(&v),
        None => presenter.output("(not set)"),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    presenter.key_value(
        "server_url",
        config.server_url.as_deref().unwrap_or("(not set)"),
    );
    presenter.key_value(
        "api_key",
        &config
            .api_key
            .map(|s| mask_api_key(&s))
            .unwrap_or_else(|| "(not set)".to_string()),
    );
    presenter.key_value(
        "speech_url",
        config.speech_url.as_deref().unwrap_or("(not set)"),
    );
    presenter.key_value("role", config.role.as_deref().unwrap_or("(not set)"));
    presenter.key_value(
        "seniority",
        config.seniority.as_deref().unwrap_or("(not set)"),
    );
    presenter.key_value(
        "questions",
        &config
            .questions
            .map(|n| n.to_string())
            .unwrap_or_else(|| "(not set)".to_string()),
    );
    presenter.key_value(
        "time_limit",
        config.time_limit.as_deref().unwrap_or("(not set)"),
    );
    presenter.key_value(
        "notify",
        &config
            .notify
            .map(|b| b.to_string())
            .unwrap_or_else(|| "(not set)".to_string()),
    );

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "server_url" | "speech_url" => {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Value must be an http:// or https:// URL".to_string(),
                });
            }
        }
        "seniority" => {
            value
                .parse::<Seniority>()
                .map_err(|e| ConfigError::ValidationError {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
        }
        "questions" => {
            let count = value
                .parse::<u32>()
                .map_err(|_| ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Value must be a positive number".to_string(),
                })?;
            if count == 0 {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "At least one question is required".to_string(),
                });
            }
        }
        "time_limit" => {
            value
                .parse::<Duration>()
                .map_err(|e| ConfigError::ValidationError {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
        }
        "notify" => {
            parse_bool(value).map_err(|_| ConfigError::ValidationError {
                key: key.to_string(),
                message: "Value must be 'true' or 'false'".to_string(),
            })?;
        }
        _ => {} // api_key and role accept any string
    }
    Ok(())
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}

/// Mask API key for display (show first 4 and last 4 chars).
/// Counted in chars, not bytes; keys are free-form input.
fn mask_api_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 8 {
        "*".repeat(count)
    } else {
        let head: String = key.chars().take(4).collect();
        let tail: String = key.chars().skip(count - 4).collect();
        format!("{}...{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("false"), Ok(false));
        assert_eq!(parse_bool("yes"), Ok(true));
        assert_eq!(parse_bool("no"), Ok(false));
        assert_eq!(parse_bool("1"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("invalid").is_err());
    }

    #[test]
    fn mask_api_key_long() {
        let masked = mask_api_key("abcdefghijklmnop");
        assert_eq!(masked, "abcd...mnop");
    }

    #[test]
    fn mask_api_key_short() {
        let masked = mask_api_key("short");
        assert_eq!(masked, "*****");
    }

    #[test]
    fn mask_api_key_multibyte() {
        // 3 bytes per char; a byte-indexed mask would split a boundary
        let masked = mask_api_key("キーキーキーキーキー");
        assert_eq!(masked, "キーキー...キーキー");
    }

    #[test]
    fn mask_api_key_short_multibyte_counts_chars() {
        // 18 bytes but only 6 chars, so it is fully masked
        assert_eq!(mask_api_key("キーキーキー"), "******");
    }

    #[test]
    fn validate_urls() {
        assert!(validate_config_value("server_url", "http://localhost:8787").is_ok());
        assert!(validate_config_value("speech_url", "https://speech.example.com").is_ok());
        assert!(validate_config_value("server_url", "localhost:8787").is_err());
        assert!(validate_config_value("speech_url", "ftp://x").is_err());
    }

    #[test]
    fn validate_seniority_values() {
        assert!(validate_config_value("seniority", "junior").is_ok());
        assert!(validate_config_value("seniority", "Staff").is_ok());
        assert!(validate_config_value("seniority", "wizard").is_err());
    }

    #[test]
    fn validate_question_count() {
        assert!(validate_config_value("questions", "5").is_ok());
        assert!(validate_config_value("questions", "0").is_err());
        assert!(validate_config_value("questions", "many").is_err());
    }

    #[test]
    fn validate_time_limit_values() {
        assert!(validate_config_value("time_limit", "30s").is_ok());
        assert!(validate_config_value("time_limit", "1m").is_ok());
        assert!(validate_config_value("time_limit", "2m30s").is_ok());
        assert!(validate_config_value("time_limit", "invalid").is_err());
    }

    #[test]
    fn free_form_keys_accept_anything() {
        assert!(validate_config_value("api_key", "sk-anything-goes").is_ok());
        assert!(validate_config_value("role", "Staff SRE (Platform)").is_ok());
    }
}
