//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::interview::Duration;
use crate::domain::session::Seniority;

/// Default remote endpoint for response sync
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8787";

/// Default number of questions per session
pub const DEFAULT_QUESTION_COUNT: u32 = 5;

/// Default role title when none is configured
pub const DEFAULT_ROLE: &str = "Software Engineer";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    pub speech_url: Option<String>,
    pub role: Option<String>,
    pub seniority: Option<String>,
    pub questions: Option<u32>,
    pub time_limit: Option<String>,
    pub notify: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            server_url: Some(DEFAULT_SERVER_URL.to_string()),
            api_key: None,
            speech_url: None,
            role: Some(DEFAULT_ROLE.to_string()),
            seniority: Some("mid".to_string()),
            questions: Some(DEFAULT_QUESTION_COUNT),
            time_limit: None,
            notify: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            server_url: other.server_url.or(self.server_url),
            api_key: other.api_key.or(self.api_key),
            speech_url: other.speech_url.or(self.speech_url),
            role: other.role.or(self.role),
            seniority: other.seniority.or(self.seniority),
            questions: other.questions.or(self.questions),
            time_limit: other.time_limit.or(self.time_limit),
            notify: other.notify.or(self.notify),
        }
    }

    /// Get the server URL, or the default if not set
    pub fn server_url_or_default(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Get the role title, or the default if not set
    pub fn role_or_default(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_ROLE)
    }

    /// Get seniority as parsed level, or mid if not set/invalid
    pub fn seniority_or_default(&self) -> Seniority {
        self.seniority
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get the question count, or the default if not set
    pub fn questions_or_default(&self) -> u32 {
        self.questions.unwrap_or(DEFAULT_QUESTION_COUNT)
    }

    /// Get the per-question time-limit override, if one is set and
    /// parses. None means each question keeps its derived limit.
    pub fn time_limit_override(&self) -> Option<Duration> {
        self.time_limit.as_ref().and_then(|s| s.parse().ok())
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.server_url, Some(DEFAULT_SERVER_URL.to_string()));
        assert!(config.api_key.is_none());
        assert!(config.speech_url.is_none());
        assert_eq!(config.role, Some("Software Engineer".to_string()));
        assert_eq!(config.seniority, Some("mid".to_string()));
        assert_eq!(config.questions, Some(5));
        assert!(config.time_limit.is_none());
        assert_eq!(config.notify, Some(false));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.server_url.is_none());
        assert!(config.api_key.is_none());
        assert!(config.role.is_none());
        assert!(config.questions.is_none());
        assert!(config.notify.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            server_url: Some("http://base:1".to_string()),
            role: Some("Backend Engineer".to_string()),
            questions: Some(3),
            ..Default::default()
        };

        let other = AppConfig {
            server_url: Some("http://other:2".to_string()),
            role: None, // Should not override
            questions: Some(8),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.server_url, Some("http://other:2".to_string()));
        assert_eq!(merged.role, Some("Backend Engineer".to_string())); // Kept from base
        assert_eq!(merged.questions, Some(8));
    }

    #[test]
    fn merge_preserves_base_when_other_is_none() {
        let base = AppConfig {
            api_key: Some("key".to_string()),
            notify: Some(true),
            ..Default::default()
        };

        let other = AppConfig::empty();
        let merged = base.merge(other);

        assert_eq!(merged.api_key, Some("key".to_string()));
        assert_eq!(merged.notify, Some(true));
    }

    #[test]
    fn seniority_or_default_parses() {
        let config = AppConfig {
            seniority: Some("senior".to_string()),
            ..Default::default()
        };
        assert_eq!(config.seniority_or_default(), Seniority::Senior);
    }

    #[test]
    fn seniority_or_default_uses_default_on_invalid() {
        let config = AppConfig {
            seniority: Some("wizard".to_string()),
            ..Default::default()
        };
        assert_eq!(config.seniority_or_default(), Seniority::Mid);
    }

    #[test]
    fn time_limit_override_parses() {
        let config = AppConfig {
            time_limit: Some("2m30s".to_string()),
            ..Default::default()
        };
        assert_eq!(config.time_limit_override().unwrap().as_secs(), 150);
    }

    #[test]
    fn time_limit_override_none_when_unset_or_invalid() {
        assert!(AppConfig::empty().time_limit_override().is_none());
        let config = AppConfig {
            time_limit: Some("soon".to_string()),
            ..Default::default()
        };
        assert!(config.time_limit_override().is_none());
    }

    #[test]
    fn boolean_defaults() {
        let config = AppConfig::empty();
        assert!(!config.notify_or_default());
    }

    #[test]
    fn string_defaults() {
        let config = AppConfig::empty();
        assert_eq!(config.server_url_or_default(), DEFAULT_SERVER_URL);
        assert_eq!(config.role_or_default(), "Software Engineer");
        assert_eq!(config.questions_or_default(), 5);
    }
}
