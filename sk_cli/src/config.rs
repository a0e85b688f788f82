//! CLI configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use scorekeeper::live::SessionConfig;
use std::path::PathBuf;

/// Complete CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Directory holding one JSON document per sport
    pub data_dir: PathBuf,
    /// Sport key; tournaments are stored under `tournaments:<sport>`
    pub sport: String,
    /// Live scoring settings
    pub session: SessionConfig,
}

impl CliConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `data_dir_override` - Optional data directory override (from CLI args)
    /// * `sport_override` - Optional sport override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if the sport is missing or any variable is invalid
    pub fn from_env(
        data_dir_override: Option<PathBuf>,
        sport_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            data_dir_override,
            sport_override,
        )
    }

    /// Same as [`CliConfig::from_env`] with variables read through `lookup`
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        data_dir_override: Option<PathBuf>,
        sport_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let data_dir = data_dir_override
            .or_else(|| lookup("SCOREKEEPER_DATA_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("scorekeeper-data"));

        let sport = sport_override
            .or_else(|| lookup("SCOREKEEPER_SPORT"))
            .ok_or_else(|| ConfigError::MissingRequired {
                var: "SCOREKEEPER_SPORT".to_string(),
                hint: "Pass --sport or set it in .env (e.g. SCOREKEEPER_SPORT=volleyball)"
                    .to_string(),
            })?;

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            debounce_ms: parse_or(&lookup, "SCOREKEEPER_DEBOUNCE_MS", defaults.debounce_ms)?,
            history_limit: parse_or(&lookup, "SCOREKEEPER_HISTORY_LIMIT", defaults.history_limit)?,
            draft_history_limit: parse_or(
                &lookup,
                "SCOREKEEPER_DRAFT_HISTORY_LIMIT",
                defaults.draft_history_limit,
            )?,
            completion_delay_ms: parse_or(
                &lookup,
                "SCOREKEEPER_COMPLETION_DELAY_MS",
                defaults.completion_delay_ms,
            )?,
        };

        let config = CliConfig {
            data_dir,
            sport,
            session,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sport_ok = !self.sport.is_empty()
            && self
                .sport
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
        if !sport_ok {
            return Err(ConfigError::Invalid {
                var: "SCOREKEEPER_SPORT".to_string(),
                reason: "Use letters, digits, '-' or '_' only".to_string(),
            });
        }

        self.session
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "live session settings".to_string(),
                reason,
            })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse a variable, falling back to `default` when it is unset
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Expected a non-negative integer, got {raw:?}"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_sport() {
        let config = CliConfig::from_lookup(env(&[("SCOREKEEPER_SPORT", "volleyball")]), None, None)
            .unwrap();
        assert_eq!(config.sport, "volleyball");
        assert_eq!(config.data_dir, PathBuf::from("scorekeeper-data"));
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_overrides_win_over_env() {
        let config = CliConfig::from_lookup(
            env(&[
                ("SCOREKEEPER_SPORT", "volleyball"),
                ("SCOREKEEPER_DATA_DIR", "/srv/scores"),
                ("SCOREKEEPER_DEBOUNCE_MS", "80"),
            ]),
            Some(PathBuf::from("/tmp/scores")),
            Some("football".to_string()),
        )
        .unwrap();
        assert_eq!(config.sport, "football");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/scores"));
        assert_eq!(config.session.debounce_ms, 80);
    }

    #[test]
    fn test_missing_sport() {
        let err = CliConfig::from_lookup(env(&[]), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref var, .. } if var == "SCOREKEEPER_SPORT"));
        assert!(err.to_string().contains("--sport"));
    }

    #[test]
    fn test_invalid_number() {
        let err = CliConfig::from_lookup(
            env(&[("SCOREKEEPER_SPORT", "padel"), ("SCOREKEEPER_COMPLETION_DELAY_MS", "soon")]),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SCOREKEEPER_COMPLETION_DELAY_MS"));
    }

    #[test]
    fn test_invalid_sport_key() {
        let err = CliConfig::from_lookup(env(&[("SCOREKEEPER_SPORT", "../etc")]), None, None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_session_limits_validated() {
        let err = CliConfig::from_lookup(
            env(&[
                ("SCOREKEEPER_SPORT", "padel"),
                ("SCOREKEEPER_HISTORY_LIMIT", "10"),
                ("SCOREKEEPER_DRAFT_HISTORY_LIMIT", "20"),
            ]),
            None,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Draft history limit"));
    }
}
