//! Application-level configuration loading: match timings, poll timeout and question supply.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZZZ_BACK_CONFIG_PATH";
const DEFAULT_ACTIVITIES_PATH: &str = "config/activities.json";

/// Delays between the scheduled steps of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchTimings {
    /// Time spent on the loading screen before the first question.
    pub loading: Duration,
    /// Time a question stays on screen, answer reveal included.
    pub question: Duration,
    /// Time the intermediate leaderboard stays on screen.
    pub leaderboard: Duration,
}

impl Default for MatchTimings {
    fn default() -> Self {
        Self {
            loading: Duration::from_millis(3_000),
            question: Duration::from_millis(19_000),
            leaderboard: Duration::from_millis(4_000),
        }
    }
}

/// Retry policy of the background question supply loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyConfig {
    /// Consecutive failed draws tolerated before giving up.
    pub max_attempts: u32,
    /// Wait after the first failed draw.
    pub initial_backoff: Duration,
    /// Ceiling of the doubling wait.
    pub max_backoff: Duration,
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 64,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_millis(10_000),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Questions played per match.
    pub question_count: usize,
    /// How long a long-poll waits for a delivery.
    pub poll_timeout: Duration,
    /// Delays between scheduled phase changes.
    pub timings: MatchTimings,
    /// Number of newer matches an ended match survives in memory.
    pub retired_match_grace: u32,
    /// JSON file the in-memory activity bank is loaded from.
    pub activities_path: PathBuf,
    /// Retry policy of the question supply.
    pub supply: SupplyConfig,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        question_count = app_config.question_count,
                        poll_timeout_ms = app_config.poll_timeout.as_millis() as u64,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            question_count: 20,
            poll_timeout: Duration::from_millis(5_000),
            timings: MatchTimings::default(),
            retired_match_grace: 5,
            activities_path: PathBuf::from(DEFAULT_ACTIVITIES_PATH),
            supply: SupplyConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    question_count: Option<usize>,
    poll_timeout_ms: Option<u64>,
    loading_delay_ms: Option<u64>,
    question_delay_ms: Option<u64>,
    leaderboard_delay_ms: Option<u64>,
    retired_match_grace: Option<u32>,
    activities_path: Option<PathBuf>,
    supply: Option<RawSupply>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSupply {
    max_attempts: Option<u32>,
    initial_backoff_ms: Option<u64>,
    max_backoff_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let millis_or = |raw: Option<u64>, fallback: Duration| {
            raw.map(Duration::from_millis).unwrap_or(fallback)
        };

        let supply = value.supply.unwrap_or_default();
        Self {
            question_count: value.question_count.unwrap_or(defaults.question_count),
            poll_timeout: millis_or(value.poll_timeout_ms, defaults.poll_timeout),
            timings: MatchTimings {
                loading: millis_or(value.loading_delay_ms, defaults.timings.loading),
                question: millis_or(value.question_delay_ms, defaults.timings.question),
                leaderboard: millis_or(value.leaderboard_delay_ms, defaults.timings.leaderboard),
            },
            retired_match_grace: value
                .retired_match_grace
                .unwrap_or(defaults.retired_match_grace),
            activities_path: value.activities_path.unwrap_or(defaults.activities_path),
            supply: SupplyConfig {
                max_attempts: supply
                    .max_attempts
                    .unwrap_or(defaults.supply.max_attempts)
                    .max(1),
                initial_backoff: millis_or(
                    supply.initial_backoff_ms,
                    defaults.supply.initial_backoff,
                ),
                max_backoff: millis_or(supply.max_backoff_ms, defaults.supply.max_backoff),
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_defaults() {
        let raw: RawConfig = serde_json::from_str("{}").unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.question_count, 20);
        assert_eq!(config.poll_timeout, Duration::from_secs(5));
        assert_eq!(config.timings, MatchTimings::default());
        assert_eq!(config.retired_match_grace, 5);
        assert_eq!(config.supply, SupplyConfig::default());
    }

    #[test]
    fn partial_overrides_are_applied() {
        let raw: RawConfig = serde_json::from_str(
            r#"{ "question_count": 3, "question_delay_ms": 100, "supply": { "max_attempts": 0 } }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.question_count, 3);
        assert_eq!(config.timings.question, Duration::from_millis(100));
        assert_eq!(config.timings.loading, Duration::from_millis(3_000));
        assert_eq!(config.supply.max_attempts, 1);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<RawConfig>(r#"{ "rounds": [] }"#).is_err());
    }
}
