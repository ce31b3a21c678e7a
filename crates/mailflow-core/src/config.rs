//! Environment-driven configuration.
//!
//! | variable | default |
//! |---|---|
//! | `MAILFLOW_STORE_PATH` | `mailflow.json` |
//! | `MAILFLOW_BATCH_CONCURRENCY` | `4` (must be ≥ 1) |
//! | `MAILFLOW_REJECTED_DOMAINS` | empty (comma separated) |
//! | `MAILFLOW_LOG` | `info` |

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const ENV_STORE_PATH: &str = "MAILFLOW_STORE_PATH";
pub const ENV_BATCH_CONCURRENCY: &str = "MAILFLOW_BATCH_CONCURRENCY";
pub const ENV_REJECTED_DOMAINS: &str = "MAILFLOW_REJECTED_DOMAINS";
pub const ENV_LOG: &str = "MAILFLOW_LOG";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub store_path: PathBuf,
    /// Max emails delivered at once by `send_all_pending`.
    pub batch_concurrency: usize,
    pub rejected_domains: Vec<String>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("mailflow.json"),
            batch_concurrency: 4,
            rejected_domains: Vec::new(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or blank keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get(ENV_STORE_PATH) {
            config.store_path = PathBuf::from(path.trim());
        }

        if let Some(raw) = get(ENV_BATCH_CONCURRENCY) {
            config.batch_concurrency = match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        key: ENV_BATCH_CONCURRENCY,
                        value: raw,
                    });
                }
            };
        }

        if let Some(raw) = get(ENV_REJECTED_DOMAINS) {
            config.rejected_domains = raw
                .split(',')
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect();
        }

        if let Some(filter) = get(ENV_LOG) {
            config.log_filter = filter.trim().to_string();
        }

        Ok(config)
    }
}
