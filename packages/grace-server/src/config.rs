//! Server configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::domains::repository::models::RetentionPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    /// Pub/sub topic domain events are published on.
    pub pubsub_topic: String,
    /// Default retention applied to newly created repositories.
    pub default_save_days: i64,
    pub default_checkpoint_days: i64,
    pub default_diff_cache_days: i64,
    pub default_directory_version_cache_days: i64,
    pub default_logical_delete_days: i64,
    /// TTL of the process-local existence cache.
    pub cache_ttl_seconds: u64,
    /// How long startup waits for the state store to report ready.
    pub readiness_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from the environment (and `.env` in development).
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();

        Ok(Self {
            pubsub_topic: env::var("GRACE_PUBSUB_TOPIC")
                .unwrap_or_else(|_| "graceevents".to_string()),
            default_save_days: int_var("GRACE_DEFAULT_SAVE_DAYS", 7)?,
            default_checkpoint_days: int_var("GRACE_DEFAULT_CHECKPOINT_DAYS", 365)?,
            default_diff_cache_days: int_var("GRACE_DEFAULT_DIFF_CACHE_DAYS", 7)?,
            default_directory_version_cache_days: int_var(
                "GRACE_DEFAULT_DIRECTORY_VERSION_CACHE_DAYS",
                7,
            )?,
            default_logical_delete_days: int_var("GRACE_DEFAULT_LOGICAL_DELETE_DAYS", 30)?,
            cache_ttl_seconds: int_var("GRACE_CACHE_TTL_SECONDS", 120)? as u64,
            readiness_timeout_seconds: int_var("GRACE_READINESS_TIMEOUT_SECONDS", 30)? as u64,
        })
    }

    /// Retention applied when a repository is created without overrides.
    pub fn default_retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            save_days: self.default_save_days,
            checkpoint_days: self.default_checkpoint_days,
            diff_cache_days: self.default_diff_cache_days,
            directory_version_cache_days: self.default_directory_version_cache_days,
            logical_delete_days: self.default_logical_delete_days,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pubsub_topic: "graceevents".to_string(),
            default_save_days: 7,
            default_checkpoint_days: 365,
            default_diff_cache_days: 7,
            default_directory_version_cache_days: 7,
            default_logical_delete_days: 30,
            cache_ttl_seconds: 120,
            readiness_timeout_seconds: 30,
        }
    }
}

fn int_var(name: &'static str, default: i64) -> Result<i64> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be a number")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_retention() {
        let retention = Config::default().default_retention();
        assert_eq!(retention.save_days, 7);
        assert_eq!(retention.checkpoint_days, 365);
        assert_eq!(retention.logical_delete_days, 30);
    }
}
