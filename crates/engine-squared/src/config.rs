//! Core configuration, loadable from JSON.
//!
//! ```json
//! {
//!     "fixed_tick_rate_secs": 0.02,
//!     "relative_tick_rate_secs": 0.02,
//!     "error_policy": "log_and_continue",
//!     "default_scheduler": "update"
//! }
//! ```
//!
//! Every field is optional; missing ones take the defaults below.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::scheduler::ErrorPolicy;
use crate::time::Clock;

/// Which built-in scheduler `register_system` targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultScheduler {
    #[default]
    Update,
    FixedTimeUpdate,
    RelativeTimeUpdate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub fixed_tick_rate_secs: f32,
    pub relative_tick_rate_secs: f32,
    pub error_policy: ErrorPolicy,
    pub default_scheduler: DefaultScheduler,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            fixed_tick_rate_secs: Clock::DEFAULT_TICK_RATE.as_secs_f32(),
            relative_tick_rate_secs: Clock::DEFAULT_TICK_RATE.as_secs_f32(),
            error_policy: ErrorPolicy::default(),
            default_scheduler: DefaultScheduler::default(),
        }
    }
}

impl CoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn fixed_tick_rate(&self) -> Duration {
        secs_or_default("fixed_tick_rate_secs", self.fixed_tick_rate_secs)
    }

    pub fn relative_tick_rate(&self) -> Duration {
        secs_or_default("relative_tick_rate_secs", self.relative_tick_rate_secs)
    }
}

fn secs_or_default(field: &str, secs: f32) -> Duration {
    match Duration::try_from_secs_f32(secs) {
        Ok(duration) if !duration.is_zero() => duration,
        _ => {
            log::warn!("Invalid `{field}` ({secs}), using {:?}", Clock::DEFAULT_TICK_RATE);
            Clock::DEFAULT_TICK_RATE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.error_policy, ErrorPolicy::LogAndContinue);
        assert_eq!(config.default_scheduler, DefaultScheduler::Update);
    }

    #[test]
    fn fields_are_parsed() {
        let config = CoreConfig::from_json_str(
            r#"{
                "fixed_tick_rate_secs": 0.5,
                "error_policy": "nothing",
                "default_scheduler": "fixed_time_update"
            }"#,
        )
        .unwrap();
        assert_eq!(config.fixed_tick_rate(), Duration::from_millis(500));
        assert_eq!(config.error_policy, ErrorPolicy::Nothing);
        assert_eq!(config.default_scheduler, DefaultScheduler::FixedTimeUpdate);
    }

    #[test]
    fn invalid_tick_rates_fall_back() {
        let config = CoreConfig {
            fixed_tick_rate_secs: -1.0,
            relative_tick_rate_secs: 0.0,
            ..CoreConfig::default()
        };
        assert_eq!(config.fixed_tick_rate(), Clock::DEFAULT_TICK_RATE);
        assert_eq!(config.relative_tick_rate(), Clock::DEFAULT_TICK_RATE);
    }

    #[test]
    fn bad_json_and_missing_files_are_errors() {
        assert!(matches!(
            CoreConfig::from_json_str("{ nope"),
            Err(EngineError::ConfigParse(_))
        ));
        assert!(matches!(
            CoreConfig::load("/definitely/not/here.json"),
            Err(EngineError::ConfigIo { .. })
        ));
    }
}
