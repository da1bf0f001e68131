//! Playback tuning loaded from TOML.
//!
//! ```toml
//! strategy = "buffered"
//! max_delay_ms = 3000
//! min_delay_ms = 5
//! min_chunk_size = 1
//! ```
//!
//! Every key is optional; missing keys fall back to [`TypewriterConfig::default`].

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// Ceiling on the delay between two steps; divided by the backlog to get the actual delay.
pub const MAX_DELAY: Duration = Duration::from_millis(3000);

/// Floor on the delay between two steps.
pub const MIN_DELAY: Duration = Duration::from_millis(5);

/// Graphemes delivered per step when the backlog is small.
pub const MIN_CHAR_CHUNK_SIZE: usize = 1;

/// Selects which playback engine [`crate::new_playback`] builds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStrategy {
    /// Cadence recomputed from the backlog on every update.
    #[default]
    Dynamic,
    /// Whole snapshots queued and drained at a fixed cadence.
    Buffered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypewriterConfig {
    pub strategy: PlaybackStrategy,
    #[serde(rename = "max_delay_ms", with = "duration_ms")]
    pub max_delay: Duration,
    #[serde(rename = "min_delay_ms", with = "duration_ms")]
    pub min_delay: Duration,
    pub min_chunk_size: usize,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            strategy: PlaybackStrategy::Dynamic,
            max_delay: MAX_DELAY,
            min_delay: MIN_DELAY,
            min_chunk_size: MIN_CHAR_CHUNK_SIZE,
        }
    }
}

impl TypewriterConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_strategy(self, strategy: PlaybackStrategy) -> Self {
        Self { strategy, ..self }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_delay.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "min_delay_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.max_delay < self.min_delay {
            return Err(ConfigError::InvalidValue {
                key: "max_delay_ms",
                message: format!(
                    "must be at least min_delay_ms ({})",
                    self.min_delay.as_millis()
                ),
            });
        }
        if self.min_chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "min_chunk_size",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
