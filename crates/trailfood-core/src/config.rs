use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Errors from validating an [`EngineConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("utc offset must be within -23..=23 hours, got {0}")]
    UtcOffset(i32),
    #[error("invariant tolerance must be positive and finite, got {0}")]
    Tolerance(f64),
    #[error("default days must be at least 1, got {0}")]
    DefaultDays(u32),
}

/// Engine-wide settings. Every field has a default so partial config
/// files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Offset applied to node creation timestamps.
    pub utc_offset_hours: i32,
    /// Tolerance used by invariant validation.
    pub invariant_tolerance: f64,
    /// Trip length given to newly created adventures.
    pub default_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 2,
            invariant_tolerance: 1e-9,
            default_days: 1,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-23..=23).contains(&self.utc_offset_hours) {
            return Err(ConfigError::UtcOffset(self.utc_offset_hours));
        }
        if !self.invariant_tolerance.is_finite() || self.invariant_tolerance <= 0.0 {
            return Err(ConfigError::Tolerance(self.invariant_tolerance));
        }
        if self.default_days == 0 {
            return Err(ConfigError::DefaultDays(self.default_days));
        }
        Ok(())
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or(Utc.fix())
    }

    /// Current time in the configured offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset())
    }
}
