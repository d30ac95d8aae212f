//! Session configuration and the input policy applied at the boundary.

use serde::{Deserialize, Serialize};
use verdant_hierarchy::{EntityLevel, LevelToggle};

use crate::error::{Result, SessionError};

/// How raw control values are sanitized before they reach the engine.
///
/// The engine itself never clamps. Non-finite values always become 0; with
/// `clamp_inputs` set, percentages are limited to `[0, 100]` and exact
/// amounts to `[0, consumption]`, the same bounds the controls enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPolicy {
    pub clamp_inputs: bool,
}

impl Default for InputPolicy {
    fn default() -> Self {
        Self { clamp_inputs: true }
    }
}

impl InputPolicy {
    /// Sanitize a percentage.
    pub fn percentage(&self, value: f64) -> f64 {
        self.bounded(value, 100.0)
    }

    /// Sanitize an absolute amount for an entity consuming `consumption`.
    pub fn amount(&self, value: f64, consumption: f64) -> f64 {
        self.bounded(value, consumption.max(0.0))
    }

    fn bounded(&self, value: f64, max: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        if self.clamp_inputs {
            value.clamp(0.0, max)
        } else {
            value
        }
    }
}

/// Configuration for an allocation session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Boundary sanitization of raw inputs
    pub input_policy: InputPolicy,

    /// Initial level toggles
    pub toggles: Vec<LevelToggle>,

    /// Log filter directive for the binary
    pub log_filter: String,
}

/// Log filter used when `VERDANT_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "verdant=info,verdant_session=info,verdant_allocation=warn";

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input_policy: InputPolicy::default(),
            toggles: LevelToggle::defaults(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables with defaults.
    ///
    /// - `VERDANT_CLAMP_INPUTS`: `true`/`false` (also `1`/`0`, `yes`/`no`)
    /// - `VERDANT_LEVELS`: comma-separated enabled levels, e.g. `region,facility`
    /// - `VERDANT_LOG`: tracing filter directive
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`SessionConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("VERDANT_CLAMP_INPUTS") {
            config.input_policy.clamp_inputs = parse_bool(&raw).ok_or_else(|| {
                SessionError::Config(format!("VERDANT_CLAMP_INPUTS must be a boolean, got {raw:?}"))
            })?;
        }

        if let Some(raw) = lookup("VERDANT_LEVELS") {
            let enabled = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<EntityLevel>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| SessionError::Config(format!("VERDANT_LEVELS: {e}")))?;
            for toggle in &mut config.toggles {
                toggle.enabled = enabled.contains(&toggle.level);
            }
        }

        if let Some(filter) = lookup("VERDANT_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
