//! Split-pane configuration.
//!
//! # Environment Variables
//!
//! | Variable | Type | Default | Description |
//! |----------|------|---------|-------------|
//! | `MULTISPLIT_FLOATING_DIVIDERS` | bool | true | Start from preferred sizes |
//! | `MULTISPLIT_CONTINUOUS_LAYOUT` | bool | true | Re-layout on every drag move |
//! | `MULTISPLIT_VALIDATE_EVERY_LAYOUT` | bool | false | Re-validate before each pass |
//! | `MULTISPLIT_TRANSITION_STEPS` | u32 | 8 | Ticks per ratio transition |
//! | `MULTISPLIT_TRANSITION_INTERVAL_MS` | u64 | 16 | Delay between ticks |
//!
//! With the `config-file` feature the same settings load from TOML or JSON:
//!
//! ```toml
//! floating_dividers = false
//! validation = "every_layout"
//! transition_steps = 12
//! ```

#[cfg(feature = "config-file")]
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fewest ticks a ratio transition may use.
pub const MIN_TRANSITION_STEPS: u32 = 1;
/// Most ticks a ratio transition may use.
pub const MAX_TRANSITION_STEPS: u32 = 240;

/// When the installed tree is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Only when a model is installed.
    #[default]
    OnInstall,
    /// Also before every layout pass.
    EveryLayout,
}

/// Behaviour switches for a [`SplitPane`](crate::SplitPane).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitPaneConfig {
    /// Lay out from preferred sizes until the first drag.
    pub floating_dividers: bool,
    /// Re-layout on every drag move instead of on release.
    pub continuous_layout: bool,
    pub validation: ValidationPolicy,
    /// Ticks per animated ratio transition.
    pub transition_steps: u32,
    /// Milliseconds between transition ticks.
    pub transition_interval_ms: u64,
}

impl Default for SplitPaneConfig {
    fn default() -> Self {
        Self {
            floating_dividers: true,
            continuous_layout: true,
            validation: ValidationPolicy::OnInstall,
            transition_steps: 8,
            transition_interval_ms: 16,
        }
    }
}

impl SplitPaneConfig {
    #[must_use]
    pub const fn with_floating_dividers(mut self, floating: bool) -> Self {
        self.floating_dividers = floating;
        self
    }

    #[must_use]
    pub const fn with_continuous_layout(mut self, continuous: bool) -> Self {
        self.continuous_layout = continuous;
        self
    }

    #[must_use]
    pub const fn with_validation(mut self, validation: ValidationPolicy) -> Self {
        self.validation = validation;
        self
    }

    #[must_use]
    pub const fn with_transition_steps(mut self, steps: u32) -> Self {
        self.transition_steps = steps;
        self
    }

    #[must_use]
    pub fn with_transition_interval(mut self, interval: Duration) -> Self {
        self.transition_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub const fn transition_interval(&self) -> Duration {
        Duration::from_millis(self.transition_interval_ms)
    }

    /// Load from the process environment. Unparseable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load through a custom lookup so tests stay deterministic.
    #[must_use]
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("MULTISPLIT_FLOATING_DIVIDERS").and_then(|v| parse_flag(&v)) {
            config.floating_dividers = value;
        }
        if let Some(value) = lookup("MULTISPLIT_CONTINUOUS_LAYOUT").and_then(|v| parse_flag(&v)) {
            config.continuous_layout = value;
        }
        if let Some(value) =
            lookup("MULTISPLIT_VALIDATE_EVERY_LAYOUT").and_then(|v| parse_flag(&v))
        {
            config.validation = if value {
                ValidationPolicy::EveryLayout
            } else {
                ValidationPolicy::OnInstall
            };
        }
        if let Some(val) = lookup("MULTISPLIT_TRANSITION_STEPS")
            && let Ok(steps) = val.trim().parse::<u32>()
        {
            config.transition_steps = steps;
        }
        if let Some(val) = lookup("MULTISPLIT_TRANSITION_INTERVAL_MS")
            && let Ok(ms) = val.trim().parse::<u64>()
        {
            config.transition_interval_ms = ms;
        }

        config.validated()
    }

    /// Clamp `transition_steps` into
    /// [`MIN_TRANSITION_STEPS`]`..=`[`MAX_TRANSITION_STEPS`].
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.transition_steps = self
            .transition_steps
            .clamp(MIN_TRANSITION_STEPS, MAX_TRANSITION_STEPS);
        self
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(s)
            .map(Self::validated)
            .map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(s)
            .map(Self::validated)
            .map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Errors from loading a configuration file.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Json(e) => Some(e),
        }
    }
}
