//! Typed view of `carrybot.yaml`.
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration. `CARRYBOT_SEED` overrides the layout seed after parsing.

use std::path::Path;

use carrybot_agent::AgentConfig;
use carrybot_world::{DEFAULT_ROUND_SECS, LayoutConfig};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `world.seed`.
pub const SEED_ENV_VAR: &str = "CARRYBOT_SEED";

/// Why a configuration could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config: {source}")]
    Io {
        /// Error from the filesystem.
        #[from]
        source: std::io::Error,
    },

    /// The text is not valid YAML for this schema.
    #[error("invalid config YAML: {source}")]
    Yaml {
        /// Error from the YAML parser.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid value {value:?} in {var}: {source}")]
    InvalidOverride {
        /// Variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
        /// Why it did not parse.
        source: std::num::ParseIntError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, timing).
    #[serde(default)]
    pub world: WorldConfig,

    /// Agent tunables.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Scoring round settings.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Arena layout.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Run boundaries.
    #[serde(default)]
    pub bounds: SimulationBoundsConfig,

    /// Log level and format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Read and parse the file at `path`.
    ///
    /// `CARRYBOT_SEED` overrides `world.seed` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] if the seed override is not a `u64`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse YAML text, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] if the seed override is not a `u64`.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if a value does not parse.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(SEED_ENV_VAR) {
            self.world.seed = value.trim().parse().map_err(|source| ConfigError::InvalidOverride {
                var: SEED_ENV_VAR,
                value: value.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Seed, step length, and pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Label used in log lines.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for the starting layout.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Simulated seconds per tick.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: f64,

    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_secs: default_tick_secs(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Scoring round configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Round length in simulated seconds.
    #[serde(default = "default_round_secs")]
    pub round_secs: f64,

    /// End the run when the round timer expires (default: true).
    #[serde(default = "default_true")]
    pub end_on_round_over: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            round_secs: default_round_secs(),
            end_on_round_over: default_true(),
        }
    }
}

/// Limits on how long a run may go.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Steps before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Real seconds before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `carrybot_core=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_world_name() -> String {
    "carrybot".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_secs() -> f64 {
    0.05
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_round_secs() -> f64 {
    DEFAULT_ROUND_SECS
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
