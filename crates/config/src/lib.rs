//! Configuration of a roundfsm node, read from a TOML file with
//! `ROUNDFSM__*` environment overrides.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unused_import_braces,
    unused_qualifications
)]

use core::fmt;
use core::str::FromStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use roundfsm_core_types::{ConsensusParams, ThresholdParam, ThresholdParams};

/// Prefix of the environment variables overriding the configuration file.
pub const ENV_PREFIX: &str = "ROUNDFSM";

/// Separator between the sections of an environment variable name,
/// eg. `ROUNDFSM__TIMEOUTS__ROUND=10s`.
pub const ENV_SEPARATOR: &str = "__";

/// Name of the configuration file within the home directory.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid quorum threshold {numerator}/{denominator}")]
    InvalidQuorum { numerator: u64, denominator: u64 },

    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// roundfsm configuration options
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// A custom human-readable name for this node
    pub moniker: String,

    /// Consensus configuration options
    pub consensus: ConsensusConfig,

    /// Round and block timing
    pub timeouts: TimeoutConfig,

    /// Retained history of the sequencer
    pub history: HistoryConfig,

    /// Checkpoint storage
    pub store: StoreConfig,

    /// Log configuration options
    pub logging: LoggingConfig,
}

impl Config {
    /// Load the configuration from `path`, with overrides from the environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Load the configuration from `path`, with overrides taken from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(
        path: impl AsRef<Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let file = config::File::from(path.as_ref().to_path_buf())
            .format(config::FileFormat::Toml)
            .required(true);

        let env = config::Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .source(env);

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to `path` as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = self.to_toml()?;

        std::fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ThresholdParam {
            numerator,
            denominator,
        } = self.consensus.quorum;

        if denominator == 0 || numerator == 0 || numerator >= denominator {
            return Err(ConfigError::InvalidQuorum {
                numerator,
                denominator,
            });
        }

        if self.consensus.max_participants == 0 {
            return Err(ConfigError::Invalid(
                "consensus.max_participants must be positive",
            ));
        }

        if self.history.capacity == 0 {
            return Err(ConfigError::Invalid("history.capacity must be positive"));
        }

        if self.timeouts.round.is_zero() {
            return Err(ConfigError::Invalid("timeouts.round must be positive"));
        }

        if self.timeouts.reset.is_zero() {
            return Err(ConfigError::Invalid("timeouts.reset must be positive"));
        }

        if self.store.retain == 0 {
            return Err(ConfigError::Invalid("store.retain must be positive"));
        }

        if self.timeouts.block_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "timeouts.block_interval must be positive",
            ));
        }

        Ok(())
    }

    /// Parameters of the sequencer for this configuration.
    pub fn consensus_params(&self) -> ConsensusParams {
        ConsensusParams::new(self.consensus.max_participants).with_threshold_params(
            ThresholdParams {
                quorum: self.consensus.quorum,
            },
        )
    }
}

/// Consensus configuration options
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Expected number of participants before registration completes
    pub max_participants: usize,

    /// Share of the participants needed to agree on a value
    pub quorum: ThresholdParam,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            max_participants: 4,
            quorum: ThresholdParam::TWO_THIRDS,
        }
    }
}

/// Timeouts
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long a round waits for its payloads before timing out
    #[serde(with = "humantime_serde")]
    pub round: Duration,

    /// How long the reset round pauses before starting a new period
    #[serde(with = "humantime_serde")]
    pub reset: Duration,

    /// Time between two consecutive blocks
    #[serde(with = "humantime_serde")]
    pub block_interval: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            round: Duration::from_secs(30),
            reset: Duration::from_secs(30),
            block_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Number of concluded rounds kept in memory
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Persist a checkpoint after every committed block
    pub enabled: bool,

    /// Directory of the checkpoint databases, relative to the home directory
    pub path: PathBuf,

    /// Number of most recent checkpoints kept per agent
    pub retain: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("store"),
            retain: 16,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            e => Err(format!("Invalid log level: {e}")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plaintext,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plaintext" => Ok(LogFormat::Plaintext),
            "json" => Ok(LogFormat::Json),
            e => Err(format!("Invalid log format: {e}")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Plaintext => f.write_str("plaintext"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}
