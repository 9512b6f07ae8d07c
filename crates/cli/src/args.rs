//! Node command-line interface configuration.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use roundfsm_config::{LogFormat, LogLevel, CONFIG_FILE};

use crate::cmd::init::InitCmd;
use crate::cmd::start::StartCmd;

#[derive(Parser, Clone, Debug)]
#[command(name = "roundfsm", version, about, long_about = None)]
pub struct Args {
    /// Home directory holding the configuration and the stores
    #[arg(long, global = true, env = "ROUNDFSM_HOME", default_value = ".roundfsm")]
    pub home: PathBuf,

    /// Log level, overrides the configuration (RUST_LOG takes precedence)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log format, overrides the configuration
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Commands {
    /// Write a default configuration file in the home directory
    Init(InitCmd),

    /// Run a simulated network
    Start(StartCmd),
}

impl Args {
    pub fn config_file(&self) -> PathBuf {
        config_file(&self.home)
    }
}

/// Path of the configuration file in `home`.
pub fn config_file(home: &Path) -> PathBuf {
    home.join(CONFIG_FILE)
}
