//! Init command

use std::path::Path;

use clap::Parser;
use color_eyre::eyre::{bail, Result, WrapErr};
use tracing::info;

use roundfsm_config::Config;

use crate::args::config_file;

#[derive(Parser, Clone, Debug, PartialEq)]
pub struct InitCmd {
    /// Number of agents of the simulated network
    #[clap(long, default_value_t = 4)]
    pub agents: usize,

    /// Overwrite an existing configuration file
    #[clap(long)]
    pub overwrite: bool,
}

impl InitCmd {
    /// Write a default configuration to `home`, returning it.
    pub fn run(&self, home: &Path) -> Result<Config> {
        if self.agents == 0 {
            bail!("the network needs at least one agent");
        }

        let path = config_file(home);
        if path.exists() && !self.overwrite {
            bail!(
                "{} already exists, use --overwrite to replace it",
                path.display()
            );
        }

        std::fs::create_dir_all(home)
            .wrap_err_with(|| format!("failed to create {}", home.display()))?;

        let mut config = Config {
            moniker: "roundfsm".to_string(),
            ..Config::default()
        };
        config.consensus.max_participants = self.agents;
        config.save(&path)?;

        info!(path = %path.display(), agents = self.agents, "Wrote configuration");

        Ok(config)
    }
}
