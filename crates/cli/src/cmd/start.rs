//! Start command

use std::fmt;
use std::path::Path;

use clap::Parser;
use color_eyre::eyre::{bail, Result};
use tracing::info;

use roundfsm_config::Config;
use roundfsm_test::network::{Network, NetworkConfig};
use roundfsm_test::rounds::AppTimeouts;
use roundfsm_test::RoundName;

#[derive(Parser, Clone, Debug, Default, PartialEq)]
pub struct StartCmd {
    /// Number of agents, defaults to `consensus.max_participants`
    #[clap(long)]
    pub agents: Option<usize>,

    /// Number of blocks to produce
    #[clap(long, default_value_t = 100)]
    pub blocks: u64,
}

/// State of the network once the run is over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub height: u64,
    pub period: u64,
    pub round: RoundName,
    pub transitions: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "height {}, period {}, round {} ({} transitions)",
            self.height, self.period, self.round, self.transitions
        )
    }
}

impl StartCmd {
    pub fn run(&self, home: &Path, config: &Config) -> Result<Summary> {
        let network_config = self.network_config(home, config)?;
        let mut network = Network::new(network_config)?;

        info!(
            moniker = %config.moniker,
            agents = network.agents().len(),
            height = network.height(),
            blocks = self.blocks,
            "Starting network"
        );

        let transitions = network.run(self.blocks)?;

        let Some(round) = network.current_round() else {
            bail!("network has no agents");
        };

        let period = network
            .synchronized_data()
            .map(|data| data.period_count())
            .unwrap_or_default();

        Ok(Summary {
            height: network.height(),
            period,
            round,
            transitions: transitions.len(),
        })
    }

    pub fn network_config(&self, home: &Path, config: &Config) -> Result<NetworkConfig> {
        let agents = self.agents.unwrap_or(config.consensus.max_participants);
        if agents == 0 {
            bail!("the network needs at least one agent");
        }

        let mut network_config = NetworkConfig::honest(agents).with_timeouts(AppTimeouts {
            round: config.timeouts.round,
            reset: config.timeouts.reset,
        });

        network_config.block_interval = config.timeouts.block_interval;
        network_config.threshold_params = config.consensus_params().threshold_params;
        network_config.history_capacity = config.history.capacity;

        if config.store.enabled {
            network_config = network_config.with_store_dir(home.join(&config.store.path));
            network_config.store_retain = config.store.retain;
        }

        Ok(network_config)
    }
}
