use core::fmt;

use derive_where::derive_where;

use roundfsm_core_types::{Context, Event, Timestamp};

/// The header of a block delivered by the consensus engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: u64,
    pub timestamp: Timestamp,
}

impl BlockHeader {
    pub fn new(height: u64, timestamp: Timestamp) -> Self {
        Self { height, timestamp }
    }
}

/// Where the sequencer stands in the lifecycle of the current block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockPhase {
    /// Between two blocks
    WaitingForBeginBlock,

    /// Receiving the payloads of the block
    WaitingForDeliverTx,

    /// The block is closed and about to be committed
    WaitingForCommit,
}

impl fmt::Display for BlockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForBeginBlock => write!(f, "waiting for begin block"),
            Self::WaitingForDeliverTx => write!(f, "waiting for deliver tx"),
            Self::WaitingForCommit => write!(f, "waiting for commit"),
        }
    }
}

/// A transition taken by the sequencer from one round to the next.
#[derive_where(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Transition<Ctx: Context> {
    /// The round that concluded
    pub from: Ctx::RoundId,

    /// The event it concluded with
    pub event: Event<Ctx>,

    /// The round entered
    pub to: Ctx::RoundId,

    /// The index of the round entered
    pub index: u64,
}
