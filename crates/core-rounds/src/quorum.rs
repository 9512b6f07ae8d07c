use alloc::vec::Vec;
use core::fmt;

use derive_where::derive_where;

use roundfsm_core_types::{Context, Event};

/// The quorum policy of a round, ie. when and how it concludes.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum Quorum<Ctx: Context> {
    /// Wait until a quorum of participants sent the same body.
    CollectSameUntilThreshold {
        /// Emitted instead of the success event when the winning body is nil.
        none_event: Option<Ctx::AppEvent>,
    },

    /// Wait until every participant sent a body, whatever it is.
    CollectDifferentUntilAll,

    /// Wait until a quorum of participants sent a body, then for some more committed blocks.
    CollectDifferentUntilThreshold {
        /// Number of blocks to wait for once the quorum is reached.
        required_block_confirmations: u64,
    },

    /// Wait for the single payload of the elected keeper.
    OnlyKeeperSends {
        /// Field of the synchronized data holding the address of the keeper.
        keeper_field: &'static str,

        /// Emitted when the keeper sends a nil body.
        fail_event: Ctx::AppEvent,
    },

    /// Wait until a quorum of participants cast the same ballot.
    Voting {
        /// Emitted when a quorum voted against.
        negative_event: Ctx::AppEvent,

        /// Emitted when a quorum abstained.
        none_event: Ctx::AppEvent,
    },

    /// A final round, which accepts no payloads and never concludes.
    Degenerate,
}

/// Families of quorum policies, by the shape of payloads they collect.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    SameValue,
    DifferentValues,
    Keeper,
    Voting,
    Final,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameValue => write!(f, "same-value"),
            Self::DifferentValues => write!(f, "different-values"),
            Self::Keeper => write!(f, "keeper"),
            Self::Voting => write!(f, "voting"),
            Self::Final => write!(f, "final"),
        }
    }
}

impl<Ctx: Context> Quorum<Ctx> {
    /// The family of this policy.
    pub fn family(&self) -> Family {
        match self {
            Self::CollectSameUntilThreshold { .. } => Family::SameValue,
            Self::CollectDifferentUntilAll => Family::DifferentValues,
            Self::CollectDifferentUntilThreshold { .. } => Family::DifferentValues,
            Self::OnlyKeeperSends { .. } => Family::Keeper,
            Self::Voting { .. } => Family::Voting,
            Self::Degenerate => Family::Final,
        }
    }

    pub fn accepts_payloads(&self) -> bool {
        !matches!(self, Self::Degenerate)
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Degenerate)
    }

    /// All the events a round with this policy and the given success event may emit.
    pub fn emitted_events(&self, done_event: Option<Ctx::AppEvent>) -> Vec<Event<Ctx>> {
        let mut events: Vec<Event<Ctx>> = done_event.into_iter().map(Event::App).collect();

        match self {
            Self::CollectSameUntilThreshold { none_event } => {
                events.extend(none_event.map(Event::App));
                events.push(Event::NoMajority);
            }
            Self::CollectDifferentUntilAll | Self::CollectDifferentUntilThreshold { .. } => {}
            Self::OnlyKeeperSends { fail_event, .. } => {
                events.push(Event::App(*fail_event));
            }
            Self::Voting {
                negative_event,
                none_event,
            } => {
                events.push(Event::App(*negative_event));
                events.push(Event::App(*none_event));
                events.push(Event::NoMajority);
            }
            Self::Degenerate => events.clear(),
        }

        events.sort();
        events.dedup();
        events
    }
}
