use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};

use roundfsm_core_types::{Ballot, PayloadBody};

use crate::Address;

/// The kinds of payloads exchanged by the demo application.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PayloadKind {
    Registration,
    Randomness,
    SelectKeeper,
    Transaction,
    Validate,
    Reset,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registration => write!(f, "registration"),
            Self::Randomness => write!(f, "randomness"),
            Self::SelectKeeper => write!(f, "select_keeper"),
            Self::Transaction => write!(f, "transaction"),
            Self::Validate => write!(f, "validate"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// The payloads exchanged by the demo application.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize)]
pub enum Body {
    /// Join the set of participants
    Registration,

    /// A value read from the randomness beacon for the given period
    Randomness { period: u64, randomness: String },

    /// The participant elected to submit the transaction
    SelectKeeper { keeper: Address },

    /// The hash of the transaction submitted by the keeper, if it could submit one
    Transaction { tx_hash: Option<String> },

    /// Whether the submitted transaction is valid
    Validate { ballot: Ballot },

    /// Start the period with the given count
    Reset { period_count: u64 },
}

impl PayloadBody for Body {
    type Kind = PayloadKind;

    fn kind(&self) -> PayloadKind {
        match self {
            Self::Registration => PayloadKind::Registration,
            Self::Randomness { .. } => PayloadKind::Randomness,
            Self::SelectKeeper { .. } => PayloadKind::SelectKeeper,
            Self::Transaction { .. } => PayloadKind::Transaction,
            Self::Validate { .. } => PayloadKind::Validate,
            Self::Reset { .. } => PayloadKind::Reset,
        }
    }

    fn ballot(&self) -> Option<Ballot> {
        match self {
            Self::Validate { ballot } => Some(*ballot),
            _ => None,
        }
    }

    fn is_nil(&self) -> bool {
        matches!(self, Self::Transaction { tx_hash: None })
    }
}
