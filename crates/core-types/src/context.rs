use core::fmt::{Debug, Display};
use core::hash::Hash;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::PayloadBody;

/// This trait allows to abstract over the various datatypes
/// that are used by an application built on top of the round engine.
pub trait Context
where
    Self: Sized + Clone + Send + Sync + 'static,
{
    /// The type of address of a participant.
    type Address: Clone
        + Debug
        + Display
        + Eq
        + Ord
        + Hash
        + Send
        + Sync
        + BorshSerialize
        + BorshDeserialize;

    /// The identifier of a round class, usually a closed enum.
    type RoundId: Copy
        + Debug
        + Display
        + Eq
        + Ord
        + Hash
        + Send
        + Sync
        + BorshSerialize
        + BorshDeserialize;

    /// The events an application names in its transition table, on top of
    /// the reserved failure events.
    type AppEvent: Copy
        + Debug
        + Display
        + Eq
        + Ord
        + Hash
        + Send
        + Sync
        + BorshSerialize
        + BorshDeserialize;

    /// The closed union of payload bodies exchanged by the participants.
    type Body: PayloadBody;
}

/// Type alias to make it easier to refer the kind of a payload body.
pub type PayloadKind<Ctx> = <<Ctx as Context>::Body as PayloadBody>::Kind;
