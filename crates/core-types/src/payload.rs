use core::fmt::{Debug, Display};
use core::hash::Hash;

use borsh::io::{Read, Result as IoResult, Write};
use borsh::{BorshDeserialize, BorshSerialize};
use derive_where::derive_where;

use crate::{Context, PayloadKind};

/// A ballot cast in a voting round.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ballot {
    /// In favour of the proposition
    For,
    /// Against the proposition
    Against,
    /// No opinion
    Abstain,
}

/// The body of a payload, ie. the typed proposal a participant makes for a round.
///
/// Applications implement this on a closed enum, one variant per kind of payload.
pub trait PayloadBody
where
    Self: Clone + Debug + Eq + Ord + Hash + Send + Sync + BorshSerialize + BorshDeserialize,
{
    /// Discriminator of the body variants.
    type Kind: Copy + Debug + Display + Eq + Ord + Hash + Send + Sync;

    /// The kind of this body.
    fn kind(&self) -> Self::Kind;

    /// The ballot carried by this body, if it is cast in a voting round.
    fn ballot(&self) -> Option<Ballot> {
        None
    }

    /// Whether this body carries no value, eg. a keeper reporting that it had nothing to submit.
    fn is_nil(&self) -> bool {
        false
    }
}

/// A payload sent by a participant.
#[derive_where(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Payload<Ctx: Context> {
    /// The participant who sent the payload
    pub sender: Ctx::Address,

    /// The proposal itself
    pub body: Ctx::Body,

    /// Index of the round instance the payload was produced for, if known.
    ///
    /// A payload carrying the index of an already concluded round is rejected.
    pub round_index: Option<u64>,
}

impl<Ctx: Context> Payload<Ctx> {
    /// Create a new payload, not bound to any round instance.
    pub fn new(sender: Ctx::Address, body: Ctx::Body) -> Self {
        Self {
            sender,
            body,
            round_index: None,
        }
    }

    /// Bind this payload to the round instance with the given index.
    pub fn for_round(self, round_index: u64) -> Self {
        Self {
            round_index: Some(round_index),
            ..self
        }
    }

    /// The kind of the payload body.
    pub fn kind(&self) -> PayloadKind<Ctx> {
        self.body.kind()
    }

    /// The participant who sent the payload.
    pub fn sender(&self) -> &Ctx::Address {
        &self.sender
    }
}

impl<Ctx: Context> BorshSerialize for Payload<Ctx> {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        self.sender.serialize(writer)?;
        self.body.serialize(writer)?;
        self.round_index.serialize(writer)
    }
}

impl<Ctx: Context> BorshDeserialize for Payload<Ctx> {
    fn deserialize_reader<R: Read>(reader: &mut R) -> IoResult<Self> {
        Ok(Self {
            sender: Ctx::Address::deserialize_reader(reader)?,
            body: Ctx::Body::deserialize_reader(reader)?,
            round_index: Option::deserialize_reader(reader)?,
        })
    }
}
