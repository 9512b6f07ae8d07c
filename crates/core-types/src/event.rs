use core::fmt;

use borsh::io::{Error as IoError, ErrorKind, Read, Result as IoResult, Write};
use borsh::{BorshDeserialize, BorshSerialize};
use derive_where::derive_where;

use crate::Context;

/// An event emitted by a round when it concludes, or synthesized by the engine.
///
/// The three failure events are reserved and handled uniformly by every
/// application, the others are named by the application itself.
#[derive_where(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Event<Ctx: Context> {
    /// An event named by the application, eg. `DONE`
    App(Ctx::AppEvent),

    /// The collected payloads can no longer reach a quorum
    NoMajority,

    /// The round did not conclude before its deadline
    RoundTimeout,

    /// A reset round did not conclude before its deadline
    ResetTimeout,
}

impl<Ctx: Context> Event<Ctx> {
    /// Whether this event is synthesized by the engine when a deadline expires.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RoundTimeout | Self::ResetTimeout)
    }
}

impl<Ctx: Context> fmt::Display for Event<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App(event) => write!(f, "{event}"),
            Self::NoMajority => write!(f, "no_majority"),
            Self::RoundTimeout => write!(f, "round_timeout"),
            Self::ResetTimeout => write!(f, "reset_timeout"),
        }
    }
}

const TAG_APP: u8 = 0;
const TAG_NO_MAJORITY: u8 = 1;
const TAG_ROUND_TIMEOUT: u8 = 2;
const TAG_RESET_TIMEOUT: u8 = 3;

impl<Ctx: Context> BorshSerialize for Event<Ctx> {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        match self {
            Self::App(event) => {
                TAG_APP.serialize(writer)?;
                event.serialize(writer)
            }
            Self::NoMajority => TAG_NO_MAJORITY.serialize(writer),
            Self::RoundTimeout => TAG_ROUND_TIMEOUT.serialize(writer),
            Self::ResetTimeout => TAG_RESET_TIMEOUT.serialize(writer),
        }
    }
}

impl<Ctx: Context> BorshDeserialize for Event<Ctx> {
    fn deserialize_reader<R: Read>(reader: &mut R) -> IoResult<Self> {
        match u8::deserialize_reader(reader)? {
            TAG_APP => Ok(Self::App(Ctx::AppEvent::deserialize_reader(reader)?)),
            TAG_NO_MAJORITY => Ok(Self::NoMajority),
            TAG_ROUND_TIMEOUT => Ok(Self::RoundTimeout),
            TAG_RESET_TIMEOUT => Ok(Self::ResetTimeout),
            tag => Err(IoError::new(
                ErrorKind::InvalidData,
                format!("invalid event tag: {tag}"),
            )),
        }
    }
}
