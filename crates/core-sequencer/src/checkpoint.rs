use borsh::io::{Read, Result as IoResult, Write};
use borsh::{BorshDeserialize, BorshSerialize};
use derive_where::derive_where;

use roundfsm_core_types::{Context, Payload, Timestamp};

use crate::History;

/// The committed state of a sequencer, enough to resume after a restart.
///
/// The current round is resumed from the last committed snapshot, with the
/// payloads it collected in the blocks committed so far.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint<Ctx: Context> {
    /// Height of the last committed block.
    pub height: u64,

    /// Timestamp of the last block.
    pub last_timestamp: Option<Timestamp>,

    /// The round being collected.
    pub round: Ctx::RoundId,

    /// The index of that round instance.
    pub round_index: u64,

    /// Timestamp at which that round was entered, which its deadlines are relative to.
    pub round_entered_at: Option<Timestamp>,

    /// The payloads collected by that round, ordered by sender.
    pub collected: Vec<Payload<Ctx>>,

    /// The committed blocks that round counted towards its confirmations.
    pub block_confirmations: u64,

    /// The snapshots and concluded rounds.
    pub history: History<Ctx>,
}

impl<Ctx: Context> Checkpoint<Ctx> {
    pub fn to_bytes(&self) -> IoResult<Vec<u8>> {
        borsh::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> IoResult<Self> {
        borsh::from_slice(bytes)
    }
}

impl<Ctx: Context> BorshSerialize for Checkpoint<Ctx> {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        self.height.serialize(writer)?;
        self.last_timestamp.serialize(writer)?;
        self.round.serialize(writer)?;
        self.round_index.serialize(writer)?;
        self.round_entered_at.serialize(writer)?;
        self.collected.serialize(writer)?;
        self.block_confirmations.serialize(writer)?;
        self.history.serialize(writer)
    }
}

impl<Ctx: Context> BorshDeserialize for Checkpoint<Ctx> {
    fn deserialize_reader<R: Read>(reader: &mut R) -> IoResult<Self> {
        Ok(Self {
            height: u64::deserialize_reader(reader)?,
            last_timestamp: Option::deserialize_reader(reader)?,
            round: Ctx::RoundId::deserialize_reader(reader)?,
            round_index: u64::deserialize_reader(reader)?,
            round_entered_at: Option::deserialize_reader(reader)?,
            collected: Vec::deserialize_reader(reader)?,
            block_confirmations: u64::deserialize_reader(reader)?,
            history: History::deserialize_reader(reader)?,
        })
    }
}
