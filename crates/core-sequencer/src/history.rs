//! Bounded history of the synchronized data and of the concluded rounds.

use alloc::collections::VecDeque;

use borsh::io::{Error as IoError, ErrorKind, Read, Result as IoResult, Write};
use borsh::{BorshDeserialize, BorshSerialize};
use derive_where::derive_where;

use roundfsm_core_types::{Context, Event, SynchronizedData};

/// Position of a snapshot in the history. The initial snapshot is version 0.
pub type Version = u64;

/// A round that concluded.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct RoundRecord<Ctx: Context> {
    /// The round that concluded.
    pub round: Ctx::RoundId,

    /// The index of that round instance.
    pub index: u64,

    /// The event it concluded with.
    pub event: Event<Ctx>,

    /// The version of the snapshot it handed to its successor.
    pub version: Version,

    /// Height of the block at which it concluded.
    pub height: u64,
}

impl<Ctx: Context> BorshSerialize for RoundRecord<Ctx> {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        self.round.serialize(writer)?;
        self.index.serialize(writer)?;
        self.event.serialize(writer)?;
        self.version.serialize(writer)?;
        self.height.serialize(writer)
    }
}

impl<Ctx: Context> BorshDeserialize for RoundRecord<Ctx> {
    fn deserialize_reader<R: Read>(reader: &mut R) -> IoResult<Self> {
        Ok(Self {
            round: Ctx::RoundId::deserialize_reader(reader)?,
            index: u64::deserialize_reader(reader)?,
            event: Event::deserialize_reader(reader)?,
            version: u64::deserialize_reader(reader)?,
            height: u64::deserialize_reader(reader)?,
        })
    }
}

/// An arena of the latest snapshots, addressed by version, and of the latest concluded rounds.
///
/// Holds at most `capacity` entries of each. The most recent snapshot is always kept.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct History<Ctx: Context> {
    capacity: usize,
    base: Version,
    snapshots: VecDeque<SynchronizedData<Ctx>>,
    rounds: VecDeque<RoundRecord<Ctx>>,
}

impl<Ctx: Context> History<Ctx> {
    /// Start a history from the initial snapshot.
    pub fn new(capacity: usize, initial: SynchronizedData<Ctx>) -> Self {
        Self {
            capacity: capacity.max(1),
            base: 0,
            snapshots: VecDeque::from([initial]),
            rounds: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a snapshot, evicting the oldest one if the history is full.
    pub fn push(&mut self, data: SynchronizedData<Ctx>) -> Version {
        self.snapshots.push_back(data);

        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
            self.base += 1;
        }

        self.latest_version()
    }

    /// Append a concluded round, evicting the oldest one if the history is full.
    pub fn record(&mut self, record: RoundRecord<Ctx>) {
        self.rounds.push_back(record);

        while self.rounds.len() > self.capacity {
            self.rounds.pop_front();
        }
    }

    /// The snapshot with the given version, if it was not evicted yet.
    pub fn get(&self, version: Version) -> Option<&SynchronizedData<Ctx>> {
        let offset = version.checked_sub(self.base)?;
        self.snapshots.get(usize::try_from(offset).ok()?)
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> &SynchronizedData<Ctx> {
        // The arena always holds at least one snapshot
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn latest_version(&self) -> Version {
        self.base + self.snapshots.len() as u64 - 1
    }

    pub fn oldest_version(&self) -> Version {
        self.base
    }

    /// The retained snapshots, oldest first.
    pub fn snapshots(&self) -> impl Iterator<Item = (Version, &SynchronizedData<Ctx>)> {
        (self.base..).zip(self.snapshots.iter())
    }

    /// The retained concluded rounds, oldest first.
    pub fn rounds(&self) -> impl Iterator<Item = &RoundRecord<Ctx>> {
        self.rounds.iter()
    }

    /// The most recently concluded round.
    pub fn last_round(&self) -> Option<&RoundRecord<Ctx>> {
        self.rounds.back()
    }
}

impl<Ctx: Context> BorshSerialize for History<Ctx> {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        (self.capacity as u64).serialize(writer)?;
        self.base.serialize(writer)?;
        self.snapshots.serialize(writer)?;
        self.rounds.serialize(writer)
    }
}

impl<Ctx: Context> BorshDeserialize for History<Ctx> {
    fn deserialize_reader<R: Read>(reader: &mut R) -> IoResult<Self> {
        let capacity = u64::deserialize_reader(reader)?;
        let base = u64::deserialize_reader(reader)?;
        let snapshots = VecDeque::<SynchronizedData<Ctx>>::deserialize_reader(reader)?;
        let rounds = VecDeque::<RoundRecord<Ctx>>::deserialize_reader(reader)?;

        if snapshots.is_empty() {
            return Err(IoError::new(ErrorKind::InvalidData, "empty history"));
        }

        let capacity = usize::try_from(capacity)
            .map_err(|_| IoError::new(ErrorKind::InvalidData, "history capacity overflow"))?;

        Ok(Self {
            // Same bound as `History::new`, so the latest snapshot is never evicted
            capacity: capacity.max(1),
            base,
            snapshots,
            rounds,
        })
    }
}
