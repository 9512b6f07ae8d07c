//! The state shared by all participants, replaced wholesale at every round boundary.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use borsh::io::{Read, Result as IoResult, Write};
use borsh::{BorshDeserialize, BorshSerialize};
use derive_where::derive_where;

use crate::{Context, Value};

/// Errors raised when reading or updating the synchronized data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    /// A mandatory field was read before any round set it.
    #[error("field `{key}` is not set")]
    FieldNotSet { key: String },

    /// A field holds a value of another type than the one requested.
    #[error("field `{key}` holds a {actual} value, expected {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A new period must have a higher count than the current one.
    #[error("period count must increase: current is {current}, requested {requested}")]
    PeriodNotIncreasing { current: u64, requested: u64 },

    /// The snapshot could not be encoded.
    #[error("failed to encode synchronized data: {0}")]
    Encode(String),

    /// The bytes are not a valid encoding of synchronized data.
    #[error("failed to decode synchronized data: {0}")]
    Decode(String),
}

/// A set of changes to apply on top of a [`SynchronizedData`] snapshot.
#[derive_where(Clone, Debug, Default, PartialEq, Eq)]
pub struct Update<Ctx: Context> {
    new_period: Option<u64>,
    participants: Option<BTreeSet<Ctx::Address>>,
    fields: BTreeMap<String, Value>,
}

impl<Ctx: Context> Update<Ctx> {
    /// An update that only merges fields into the current period.
    pub fn new() -> Self {
        Self::default()
    }

    /// An update that starts the period with the given count.
    ///
    /// The fields of the previous period are dropped, only the fields
    /// carried by this update survive. Participants are carried over.
    pub fn new_period(period_count: u64) -> Self {
        Self {
            new_period: Some(period_count),
            ..Self::default()
        }
    }

    /// Replace the set of participants.
    pub fn participants(mut self, participants: impl IntoIterator<Item = Ctx::Address>) -> Self {
        self.participants = Some(participants.into_iter().collect());
        self
    }

    /// Set a field.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A snapshot of the state all participants agree upon.
///
/// Snapshots are immutable: [`SynchronizedData::update`] returns a new one.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct SynchronizedData<Ctx: Context> {
    period_count: u64,
    participants: BTreeSet<Ctx::Address>,
    fields: BTreeMap<String, Value>,
}

impl<Ctx: Context> SynchronizedData<Ctx> {
    /// Create the snapshot of the first period, with the given declared participants.
    pub fn new(participants: impl IntoIterator<Item = Ctx::Address>) -> Self {
        Self {
            period_count: 0,
            participants: participants.into_iter().collect(),
            fields: BTreeMap::new(),
        }
    }

    /// The number of periods completed so far.
    pub fn period_count(&self) -> u64 {
        self.period_count
    }

    /// The participants, in ascending order.
    pub fn participants(&self) -> &BTreeSet<Ctx::Address> {
        &self.participants
    }

    /// The participants as an ordered list.
    pub fn sorted_participants(&self) -> Vec<Ctx::Address> {
        self.participants.iter().cloned().collect()
    }

    pub fn nb_participants(&self) -> usize {
        self.participants.len()
    }

    pub fn is_participant(&self, address: &Ctx::Address) -> bool {
        self.participants.contains(address)
    }

    /// All the fields of the current period.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Return a new snapshot with the given changes applied on top of this one.
    pub fn update(&self, update: Update<Ctx>) -> Result<Self, DataError> {
        let Update {
            new_period,
            participants,
            fields,
        } = update;

        let (period_count, mut merged) = match new_period {
            Some(requested) if requested <= self.period_count => {
                return Err(DataError::PeriodNotIncreasing {
                    current: self.period_count,
                    requested,
                });
            }
            Some(requested) => (requested, BTreeMap::new()),
            None => (self.period_count, self.fields.clone()),
        };

        merged.extend(fields);

        Ok(Self {
            period_count,
            participants: participants.unwrap_or_else(|| self.participants.clone()),
            fields: merged,
        })
    }

    /// Look up an optional field.
    pub fn get_opt(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Look up a mandatory field.
    pub fn get(&self, key: &str) -> Result<&Value, DataError> {
        self.fields.get(key).ok_or_else(|| DataError::FieldNotSet {
            key: key.into(),
        })
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, DataError> {
        self.get_typed(key, "bool", Value::as_bool)
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, DataError> {
        self.get_typed(key, "int", Value::as_i64)
    }

    pub fn get_u64(&self, key: &str) -> Result<u64, DataError> {
        self.get_typed(key, "uint", Value::as_u64)
    }

    pub fn get_text(&self, key: &str) -> Result<&str, DataError> {
        self.get_typed(key, "text", Value::as_text)
    }

    pub fn get_bytes(&self, key: &str) -> Result<&[u8], DataError> {
        self.get_typed(key, "bytes", Value::as_bytes)
    }

    pub fn get_list(&self, key: &str) -> Result<&[Value], DataError> {
        self.get_typed(key, "list", Value::as_list)
    }

    pub fn get_map(&self, key: &str) -> Result<&BTreeMap<String, Value>, DataError> {
        self.get_typed(key, "map", Value::as_map)
    }

    fn get_typed<'a, T: 'a>(
        &'a self,
        key: &str,
        expected: &'static str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T, DataError> {
        let value = self.get(key)?;

        extract(value).ok_or_else(|| DataError::WrongType {
            key: key.into(),
            expected,
            actual: value.type_name(),
        })
    }

    /// The canonical encoding of this snapshot.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DataError> {
        borsh::to_vec(self).map_err(|e| DataError::Encode(e.to_string()))
    }

    /// Decode a snapshot from its canonical encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DataError> {
        borsh::from_slice(bytes).map_err(|e| DataError::Decode(e.to_string()))
    }
}

impl<Ctx: Context> BorshSerialize for SynchronizedData<Ctx> {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        self.period_count.serialize(writer)?;
        self.participants.serialize(writer)?;
        self.fields.serialize(writer)
    }
}

impl<Ctx: Context> BorshDeserialize for SynchronizedData<Ctx> {
    fn deserialize_reader<R: Read>(reader: &mut R) -> IoResult<Self> {
        Ok(Self {
            period_count: u64::deserialize_reader(reader)?,
            participants: BTreeSet::deserialize_reader(reader)?,
            fields: BTreeMap::deserialize_reader(reader)?,
        })
    }
}
