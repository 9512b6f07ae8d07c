//! Durable storage of the checkpoints of a [`RoundSequencer`](roundfsm_core_sequencer::RoundSequencer),
//! one per committed block, in a redb database.

use std::marker::PhantomData;
use std::path::Path;

use redb::ReadableTable;
use tracing::{debug, error};

use roundfsm_core_sequencer::Checkpoint;
use roundfsm_core_types::Context;

mod error;
pub use error::StoreError;

const CHECKPOINTS_TABLE: redb::TableDefinition<u64, Vec<u8>> =
    redb::TableDefinition::new("checkpoints");

/// Checkpoints keyed by the height of the block they were taken after.
pub struct Store<Ctx: Context> {
    db: redb::Database,
    _marker: PhantomData<Ctx>,
}

impl<Ctx: Context> std::fmt::Debug for Store<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl<Ctx: Context> Store<Ctx> {
    /// Open the database at `path`, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            db: redb::Database::create(path)?,
            _marker: PhantomData,
        };

        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<(), StoreError> {
        let tx = self.db.begin_write()?;
        // Implicitly creates the table if it does not exist yet
        let _ = tx.open_table(CHECKPOINTS_TABLE)?;
        tx.commit()?;
        Ok(())
    }

    /// Persist a checkpoint, replacing any checkpoint taken at the same height.
    pub fn save(&self, checkpoint: &Checkpoint<Ctx>) -> Result<(), StoreError> {
        let bytes = checkpoint.to_bytes().map_err(StoreError::Encode)?;

        let tx = self.db.begin_write()?;
        {
            let mut table = tx.open_table(CHECKPOINTS_TABLE)?;
            table.insert(checkpoint.height, bytes)?;
        }
        tx.commit()?;

        debug!(height = checkpoint.height, round = %checkpoint.round, "Saved checkpoint");
        Ok(())
    }

    /// The checkpoint taken at the given height.
    pub fn get(&self, height: u64) -> Result<Option<Checkpoint<Ctx>>, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(CHECKPOINTS_TABLE)?;

        let Some(value) = table.get(height)? else {
            return Ok(None);
        };

        let checkpoint = Checkpoint::from_bytes(&value.value()).inspect_err(|e| {
            error!(height, "Failed to decode checkpoint: {e}");
        })?;

        Ok(Some(checkpoint))
    }

    /// The checkpoint taken at the highest height.
    pub fn latest(&self) -> Result<Option<Checkpoint<Ctx>>, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(CHECKPOINTS_TABLE)?;

        let Some((_, value)) = table.last()? else {
            return Ok(None);
        };

        Ok(Some(Checkpoint::from_bytes(&value.value())?))
    }

    /// The heights at which checkpoints are stored, in ascending order.
    pub fn heights(&self) -> Result<Vec<u64>, StoreError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(CHECKPOINTS_TABLE)?;

        let mut heights = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            heights.push(key.value());
        }

        Ok(heights)
    }

    /// Keep only the `keep` most recent checkpoints. Returns the pruned heights.
    pub fn prune(&self, keep: usize) -> Result<Vec<u64>, StoreError> {
        let heights = self.heights()?;
        let pruned = heights[..heights.len().saturating_sub(keep)].to_vec();

        if pruned.is_empty() {
            return Ok(pruned);
        }

        let tx = self.db.begin_write()?;
        {
            let mut table = tx.open_table(CHECKPOINTS_TABLE)?;
            for height in &pruned {
                table.remove(*height)?;
            }
        }
        tx.commit()?;

        debug!(count = pruned.len(), "Pruned checkpoints");
        Ok(pruned)
    }
}
