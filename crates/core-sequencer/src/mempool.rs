use alloc::collections::VecDeque;
use alloc::vec::Vec;

use derive_where::derive_where;
use tracing::{debug, trace};

use roundfsm_core_types::{Context, Payload};

use crate::{Error, RoundSequencer};

/// Why a payload was not admitted to the mempool.
#[derive(thiserror::Error)]
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum MempoolError<Ctx: Context> {
    #[error("payload is already in the mempool")]
    AlreadyKnown,

    #[error("mempool is full ({capacity} payloads)")]
    Full { capacity: usize },

    #[error(transparent)]
    Rejected(#[from] Error<Ctx>),
}

/// Payloads waiting to be included in a block, checked against the current round.
#[derive_where(Clone, Debug)]
pub struct Mempool<Ctx: Context> {
    capacity: usize,
    queue: VecDeque<Payload<Ctx>>,
}

impl<Ctx: Context> Mempool<Ctx> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, payload: &Payload<Ctx>) -> bool {
        self.queue.contains(payload)
    }

    /// Admit a payload if the current round of `sequencer` would accept it.
    pub fn submit(
        &mut self,
        sequencer: &RoundSequencer<Ctx>,
        payload: Payload<Ctx>,
    ) -> Result<(), MempoolError<Ctx>> {
        if self.contains(&payload) {
            return Err(MempoolError::AlreadyKnown);
        }

        if self.queue.len() >= self.capacity {
            return Err(MempoolError::Full {
                capacity: self.capacity,
            });
        }

        sequencer.check_payload(&payload)?;

        trace!(sender = %payload.sender, "Payload admitted to the mempool");
        self.queue.push_back(payload);

        Ok(())
    }

    /// Take at most `max` payloads, oldest first.
    pub fn reap(&mut self, max: usize) -> Vec<Payload<Ctx>> {
        let n = max.min(self.queue.len());
        self.queue.drain(..n).collect()
    }

    /// Drop the payloads that were included in a committed block.
    ///
    /// A committed payload would otherwise be admitted again as a duplicate.
    pub fn remove_committed(&mut self, committed: &[Payload<Ctx>]) -> usize {
        let before = self.queue.len();
        self.queue.retain(|payload| !committed.contains(payload));
        before - self.queue.len()
    }

    /// Drop the payloads the current round of `sequencer` no longer accepts.
    ///
    /// Returns how many were dropped.
    pub fn recheck(&mut self, sequencer: &RoundSequencer<Ctx>) -> usize {
        let before = self.queue.len();
        self.queue
            .retain(|payload| sequencer.check_payload(payload).is_ok());

        let dropped = before - self.queue.len();
        if dropped > 0 {
            debug!(dropped, remaining = self.queue.len(), "Rechecked mempool");
        }

        dropped
    }
}
