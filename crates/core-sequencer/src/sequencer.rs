use alloc::vec::Vec;

use derive_where::derive_where;
use tracing::{debug, info, warn};

use roundfsm_core_app::{AbciApp, AbciAppInternalError};
use roundfsm_core_rounds::Round;
use roundfsm_core_types::{ConsensusParams, Context, Event, Payload, SynchronizedData, Timestamp};

use crate::timeouts::{TimeoutId, Timeouts};
use crate::{BlockHeader, BlockPhase, Checkpoint, Error, History, RoundRecord, Transition};

/// Drives the rounds of an application from the blocks of the consensus engine.
///
/// The sequencer owns the current round and the history of the synchronized data.
/// The consensus engine calls [`begin_block`](RoundSequencer::begin_block),
/// [`deliver_payload`](RoundSequencer::deliver_payload) for every payload of the block,
/// [`end_block`](RoundSequencer::end_block) and [`commit`](RoundSequencer::commit),
/// in that order. Deadlines are measured against block timestamps.
#[derive_where(Debug)]
pub struct RoundSequencer<Ctx: Context> {
    /// The transition table of the application.
    app: AbciApp<Ctx>,

    /// The consensus parameters every round is instantiated with.
    params: ConsensusParams,

    /// The round collecting payloads.
    current_round: Round<Ctx>,

    /// Timestamp at which the current round was entered, if any block was seen yet.
    round_entered_at: Option<Timestamp>,

    /// The snapshots and concluded rounds.
    history: History<Ctx>,

    /// Deadlines of every round entered so far.
    timeouts: Timeouts<Event<Ctx>>,

    /// Deadlines of the current round.
    armed: Vec<TimeoutId>,

    /// Timestamp of the last block.
    last_timestamp: Option<Timestamp>,

    /// Height of the last committed block.
    height: u64,

    /// Where we stand in the block lifecycle.
    phase: BlockPhase,
}

impl<Ctx: Context> RoundSequencer<Ctx> {
    /// Create a sequencer entering the initial round of the application with the given data.
    pub fn new(
        app: AbciApp<Ctx>,
        params: ConsensusParams,
        initial_data: SynchronizedData<Ctx>,
        history_capacity: usize,
    ) -> Result<Self, Error<Ctx>> {
        let current_round = app.initial(initial_data.clone(), params)?;

        let mut sequencer = Self {
            app,
            params,
            current_round,
            round_entered_at: None,
            history: History::new(history_capacity, initial_data),
            timeouts: Timeouts::new(),
            armed: Vec::new(),
            last_timestamp: None,
            height: 0,
            phase: BlockPhase::WaitingForBeginBlock,
        };

        sequencer.enter_round();
        Ok(sequencer)
    }

    /// Resume from a checkpoint, replaying the payloads the current round had collected.
    pub fn restore(
        app: AbciApp<Ctx>,
        params: ConsensusParams,
        checkpoint: Checkpoint<Ctx>,
    ) -> Result<Self, Error<Ctx>> {
        let def = app
            .round(checkpoint.round)
            .ok_or(Error::CheckpointMismatch {
                round: checkpoint.round,
            })?
            .clone();

        let data = checkpoint.history.latest().clone();
        let current_round = Round::resume(
            def,
            checkpoint.round_index,
            data,
            params,
            checkpoint.collected,
            checkpoint.block_confirmations,
        )
        .map_err(Error::InvalidCheckpoint)?;

        let mut sequencer = Self {
            app,
            params,
            current_round,
            round_entered_at: checkpoint.round_entered_at,
            history: checkpoint.history,
            timeouts: Timeouts::new(),
            armed: Vec::new(),
            last_timestamp: checkpoint.last_timestamp,
            height: checkpoint.height,
            phase: BlockPhase::WaitingForBeginBlock,
        };

        info!(
            height = sequencer.height,
            round = %sequencer.current_round.id(),
            "Restored from checkpoint"
        );

        sequencer.arm_timeouts();
        Ok(sequencer)
    }

    /// The committed state, to be persisted after every commit.
    pub fn checkpoint(&self) -> Result<Checkpoint<Ctx>, Error<Ctx>> {
        self.expect_phase(BlockPhase::WaitingForBeginBlock)?;

        Ok(Checkpoint {
            height: self.height,
            last_timestamp: self.last_timestamp,
            round: self.current_round.id(),
            round_index: self.current_round.index(),
            round_entered_at: self.round_entered_at,
            collected: self.current_round.collection().iter().cloned().collect(),
            block_confirmations: self.current_round.block_confirmations(),
            history: self.history.clone(),
        })
    }

    pub fn app(&self) -> &AbciApp<Ctx> {
        &self.app
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    /// The round collecting payloads.
    pub fn current_round(&self) -> &Round<Ctx> {
        &self.current_round
    }

    pub fn current_round_id(&self) -> Ctx::RoundId {
        self.current_round.id()
    }

    /// The number of rounds concluded so far.
    pub fn round_count(&self) -> u64 {
        self.current_round.index()
    }

    /// The synchronized data all participants agreed upon so far.
    pub fn current_synchronized_data(&self) -> &SynchronizedData<Ctx> {
        self.history.latest()
    }

    /// The last round that concluded, if any.
    pub fn latest_result(&self) -> Option<&RoundRecord<Ctx>> {
        self.history.last_round()
    }

    pub fn history(&self) -> &History<Ctx> {
        &self.history
    }

    /// Height of the last committed block.
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last_timestamp
    }

    pub fn phase(&self) -> BlockPhase {
        self.phase
    }

    /// Whether the application reached a final round.
    pub fn is_finished(&self) -> bool {
        self.current_round.is_final()
    }

    /// The earliest deadline of the current round, if any is armed.
    pub fn next_deadline(&mut self) -> Option<(Timestamp, Event<Ctx>)> {
        self.timeouts
            .earliest()
            .map(|(deadline, event)| (deadline, *event))
    }

    /// Start a new block: fires the deadlines that expired before its timestamp.
    pub fn begin_block(&mut self, header: BlockHeader) -> Result<Vec<Transition<Ctx>>, Error<Ctx>> {
        self.expect_phase(BlockPhase::WaitingForBeginBlock)?;

        if header.height != self.height + 1 {
            return Err(Error::InvalidBlockHeight {
                expected: self.height + 1,
                actual: header.height,
            });
        }

        let transitions = self.update_time(header.timestamp)?;
        self.phase = BlockPhase::WaitingForDeliverTx;

        Ok(transitions)
    }

    /// Check a payload against the current round, eg. before admitting it to the mempool.
    pub fn check_payload(&self, payload: &Payload<Ctx>) -> Result<(), Error<Ctx>> {
        self.current_round
            .check_payload(payload)
            .map_err(Error::InvalidTransaction)
    }

    /// Hand a payload of the current block to the current round.
    pub fn deliver_payload(&mut self, payload: Payload<Ctx>) -> Result<(), Error<Ctx>> {
        self.expect_phase(BlockPhase::WaitingForDeliverTx)?;

        let sender = payload.sender.clone();

        self.current_round.process_payload(payload).map_err(|e| {
            warn!(round = %self.current_round.id(), %sender, "Rejected payload: {e}");
            Error::InvalidTransaction(e)
        })
    }

    /// Close the current block.
    pub fn end_block(&mut self) -> Result<(), Error<Ctx>> {
        self.expect_phase(BlockPhase::WaitingForDeliverTx)?;
        self.phase = BlockPhase::WaitingForCommit;
        Ok(())
    }

    /// Commit the current block and let the current round decide whether it concludes.
    pub fn commit(&mut self) -> Result<Option<Transition<Ctx>>, Error<Ctx>> {
        self.expect_phase(BlockPhase::WaitingForCommit)?;

        self.height += 1;
        self.phase = BlockPhase::WaitingForBeginBlock;

        self.on_block_end()
    }

    fn on_block_end(&mut self) -> Result<Option<Transition<Ctx>>, Error<Ctx>> {
        self.current_round.confirm_block();

        let round = self.current_round.id();
        let result = self
            .current_round
            .end_block()
            .map_err(|source| AbciAppInternalError::UpdateFailed { round, source })?;

        match result {
            Some((data, event)) => self.advance(event, data).map(Some),
            None => Ok(None),
        }
    }

    /// Fire every deadline at or before `timestamp`.
    ///
    /// Only allowed between blocks, so that a round is never replaced while a block
    /// is delivering payloads to it.
    pub fn update_time(&mut self, timestamp: Timestamp) -> Result<Vec<Transition<Ctx>>, Error<Ctx>> {
        self.expect_phase(BlockPhase::WaitingForBeginBlock)?;
        self.last_timestamp = Some(timestamp);

        // The rounds entered before the first block are timed from that block
        if self.round_entered_at.is_none() {
            self.round_entered_at = Some(timestamp);
            self.arm_timeouts();
        }

        let mut transitions = Vec::new();

        while let Some((deadline, event)) = self.timeouts.pop_expired(timestamp) {
            warn!(
                round = %self.current_round.id(),
                %event,
                %deadline,
                "Deadline expired"
            );

            let data = self.current_round.synchronized_data().clone();
            transitions.push(self.advance(event, data)?);
        }

        Ok(transitions)
    }

    fn advance(
        &mut self,
        event: Event<Ctx>,
        data: SynchronizedData<Ctx>,
    ) -> Result<Transition<Ctx>, Error<Ctx>> {
        let from = self.current_round.id();
        let index = self.current_round.index();

        info!(round = %from, %event, "Round is done with event");

        let next = self.app.advance(&self.current_round, event, data.clone())?;

        let version = self.history.push(data);
        self.history.record(RoundRecord {
            round: from,
            index,
            event,
            version,
            height: self.height,
        });

        self.current_round = next;
        self.round_entered_at = self.last_timestamp;
        self.enter_round();

        Ok(Transition {
            from,
            event,
            to: self.current_round.id(),
            index: self.current_round.index(),
        })
    }

    fn enter_round(&mut self) {
        info!(
            round = %self.current_round.id(),
            period = self.current_round.synchronized_data().period_count(),
            index = self.current_round.index(),
            "Entered round"
        );

        self.arm_timeouts();
    }

    /// Replace the deadlines of the previous round by those of the current one.
    fn arm_timeouts(&mut self) {
        for id in self.armed.drain(..) {
            self.timeouts.cancel(id);
        }

        // Armed with the first block
        let Some(entered_at) = self.round_entered_at else {
            return;
        };

        for (event, duration) in self.app.timeout_events(self.current_round.id()) {
            let deadline = entered_at + duration;
            let id = self.timeouts.add(deadline, event);
            self.armed.push(id);

            debug!(round = %self.current_round.id(), %event, %deadline, "Scheduled timeout");
        }
    }

    fn expect_phase(&self, expected: BlockPhase) -> Result<(), Error<Ctx>> {
        if self.phase != expected {
            return Err(Error::InvalidPhase {
                expected,
                actual: self.phase,
            });
        }

        Ok(())
    }
}
