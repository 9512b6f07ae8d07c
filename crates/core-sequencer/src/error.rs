use derive_where::derive_where;

use roundfsm_core_app::AbciAppInternalError;
use roundfsm_core_rounds::TransactionNotValid;
use roundfsm_core_types::Context;

use crate::BlockPhase;

/// An error returned by the [`RoundSequencer`](crate::RoundSequencer).
#[derive(thiserror::Error)]
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum Error<Ctx: Context> {
    /// A payload was rejected by the current round.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(#[from] TransactionNotValid<Ctx>),

    /// The application does not account for what happened.
    #[error(transparent)]
    Internal(#[from] AbciAppInternalError<Ctx>),

    /// A block lifecycle call came out of order.
    #[error("sequencer is {actual}, expected it to be {expected}")]
    InvalidPhase {
        expected: BlockPhase,
        actual: BlockPhase,
    },

    /// A block was delivered at an unexpected height.
    #[error("expected a block at height {expected}, got one at height {actual}")]
    InvalidBlockHeight { expected: u64, actual: u64 },

    /// A checkpoint does not match the application it is restored into.
    #[error("checkpoint refers to round {round}, which is unknown to the application")]
    CheckpointMismatch { round: Ctx::RoundId },

    /// A checkpoint holds a payload its round does not accept.
    #[error("checkpoint holds a payload its round rejects: {0}")]
    InvalidCheckpoint(TransactionNotValid<Ctx>),
}

impl<Ctx: Context> Error<Ctx> {
    /// Whether the host must stop: only rejected payloads are recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InvalidTransaction(_))
    }
}
