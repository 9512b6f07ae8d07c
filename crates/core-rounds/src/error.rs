use derive_where::derive_where;

use roundfsm_core_types::{Context, PayloadKind};

/// A payload rejected by the round currently collecting.
///
/// These errors concern a single payload and are recoverable:
/// the payload is dropped and the round goes on.
#[derive(thiserror::Error)]
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum TransactionNotValid<Ctx: Context> {
    #[error("round {round} does not accept payloads")]
    NoPayloadsAllowed { round: Ctx::RoundId },

    #[error("round {round} expects payloads of kind {expected}, got {actual}")]
    WrongPayloadKind {
        round: Ctx::RoundId,
        expected: PayloadKind<Ctx>,
        actual: PayloadKind<Ctx>,
    },

    #[error("payload was produced for instance {actual} of round {round}, which is now at instance {expected}")]
    StaleRound {
        round: Ctx::RoundId,
        expected: u64,
        actual: u64,
    },

    #[error("{sender} is not a participant of round {round}")]
    NotAParticipant {
        round: Ctx::RoundId,
        sender: Ctx::Address,
    },

    #[error("{sender} already sent a different payload in round {round}")]
    ConflictingPayload {
        round: Ctx::RoundId,
        sender: Ctx::Address,
    },

    #[error("{sender} is not the keeper of round {round}")]
    NotKeeper {
        round: Ctx::RoundId,
        sender: Ctx::Address,
    },

    #[error("keeper {sender} already sent its payload in round {round}")]
    KeeperAlreadySent {
        round: Ctx::RoundId,
        sender: Ctx::Address,
    },
}
