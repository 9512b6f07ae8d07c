use core::time::Duration;

use derive_where::derive_where;

use roundfsm_core_rounds::Family;
use roundfsm_core_types::{Context, DataError, Event, PayloadKind};

/// An error in the modeling of an application.
///
/// Raised when a transition table is built or chained, or when a round
/// concludes in a way the table does not account for. These errors are fatal.
#[derive(thiserror::Error)]
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum AbciAppInternalError<Ctx: Context> {
    #[error("internal error: initial round {round} is not registered")]
    InitialRoundNotRegistered { round: Ctx::RoundId },

    #[error("internal error: round {round} is registered twice")]
    DuplicateRound { round: Ctx::RoundId },

    #[error("internal error: round {round} appears in the transition table but is not registered")]
    UnknownRound { round: Ctx::RoundId },

    #[error("internal error: round {round} is reachable but has no entry in the transition table")]
    MissingTransitions { round: Ctx::RoundId },

    #[error("internal error: final round {round} has outgoing transitions")]
    FinalRoundHasTransitions { round: Ctx::RoundId },

    #[error("internal error: round {round} accepts no payload kind or has no success event")]
    IncompleteRound { round: Ctx::RoundId },

    #[error("internal error: round {round} has no transition for its deadline event {event}")]
    MissingDeadline {
        round: Ctx::RoundId,
        event: Event<Ctx>,
    },

    #[error("internal error: no timeout duration for event {event}")]
    MissingTimeoutDuration { event: Event<Ctx> },

    #[error("internal error: timeout event {event} has a zero duration")]
    ZeroTimeoutDuration { event: Event<Ctx> },

    #[error("internal error: round {round} may emit {event}, which has no transition")]
    UnhandledEvent {
        round: Ctx::RoundId,
        event: Event<Ctx>,
    },

    #[error("internal error: round {round} collects {kind} payloads with a {family} quorum, but they are collected with a {expected} quorum elsewhere")]
    PayloadKindMismatch {
        round: Ctx::RoundId,
        kind: PayloadKind<Ctx>,
        family: Family,
        expected: Family,
    },

    #[error("internal error: no transition from round {round} on event {event}")]
    UnknownTransition {
        round: Ctx::RoundId,
        event: Event<Ctx>,
    },

    #[error("internal error: round {round} failed to compute its synchronized data: {source}")]
    UpdateFailed {
        round: Ctx::RoundId,
        source: DataError,
    },

    #[error("internal error: cannot chain an empty list of applications")]
    EmptyChain,

    #[error("internal error: chained round {round} is not a final round")]
    ChainedRoundNotFinal { round: Ctx::RoundId },

    #[error("internal error: conflicting timeouts for event {event}: {first:?} and {second:?}")]
    ConflictingTimeout {
        event: Event<Ctx>,
        first: Duration,
        second: Duration,
    },
}
