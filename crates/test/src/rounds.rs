//! The rounds and transition tables of the demo application.
//!
//! Participants register, agree on a value of a randomness beacon, elect a
//! keeper from it, let the keeper submit a transaction, vote on its validity,
//! and start over in a new period.

use core::fmt;
use core::time::Duration;
use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};

use roundfsm_core_app::{AbciApp, AbciAppInternalError};
use roundfsm_core_rounds::{Outcome, Quorum, RoundDef};
use roundfsm_core_types::{DataError, Event, SynchronizedData, Update};

use crate::{Body, PayloadKind, TestContext};

/// Field holding the randomness agreed upon in the current period.
pub const MOST_VOTED_RANDOMNESS: &str = "most_voted_randomness";

/// Field holding the address of the elected keeper.
pub const MOST_VOTED_KEEPER_ADDRESS: &str = "most_voted_keeper_address";

/// Field holding the hash of the transaction submitted by the keeper.
pub const FINAL_TX_HASH: &str = "final_tx_hash";

/// Field set once the participants validated the transaction.
pub const FINAL_VERIFICATION_STATUS: &str = "final_verification_status";

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub enum RoundName {
    Registration,
    LateRegistration,
    FinishedRegistration,
    Randomness,
    SelectKeeper,
    TransactionSubmission,
    ValidateTransaction,
    ResetAndPause,
}

impl fmt::Display for RoundName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registration => write!(f, "registration"),
            Self::LateRegistration => write!(f, "late_registration"),
            Self::FinishedRegistration => write!(f, "finished_registration"),
            Self::Randomness => write!(f, "randomness"),
            Self::SelectKeeper => write!(f, "select_keeper"),
            Self::TransactionSubmission => write!(f, "transaction_submission"),
            Self::ValidateTransaction => write!(f, "validate_transaction"),
            Self::ResetAndPause => write!(f, "reset_and_pause"),
        }
    }
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub enum AppEvent {
    Done,
    Negative,
    Empty,
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => write!(f, "done"),
            Self::Negative => write!(f, "negative"),
            Self::Empty => write!(f, "none"),
        }
    }
}

/// Shorthand for the success event.
pub const DONE: Event<TestContext> = Event::App(AppEvent::Done);

/// Durations of the timeout events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AppTimeouts {
    pub round: Duration,
    pub reset: Duration,
}

impl Default for AppTimeouts {
    fn default() -> Self {
        Self {
            round: Duration::from_secs(30),
            reset: Duration::from_secs(30),
        }
    }
}

type Data = SynchronizedData<TestContext>;

fn register(data: &Data, outcome: &Outcome<'_, TestContext>) -> Result<Data, DataError> {
    data.update(Update::new().participants(outcome.collection.senders().cloned()))
}

fn store_randomness(data: &Data, outcome: &Outcome<'_, TestContext>) -> Result<Data, DataError> {
    match outcome.value {
        Some(Body::Randomness { randomness, .. }) => {
            data.update(Update::new().set(MOST_VOTED_RANDOMNESS, randomness.as_str()))
        }
        _ => Ok(data.clone()),
    }
}

fn store_keeper(data: &Data, outcome: &Outcome<'_, TestContext>) -> Result<Data, DataError> {
    match outcome.value {
        Some(Body::SelectKeeper { keeper }) => {
            data.update(Update::new().set(MOST_VOTED_KEEPER_ADDRESS, keeper.to_string()))
        }
        _ => Ok(data.clone()),
    }
}

fn store_tx_hash(data: &Data, outcome: &Outcome<'_, TestContext>) -> Result<Data, DataError> {
    match outcome.value {
        Some(Body::Transaction {
            tx_hash: Some(tx_hash),
        }) => data.update(Update::new().set(FINAL_TX_HASH, tx_hash.as_str())),
        _ => Ok(data.clone()),
    }
}

fn store_verification(data: &Data, _: &Outcome<'_, TestContext>) -> Result<Data, DataError> {
    data.update(Update::new().set(FINAL_VERIFICATION_STATUS, true))
}

fn start_period(data: &Data, outcome: &Outcome<'_, TestContext>) -> Result<Data, DataError> {
    match outcome.value {
        Some(Body::Reset { period_count }) => data.update(Update::new_period(*period_count)),
        _ => Ok(data.clone()),
    }
}

/// Every participant registers.
pub fn registration_round() -> RoundDef<TestContext> {
    RoundDef::new(
        RoundName::Registration,
        Quorum::CollectDifferentUntilAll,
        PayloadKind::Registration,
        AppEvent::Done,
        register,
    )
}

/// A quorum of participants registers, late participants get the given number of blocks to join.
pub fn late_registration_round(required_block_confirmations: u64) -> RoundDef<TestContext> {
    RoundDef::new(
        RoundName::LateRegistration,
        Quorum::CollectDifferentUntilThreshold {
            required_block_confirmations,
        },
        PayloadKind::Registration,
        AppEvent::Done,
        register,
    )
}

pub fn finished_registration_round() -> RoundDef<TestContext> {
    RoundDef::degenerate(RoundName::FinishedRegistration)
}

pub fn randomness_round() -> RoundDef<TestContext> {
    RoundDef::new(
        RoundName::Randomness,
        Quorum::CollectSameUntilThreshold { none_event: None },
        PayloadKind::Randomness,
        AppEvent::Done,
        store_randomness,
    )
}

pub fn select_keeper_round() -> RoundDef<TestContext> {
    RoundDef::new(
        RoundName::SelectKeeper,
        Quorum::CollectSameUntilThreshold { none_event: None },
        PayloadKind::SelectKeeper,
        AppEvent::Done,
        store_keeper,
    )
}

pub fn transaction_submission_round() -> RoundDef<TestContext> {
    RoundDef::new(
        RoundName::TransactionSubmission,
        Quorum::OnlyKeeperSends {
            keeper_field: MOST_VOTED_KEEPER_ADDRESS,
            fail_event: AppEvent::Empty,
        },
        PayloadKind::Transaction,
        AppEvent::Done,
        store_tx_hash,
    )
}

pub fn validate_transaction_round() -> RoundDef<TestContext> {
    RoundDef::new(
        RoundName::ValidateTransaction,
        Quorum::Voting {
            negative_event: AppEvent::Negative,
            none_event: AppEvent::Empty,
        },
        PayloadKind::Validate,
        AppEvent::Done,
        store_verification,
    )
}

pub fn reset_and_pause_round() -> RoundDef<TestContext> {
    RoundDef::new(
        RoundName::ResetAndPause,
        Quorum::CollectSameUntilThreshold { none_event: None },
        PayloadKind::Reset,
        AppEvent::Done,
        start_period,
    )
    .with_reset()
}

/// Registration of every participant, ending in a final round.
pub fn registration_app(
    timeouts: AppTimeouts,
) -> Result<AbciApp<TestContext>, AbciAppInternalError<TestContext>> {
    use RoundName::*;

    AbciApp::builder(Registration)
        .round(registration_round())
        .round(finished_registration_round())
        .transitions(
            Registration,
            [(DONE, FinishedRegistration), (Event::RoundTimeout, Registration)],
        )
        .transitions(FinishedRegistration, [])
        .timeout(Event::RoundTimeout, timeouts.round)
        .build()
}

/// The periodic operation of the participants, once registered.
pub fn operation_app(
    timeouts: AppTimeouts,
) -> Result<AbciApp<TestContext>, AbciAppInternalError<TestContext>> {
    use RoundName::*;

    AbciApp::builder(Randomness)
        .round(randomness_round())
        .round(select_keeper_round())
        .round(transaction_submission_round())
        .round(validate_transaction_round())
        .round(reset_and_pause_round())
        .transitions(
            Randomness,
            [
                (DONE, SelectKeeper),
                (Event::NoMajority, Randomness),
                (Event::RoundTimeout, Randomness),
            ],
        )
        .transitions(
            SelectKeeper,
            [
                (DONE, TransactionSubmission),
                (Event::NoMajority, Randomness),
                (Event::RoundTimeout, Randomness),
            ],
        )
        .transitions(
            TransactionSubmission,
            [
                (DONE, ValidateTransaction),
                (Event::App(AppEvent::Empty), ResetAndPause),
                (Event::RoundTimeout, SelectKeeper),
            ],
        )
        .transitions(
            ValidateTransaction,
            [
                (DONE, ResetAndPause),
                (Event::App(AppEvent::Negative), SelectKeeper),
                (Event::App(AppEvent::Empty), SelectKeeper),
                (Event::NoMajority, SelectKeeper),
                (Event::RoundTimeout, SelectKeeper),
            ],
        )
        .transitions(
            ResetAndPause,
            [
                (DONE, Randomness),
                (Event::NoMajority, Randomness),
                (Event::ResetTimeout, Randomness),
            ],
        )
        .timeout(Event::RoundTimeout, timeouts.round)
        .timeout(Event::ResetTimeout, timeouts.reset)
        .build()
}

/// Registration followed by the periodic operation.
pub fn full_app(
    timeouts: AppTimeouts,
) -> Result<AbciApp<TestContext>, AbciAppInternalError<TestContext>> {
    AbciApp::chain(
        [registration_app(timeouts)?, operation_app(timeouts)?],
        BTreeMap::from([(RoundName::FinishedRegistration, RoundName::Randomness)]),
    )
}
