use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::time::Duration;

use derive_where::derive_where;

use roundfsm_core_rounds::{Round, RoundDef};
use roundfsm_core_types::{ConsensusParams, Context, Event, SynchronizedData};

use crate::{AbciAppBuilder, AbciAppInternalError};

/// The outgoing transitions of every round.
pub type TransitionFunction<Ctx> =
    BTreeMap<<Ctx as Context>::RoundId, BTreeMap<Event<Ctx>, <Ctx as Context>::RoundId>>;

/// The declarative state machine of an application: its rounds, the transitions
/// between them, and the deadlines of the timeout events.
///
/// An `AbciApp` can only be obtained through [`AbciAppBuilder::build`] or
/// [`AbciApp::chain`], which check the table for completeness. It is immutable.
#[derive_where(Clone, Debug)]
pub struct AbciApp<Ctx: Context> {
    pub(crate) initial_round: Ctx::RoundId,
    pub(crate) rounds: BTreeMap<Ctx::RoundId, RoundDef<Ctx>>,
    pub(crate) transition_function: TransitionFunction<Ctx>,
    pub(crate) event_to_timeout: BTreeMap<Event<Ctx>, Duration>,
}

impl<Ctx: Context> AbciApp<Ctx> {
    /// Start building an application entering the given round first.
    pub fn builder(initial_round: Ctx::RoundId) -> AbciAppBuilder<Ctx> {
        AbciAppBuilder::new(initial_round)
    }

    pub fn initial_round(&self) -> Ctx::RoundId {
        self.initial_round
    }

    /// The definition of the given round.
    pub fn round(&self, id: Ctx::RoundId) -> Option<&RoundDef<Ctx>> {
        self.rounds.get(&id)
    }

    pub fn rounds(&self) -> impl Iterator<Item = &RoundDef<Ctx>> {
        self.rounds.values()
    }

    pub fn transition_function(&self) -> &TransitionFunction<Ctx> {
        &self.transition_function
    }

    pub fn event_to_timeout(&self) -> &BTreeMap<Event<Ctx>, Duration> {
        &self.event_to_timeout
    }

    /// The rounds the application cannot leave.
    pub fn final_rounds(&self) -> impl Iterator<Item = Ctx::RoundId> + '_ {
        self.rounds
            .values()
            .filter(|def| def.is_final())
            .map(|def| def.id)
    }

    /// Every event appearing in the transition table.
    pub fn events(&self) -> BTreeSet<Event<Ctx>> {
        self.transition_function
            .values()
            .flat_map(|transitions| transitions.keys().copied())
            .collect()
    }

    /// The round to enter when `event` is emitted in round `from`.
    pub fn transition(
        &self,
        from: Ctx::RoundId,
        event: &Event<Ctx>,
    ) -> Result<&RoundDef<Ctx>, AbciAppInternalError<Ctx>> {
        self.transition_function
            .get(&from)
            .and_then(|transitions| transitions.get(event))
            .and_then(|next| self.rounds.get(next))
            .ok_or(AbciAppInternalError::UnknownTransition {
                round: from,
                event: *event,
            })
    }

    /// Instantiate the initial round with the given data.
    pub fn initial(
        &self,
        data: SynchronizedData<Ctx>,
        params: ConsensusParams,
    ) -> Result<Round<Ctx>, AbciAppInternalError<Ctx>> {
        let def = self.rounds.get(&self.initial_round).ok_or(
            AbciAppInternalError::InitialRoundNotRegistered {
                round: self.initial_round,
            },
        )?;

        Ok(Round::new(def.clone(), 0, data, params))
    }

    /// Instantiate the successor of `current` for the given event,
    /// with the synchronized data the current round decided upon.
    pub fn advance(
        &self,
        current: &Round<Ctx>,
        event: Event<Ctx>,
        data: SynchronizedData<Ctx>,
    ) -> Result<Round<Ctx>, AbciAppInternalError<Ctx>> {
        let next = self.transition(current.id(), &event)?;

        Ok(Round::new(
            next.clone(),
            current.index() + 1,
            data,
            *current.params(),
        ))
    }

    /// The timeout events to arm when entering the given round, with their durations.
    pub fn timeout_events(&self, round: Ctx::RoundId) -> Vec<(Event<Ctx>, Duration)> {
        let Some(transitions) = self.transition_function.get(&round) else {
            return Vec::new();
        };

        transitions
            .keys()
            .filter_map(|event| {
                self.event_to_timeout
                    .get(event)
                    .map(|duration| (*event, *duration))
            })
            .collect()
    }
}
