use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::vec::Vec;
use core::time::Duration;

use derive_where::derive_where;
use tracing::debug;

use roundfsm_core_rounds::{Family, RoundDef};
use roundfsm_core_types::{Context, Event, PayloadKind};

use crate::app::TransitionFunction;
use crate::{AbciApp, AbciAppInternalError};

/// Collects the rounds, transitions and timeouts of an application.
#[derive_where(Clone, Debug)]
pub struct AbciAppBuilder<Ctx: Context> {
    initial_round: Ctx::RoundId,
    rounds: BTreeMap<Ctx::RoundId, RoundDef<Ctx>>,
    duplicates: Vec<Ctx::RoundId>,
    transition_function: TransitionFunction<Ctx>,
    event_to_timeout: BTreeMap<Event<Ctx>, Duration>,
}

impl<Ctx: Context> AbciAppBuilder<Ctx> {
    pub fn new(initial_round: Ctx::RoundId) -> Self {
        Self {
            initial_round,
            rounds: BTreeMap::new(),
            duplicates: Vec::new(),
            transition_function: BTreeMap::new(),
            event_to_timeout: BTreeMap::new(),
        }
    }

    /// Register a round class.
    pub fn round(mut self, def: RoundDef<Ctx>) -> Self {
        let id = def.id;
        if self.rounds.insert(id, def).is_some() {
            self.duplicates.push(id);
        }
        self
    }

    /// Register the outgoing transitions of a round.
    ///
    /// Final rounds must be declared here too, with no transitions.
    pub fn transitions(
        mut self,
        from: Ctx::RoundId,
        transitions: impl IntoIterator<Item = (Event<Ctx>, Ctx::RoundId)>,
    ) -> Self {
        self.transition_function
            .entry(from)
            .or_default()
            .extend(transitions);
        self
    }

    /// Register a single transition.
    pub fn transition(self, from: Ctx::RoundId, event: Event<Ctx>, to: Ctx::RoundId) -> Self {
        self.transitions(from, [(event, to)])
    }

    /// Set the duration after which the given timeout event fires.
    pub fn timeout(mut self, event: Event<Ctx>, duration: Duration) -> Self {
        self.event_to_timeout.insert(event, duration);
        self
    }

    pub(crate) fn from_parts(
        initial_round: Ctx::RoundId,
        rounds: BTreeMap<Ctx::RoundId, RoundDef<Ctx>>,
        transition_function: TransitionFunction<Ctx>,
        event_to_timeout: BTreeMap<Event<Ctx>, Duration>,
    ) -> Self {
        Self {
            initial_round,
            rounds,
            duplicates: Vec::new(),
            transition_function,
            event_to_timeout,
        }
    }

    /// Check the table for completeness and build the application.
    pub fn build(self) -> Result<AbciApp<Ctx>, AbciAppInternalError<Ctx>> {
        if let Some(&round) = self.duplicates.first() {
            return Err(AbciAppInternalError::DuplicateRound { round });
        }

        if !self.rounds.contains_key(&self.initial_round) {
            return Err(AbciAppInternalError::InitialRoundNotRegistered {
                round: self.initial_round,
            });
        }

        self.check_registered()?;
        self.check_payload_kinds()?;

        // A zero deadline expires as soon as it is armed, timing out every round it enters
        if let Some((event, _)) = self
            .event_to_timeout
            .iter()
            .find(|(_, duration)| duration.is_zero())
        {
            return Err(AbciAppInternalError::ZeroTimeoutDuration { event: *event });
        }

        let reachable = self.reachable()?;

        for &id in &reachable {
            let def = &self.rounds[&id];
            let transitions = &self.transition_function[&id];

            if def.is_final() {
                if !transitions.is_empty() {
                    return Err(AbciAppInternalError::FinalRoundHasTransitions { round: id });
                }
                continue;
            }

            let deadline = if def.reset {
                Event::ResetTimeout
            } else {
                Event::RoundTimeout
            };

            if !transitions.contains_key(&deadline) {
                return Err(AbciAppInternalError::MissingDeadline {
                    round: id,
                    event: deadline,
                });
            }

            for event in def.quorum.emitted_events(def.done_event) {
                if !transitions.contains_key(&event) {
                    return Err(AbciAppInternalError::UnhandledEvent { round: id, event });
                }
            }

            for event in transitions.keys().filter(|event| event.is_timeout()) {
                if !self.event_to_timeout.contains_key(event) {
                    return Err(AbciAppInternalError::MissingTimeoutDuration { event: *event });
                }
            }
        }

        debug!(
            initial_round = %self.initial_round,
            rounds = self.rounds.len(),
            reachable = reachable.len(),
            "Built application"
        );

        Ok(AbciApp {
            initial_round: self.initial_round,
            rounds: self.rounds,
            transition_function: self.transition_function,
            event_to_timeout: self.event_to_timeout,
        })
    }

    /// Every round named in the table must be registered.
    fn check_registered(&self) -> Result<(), AbciAppInternalError<Ctx>> {
        for (from, transitions) in &self.transition_function {
            let named = core::iter::once(from).chain(transitions.values());

            for round in named {
                if !self.rounds.contains_key(round) {
                    return Err(AbciAppInternalError::UnknownRound { round: *round });
                }
            }
        }

        Ok(())
    }

    /// Each payload kind is collected by a single family of quorum policies,
    /// and only final rounds go without a payload kind.
    fn check_payload_kinds(&self) -> Result<(), AbciAppInternalError<Ctx>> {
        let mut families: BTreeMap<PayloadKind<Ctx>, Family> = BTreeMap::new();

        for def in self.rounds.values() {
            if def.is_final() {
                continue;
            }

            let (Some(kind), Some(_)) = (def.payload_kind, def.done_event) else {
                return Err(AbciAppInternalError::IncompleteRound { round: def.id });
            };

            let family = def.quorum.family();
            let expected = *families.entry(kind).or_insert(family);

            if expected != family {
                return Err(AbciAppInternalError::PayloadKindMismatch {
                    round: def.id,
                    kind,
                    family,
                    expected,
                });
            }
        }

        Ok(())
    }

    /// The rounds reachable from the initial round, which must all have a table entry.
    fn reachable(&self) -> Result<BTreeSet<Ctx::RoundId>, AbciAppInternalError<Ctx>> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([self.initial_round]);

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }

            let transitions = self
                .transition_function
                .get(&id)
                .ok_or(AbciAppInternalError::MissingTransitions { round: id })?;

            queue.extend(transitions.values().copied());
        }

        Ok(visited)
    }
}
