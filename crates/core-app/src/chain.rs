use alloc::collections::BTreeMap;
use core::time::Duration;

use tracing::debug;

use roundfsm_core_rounds::RoundDef;
use roundfsm_core_types::{Context, Event};

use crate::app::TransitionFunction;
use crate::{AbciApp, AbciAppBuilder, AbciAppInternalError};

impl<Ctx: Context> AbciApp<Ctx> {
    /// Compose applications into a single one.
    ///
    /// Each key of `mapping` is a final round of one of the applications, which is
    /// replaced by the round it maps to, usually the initial round of the next
    /// application. The composed application starts at the initial round of the
    /// first one and is checked for completeness like any other.
    pub fn chain(
        apps: impl IntoIterator<Item = AbciApp<Ctx>>,
        mapping: BTreeMap<Ctx::RoundId, Ctx::RoundId>,
    ) -> Result<Self, AbciAppInternalError<Ctx>> {
        let mut apps = apps.into_iter().peekable();

        let initial_round = apps
            .peek()
            .map(|app| app.initial_round)
            .ok_or(AbciAppInternalError::EmptyChain)?;

        let mut rounds: BTreeMap<Ctx::RoundId, RoundDef<Ctx>> = BTreeMap::new();
        let mut transition_function: TransitionFunction<Ctx> = BTreeMap::new();
        let mut event_to_timeout: BTreeMap<Event<Ctx>, Duration> = BTreeMap::new();

        for app in apps {
            for (id, def) in app.rounds {
                if mapping.contains_key(&id) && !def.is_final() {
                    return Err(AbciAppInternalError::ChainedRoundNotFinal { round: id });
                }

                match rounds.get(&id) {
                    // Several applications may exit through the same final round
                    Some(existing) if def.is_final() && existing.is_final() => {}
                    Some(_) => return Err(AbciAppInternalError::DuplicateRound { round: id }),
                    None => {
                        rounds.insert(id, def);
                    }
                }
            }

            for (from, transitions) in app.transition_function {
                let entry = transition_function.entry(from).or_default();

                for (event, to) in transitions {
                    let to = mapping.get(&to).copied().unwrap_or(to);
                    entry.insert(event, to);
                }
            }

            for (event, duration) in app.event_to_timeout {
                match event_to_timeout.get(&event) {
                    Some(&first) if first != duration => {
                        return Err(AbciAppInternalError::ConflictingTimeout {
                            event,
                            first,
                            second: duration,
                        });
                    }
                    _ => {
                        event_to_timeout.insert(event, duration);
                    }
                }
            }
        }

        for from in mapping.keys() {
            if !rounds.contains_key(from) {
                return Err(AbciAppInternalError::UnknownRound { round: *from });
            }

            rounds.remove(from);
            transition_function.remove(from);
        }

        debug!(
            %initial_round,
            rounds = rounds.len(),
            chained = mapping.len(),
            "Chained applications"
        );

        AbciAppBuilder::from_parts(initial_round, rounds, transition_function, event_to_timeout)
            .build()
    }
}
