//! For tallying the payloads collected by a single round

use alloc::collections::BTreeMap;

use derive_where::derive_where;

use roundfsm_core_types::{Ballot, Context, Payload, PayloadBody, ThresholdParams};

/// The payloads collected by a round, at most one per sender.
#[derive_where(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collection<Ctx: Context> {
    payloads: BTreeMap<Ctx::Address, Payload<Ctx>>,
}

impl<Ctx: Context> Collection<Ctx> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// The payload sent by the given participant, if any.
    pub fn get(&self, sender: &Ctx::Address) -> Option<&Payload<Ctx>> {
        self.payloads.get(sender)
    }

    pub fn contains(&self, sender: &Ctx::Address) -> bool {
        self.payloads.contains_key(sender)
    }

    /// The payloads, ordered by sender.
    pub fn iter(&self) -> impl Iterator<Item = &Payload<Ctx>> {
        self.payloads.values()
    }

    /// The senders, in ascending order.
    pub fn senders(&self) -> impl Iterator<Item = &Ctx::Address> {
        self.payloads.keys()
    }

    pub(crate) fn insert(&mut self, payload: Payload<Ctx>) {
        self.payloads.insert(payload.sender.clone(), payload);
    }

    /// Count the payloads per distinct body.
    pub fn tally(&self) -> BTreeMap<&Ctx::Body, usize> {
        let mut counts = BTreeMap::new();
        for payload in self.payloads.values() {
            *counts.entry(&payload.body).or_insert(0) += 1;
        }
        counts
    }

    /// Count the payloads per ballot. Bodies without a ballot count as abstentions.
    pub fn ballots(&self) -> BTreeMap<Ballot, usize> {
        let mut counts = BTreeMap::new();
        for payload in self.payloads.values() {
            let ballot = payload.body.ballot().unwrap_or(Ballot::Abstain);
            *counts.entry(ballot).or_insert(0) += 1;
        }
        counts
    }

    /// The body sent by the most participants, with its count.
    ///
    /// Ties are broken in favour of the smallest body, so the result
    /// does not depend on the order in which payloads were collected.
    pub fn most_voted(&self) -> Option<(&Ctx::Body, usize)> {
        let mut best: Option<(&Ctx::Body, usize)> = None;

        for (body, count) in self.tally() {
            match best {
                Some((_, best_count)) if best_count >= count => {}
                _ => best = Some((body, count)),
            }
        }

        best
    }

    /// Whether the bodies collected so far can still reach a quorum among
    /// `nb_participants`, assuming every remaining participant joins the largest group.
    pub fn is_majority_possible(&self, nb_participants: usize, params: &ThresholdParams) -> bool {
        let largest = self.tally().into_values().max();
        self.can_reach_quorum(largest, nb_participants, params)
    }

    /// Same as [`Collection::is_majority_possible`], grouping the payloads by ballot.
    pub fn is_ballot_majority_possible(
        &self,
        nb_participants: usize,
        params: &ThresholdParams,
    ) -> bool {
        let largest = self.ballots().into_values().max();
        self.can_reach_quorum(largest, nb_participants, params)
    }

    fn can_reach_quorum(
        &self,
        largest: Option<usize>,
        nb_participants: usize,
        params: &ThresholdParams,
    ) -> bool {
        let Some(largest) = largest else {
            return true;
        };

        let remaining = nb_participants.saturating_sub(self.len());
        params.is_quorum(largest + remaining, nb_participants)
    }
}
