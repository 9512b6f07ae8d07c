//! A single instance of a round class, collecting payloads until it concludes.

use derive_where::derive_where;
use tracing::{debug, trace};

use roundfsm_core_types::{
    Ballot, ConsensusParams, Context, DataError, Event, Payload, PayloadBody, PayloadKind,
    SynchronizedData,
};

use crate::{Collection, Family, Outcome, Quorum, RoundDef, TransactionNotValid};

/// The decision of a round: the data handed to its successor, and the event to route.
pub type RoundResult<Ctx> = (SynchronizedData<Ctx>, Event<Ctx>);

/// How a valid payload relates to the collection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The sender has not contributed yet.
    New,

    /// The exact same payload is already collected.
    Duplicate,
}

/// An instance of a round.
///
/// Created by the application when selected as the successor of the previous round,
/// it lives until [`Round::end_block`] returns a decision and is never reused.
#[derive_where(Clone, Debug)]
pub struct Round<Ctx: Context> {
    def: RoundDef<Ctx>,
    index: u64,
    data: SynchronizedData<Ctx>,
    params: ConsensusParams,
    collection: Collection<Ctx>,
    block_confirmations: u64,
}

impl<Ctx: Context> Round<Ctx> {
    /// Instantiate the given round class.
    ///
    /// `index` is the number of rounds that concluded before this one.
    pub fn new(
        def: RoundDef<Ctx>,
        index: u64,
        data: SynchronizedData<Ctx>,
        params: ConsensusParams,
    ) -> Self {
        Self {
            def,
            index,
            data,
            params,
            collection: Collection::new(),
            block_confirmations: 0,
        }
    }

    /// Resume an instance from the payloads it had collected and the blocks it had
    /// counted, eg. after a restart. Payloads are checked again as they are replayed.
    pub fn resume(
        def: RoundDef<Ctx>,
        index: u64,
        data: SynchronizedData<Ctx>,
        params: ConsensusParams,
        collected: impl IntoIterator<Item = Payload<Ctx>>,
        block_confirmations: u64,
    ) -> Result<Self, TransactionNotValid<Ctx>> {
        let mut round = Self::new(def, index, data, params);

        for payload in collected {
            round.process_payload(payload)?;
        }

        round.block_confirmations = block_confirmations;
        Ok(round)
    }

    pub fn id(&self) -> Ctx::RoundId {
        self.def.id
    }

    pub fn def(&self) -> &RoundDef<Ctx> {
        &self.def
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    /// The number of rounds that concluded before this one.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The kind of payloads this round accepts.
    pub fn payload_kind(&self) -> Option<PayloadKind<Ctx>> {
        self.def.payload_kind
    }

    /// The snapshot this round started from.
    pub fn synchronized_data(&self) -> &SynchronizedData<Ctx> {
        &self.data
    }

    pub fn collection(&self) -> &Collection<Ctx> {
        &self.collection
    }

    pub fn block_confirmations(&self) -> u64 {
        self.block_confirmations
    }

    pub fn is_final(&self) -> bool {
        self.def.is_final()
    }

    /// The number of participants the quorum is computed against.
    ///
    /// While no participants are declared, eg. at startup, this is the
    /// maximum number of participants.
    pub fn nb_participants(&self) -> usize {
        match self.data.nb_participants() {
            0 => self.params.max_participants,
            n => n,
        }
    }

    /// Check a payload against the round, without modifying it.
    pub fn check_payload(&self, payload: &Payload<Ctx>) -> Result<(), TransactionNotValid<Ctx>> {
        self.admit(payload).map(|_| ())
    }

    /// Check a payload and add it to the collection.
    ///
    /// Resubmitting the exact same payload is a no-op.
    pub fn process_payload(&mut self, payload: Payload<Ctx>) -> Result<(), TransactionNotValid<Ctx>> {
        match self.admit(&payload)? {
            Admission::Duplicate => {
                trace!(round = %self.id(), sender = %payload.sender, "Ignoring duplicate payload");
            }
            Admission::New => {
                debug!(
                    round = %self.id(),
                    sender = %payload.sender,
                    collected = self.collection.len() + 1,
                    "Payload added to the collection"
                );

                self.collection.insert(payload);
            }
        }

        Ok(())
    }

    /// Validate a payload and tell whether it is new to the collection.
    pub fn admit(&self, payload: &Payload<Ctx>) -> Result<Admission, TransactionNotValid<Ctx>> {
        let round = self.id();

        let Some(expected) = self.def.payload_kind.filter(|_| self.def.quorum.accepts_payloads())
        else {
            return Err(TransactionNotValid::NoPayloadsAllowed { round });
        };

        let actual = payload.kind();
        if actual != expected {
            return Err(TransactionNotValid::WrongPayloadKind {
                round,
                expected,
                actual,
            });
        }

        if let Some(actual) = payload.round_index {
            if actual != self.index {
                return Err(TransactionNotValid::StaleRound {
                    round,
                    expected: self.index,
                    actual,
                });
            }
        }

        if self.data.nb_participants() > 0 && !self.data.is_participant(&payload.sender) {
            return Err(TransactionNotValid::NotAParticipant {
                round,
                sender: payload.sender.clone(),
            });
        }

        if let Quorum::OnlyKeeperSends { keeper_field, .. } = &self.def.quorum {
            if !self.is_keeper(keeper_field, &payload.sender) {
                return Err(TransactionNotValid::NotKeeper {
                    round,
                    sender: payload.sender.clone(),
                });
            }
        }

        match self.collection.get(&payload.sender) {
            None => Ok(Admission::New),
            Some(existing) if existing == payload => Ok(Admission::Duplicate),
            Some(_) if self.def.quorum.family() == Family::Keeper => {
                Err(TransactionNotValid::KeeperAlreadySent {
                    round,
                    sender: payload.sender.clone(),
                })
            }
            Some(_) => Err(TransactionNotValid::ConflictingPayload {
                round,
                sender: payload.sender.clone(),
            }),
        }
    }

    fn is_keeper(&self, keeper_field: &str, sender: &Ctx::Address) -> bool {
        self.data
            .get_text(keeper_field)
            .is_ok_and(|keeper| keeper == sender.to_string())
    }

    /// The body sent by the most participants, with its count.
    pub fn most_voted_payload(&self) -> Option<(&Ctx::Body, usize)> {
        self.collection.most_voted()
    }

    /// Whether a quorum of participants sent the same body.
    pub fn threshold_reached(&self) -> bool {
        self.most_voted_payload()
            .is_some_and(|(_, count)| self.is_quorum(count))
    }

    /// Whether enough participants contributed for the round to conclude.
    pub fn collection_threshold_reached(&self) -> bool {
        match &self.def.quorum {
            Quorum::CollectSameUntilThreshold { .. } => self.threshold_reached(),
            Quorum::CollectDifferentUntilAll => {
                self.nb_participants() > 0 && self.collection.len() >= self.nb_participants()
            }
            Quorum::CollectDifferentUntilThreshold { .. } => self.is_quorum(self.collection.len()),
            Quorum::OnlyKeeperSends { .. } => !self.collection.is_empty(),
            Quorum::Voting { .. } => self
                .collection
                .ballots()
                .into_values()
                .any(|count| self.is_quorum(count)),
            Quorum::Degenerate => false,
        }
    }

    /// Whether the payloads collected so far can still reach a quorum.
    pub fn is_majority_possible(&self) -> bool {
        let n = self.nb_participants();
        let params = &self.params.threshold_params;

        match &self.def.quorum {
            Quorum::Voting { .. } => self.collection.is_ballot_majority_possible(n, params),
            _ => self.collection.is_majority_possible(n, params),
        }
    }

    fn is_quorum(&self, count: usize) -> bool {
        self.params
            .threshold_params
            .is_quorum(count, self.nb_participants())
    }

    /// Count a committed block towards the confirmations the round waits for.
    ///
    /// Called once per committed block, before [`Round::end_block`].
    pub fn confirm_block(&mut self) {
        if let Quorum::CollectDifferentUntilThreshold { .. } = self.def.quorum {
            if self.collection_threshold_reached() {
                self.block_confirmations += 1;
            }
        }
    }

    /// Decide whether the round concludes at the end of the current block.
    ///
    /// This is a pure function of the collected payloads, the block confirmations,
    /// and the snapshot the round started from.
    pub fn end_block(&self) -> Result<Option<RoundResult<Ctx>>, DataError> {
        let Some(done_event) = self.def.done_event else {
            return Ok(None);
        };

        let done = Event::App(done_event);

        match &self.def.quorum {
            Quorum::Degenerate => Ok(None),

            Quorum::CollectSameUntilThreshold { none_event } => {
                if let Some((value, count)) = self.most_voted_payload() {
                    if self.is_quorum(count) {
                        if let (true, Some(none_event)) = (value.is_nil(), none_event) {
                            return Ok(Some((self.data.clone(), Event::App(*none_event))));
                        }

                        return self.conclude(Some(value), done).map(Some);
                    }
                }

                if !self.is_majority_possible() {
                    return Ok(Some((self.data.clone(), Event::NoMajority)));
                }

                Ok(None)
            }

            Quorum::CollectDifferentUntilAll => {
                if self.collection_threshold_reached() {
                    self.conclude(None, done).map(Some)
                } else {
                    Ok(None)
                }
            }

            Quorum::CollectDifferentUntilThreshold {
                required_block_confirmations,
            } => {
                if self.collection_threshold_reached()
                    && self.block_confirmations > *required_block_confirmations
                {
                    self.conclude(None, done).map(Some)
                } else {
                    Ok(None)
                }
            }

            Quorum::OnlyKeeperSends { fail_event, .. } => match self.collection.iter().next() {
                None => Ok(None),
                Some(payload) if payload.body.is_nil() => {
                    Ok(Some((self.data.clone(), Event::App(*fail_event))))
                }
                Some(payload) => self.conclude(Some(&payload.body), done).map(Some),
            },

            Quorum::Voting {
                negative_event,
                none_event,
            } => {
                let ballots = self.collection.ballots();
                let reached = |ballot| ballots.get(&ballot).is_some_and(|c| self.is_quorum(*c));

                if reached(Ballot::For) {
                    return self.conclude(None, done).map(Some);
                }

                if reached(Ballot::Against) {
                    return Ok(Some((self.data.clone(), Event::App(*negative_event))));
                }

                if reached(Ballot::Abstain) {
                    return Ok(Some((self.data.clone(), Event::App(*none_event))));
                }

                if !self.is_majority_possible() {
                    return Ok(Some((self.data.clone(), Event::NoMajority)));
                }

                Ok(None)
            }
        }
    }

    fn conclude(
        &self,
        value: Option<&Ctx::Body>,
        event: Event<Ctx>,
    ) -> Result<RoundResult<Ctx>, DataError> {
        let outcome = Outcome {
            value,
            collection: &self.collection,
        };

        let data = (self.def.update)(&self.data, &outcome)?;
        Ok((data, event))
    }
}
