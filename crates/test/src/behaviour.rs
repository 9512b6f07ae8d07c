//! What an agent of the demo application sends in every round.

use roundfsm_core_sequencer::RoundSequencer;
use roundfsm_core_types::{Ballot, Payload, SynchronizedData};

use crate::rounds::{FINAL_TX_HASH, MOST_VOTED_RANDOMNESS};
use crate::{Address, Body, Hash, PayloadKind, TestContext};

/// How an agent behaves.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Behaviour {
    /// Sends what every other honest agent sends
    #[default]
    Honest,

    /// Never sends anything
    Silent,

    /// Sends a value of its own in rounds that collect the same value,
    /// and votes against every transaction
    Dissenting,
}

/// The value of the randomness beacon for the given period.
pub fn beacon(period: u64) -> String {
    Hash::digest([b"beacon".as_slice(), &period.to_be_bytes()]).to_hex()
}

/// The keeper elected from the given randomness, for the round instance with the given index.
///
/// Each attempt at electing a keeper happens in a new round instance,
/// so a keeper that failed to submit is likely replaced.
pub fn select_keeper(
    data: &SynchronizedData<TestContext>,
    round_index: u64,
) -> Option<Address> {
    let participants = data.sorted_participants();
    if participants.is_empty() {
        return None;
    }

    let randomness = data.get_text(MOST_VOTED_RANDOMNESS).unwrap_or_default();
    let seed = Hash::digest([randomness.as_bytes(), &round_index.to_be_bytes()]);
    let position = seed.prefix_u64() % participants.len() as u64;

    participants.into_iter().nth(position as usize)
}

/// The hash of the transaction the keeper submits in the current period.
pub fn tx_hash(data: &SynchronizedData<TestContext>) -> String {
    let randomness = data.get_text(MOST_VOTED_RANDOMNESS).unwrap_or_default();
    Hash::digest([
        b"tx".as_slice(),
        &data.period_count().to_be_bytes(),
        randomness.as_bytes(),
    ])
    .to_hex()
}

/// The payload `agent` sends for the current round of its sequencer, if any.
pub fn propose(
    agent: &Address,
    behaviour: Behaviour,
    sequencer: &RoundSequencer<TestContext>,
) -> Option<Payload<TestContext>> {
    if behaviour == Behaviour::Silent {
        return None;
    }

    let round = sequencer.current_round();
    let data = round.synchronized_data();
    let dissenting = behaviour == Behaviour::Dissenting;

    let body = match round.payload_kind()? {
        PayloadKind::Registration => Body::Registration,

        PayloadKind::Randomness => {
            let period = data.period_count();
            let randomness = if dissenting {
                Hash::digest([agent.as_str().as_bytes(), &period.to_be_bytes()]).to_hex()
            } else {
                beacon(period)
            };

            Body::Randomness { period, randomness }
        }

        PayloadKind::SelectKeeper => {
            let keeper = if dissenting {
                agent.clone()
            } else {
                select_keeper(data, round.index())?
            };

            Body::SelectKeeper { keeper }
        }

        PayloadKind::Transaction => Body::Transaction {
            tx_hash: Some(tx_hash(data)),
        },

        PayloadKind::Validate => {
            let valid = data
                .get_text(FINAL_TX_HASH)
                .is_ok_and(|submitted| submitted == tx_hash(data));

            let ballot = match (valid, dissenting) {
                (true, false) => Ballot::For,
                _ => Ballot::Against,
            };

            Body::Validate { ballot }
        }

        PayloadKind::Reset => Body::Reset {
            period_count: data.period_count() + 1,
        },
    };

    let payload = Payload::new(agent.clone(), body).for_round(round.index());

    // Only the keeper is allowed to send in the submission round
    sequencer.check_payload(&payload).ok()?;

    Some(payload)
}
