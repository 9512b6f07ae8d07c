use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use roundfsm_core_types::Event;
use roundfsm_test::behaviour::Behaviour;
use roundfsm_test::network::{Network, NetworkConfig};
use roundfsm_test::rounds::*;

fn period(network: &Network) -> u64 {
    network
        .synchronized_data()
        .map(|data| data.period_count())
        .unwrap_or_default()
}

#[test]
fn honest_agents_register_then_operate() {
    let mut network = Network::new(NetworkConfig::honest(4)).unwrap();
    assert_eq!(network.current_round(), Some(RoundName::Registration));

    let transitions = network.run(1).unwrap();
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].from, RoundName::Registration);
    assert_eq!(transitions[0].to, RoundName::Randomness);
    assert_eq!(network.synchronized_data().unwrap().nb_participants(), 4);

    // One round per block, five rounds per period
    let transitions = network.run(5).unwrap();
    let rounds: Vec<_> = transitions.iter().map(|t| t.to).collect();
    assert_eq!(
        rounds,
        vec![
            RoundName::SelectKeeper,
            RoundName::TransactionSubmission,
            RoundName::ValidateTransaction,
            RoundName::ResetAndPause,
            RoundName::Randomness,
        ]
    );
    assert!(transitions.iter().all(|t| t.event == DONE));
    assert_eq!(period(&network), 1);
}

#[test]
fn runs_are_deterministic() {
    let config = NetworkConfig::new(vec![
        Behaviour::Honest,
        Behaviour::Dissenting,
        Behaviour::Honest,
        Behaviour::Silent,
        Behaviour::Honest,
    ])
    .without_registration()
    .with_timeouts(AppTimeouts {
        round: Duration::from_secs(5),
        reset: Duration::from_secs(5),
    });

    let mut first = Network::new(config.clone()).unwrap();
    let mut second = Network::new(config).unwrap();

    assert_eq!(first.run(200).unwrap(), second.run(200).unwrap());
    assert_eq!(first.synchronized_data(), second.synchronized_data());
}

#[test]
fn a_silent_agent_does_not_stop_the_others() {
    let config = NetworkConfig::new(vec![
        Behaviour::Honest,
        Behaviour::Silent,
        Behaviour::Honest,
        Behaviour::Honest,
    ])
    .without_registration();

    let mut network = Network::new(config).unwrap();
    let transitions = network
        .run_until(1000, |network| period(network) >= 3)
        .unwrap();

    // A silent keeper is replaced once its round times out
    for transition in transitions.iter().filter(|t| t.event.is_timeout()) {
        assert_eq!(transition.from, RoundName::TransactionSubmission);
        assert_eq!(transition.to, RoundName::SelectKeeper);
    }
}

#[test]
fn a_dissenting_agent_is_outvoted() {
    let config = NetworkConfig::new(vec![
        Behaviour::Dissenting,
        Behaviour::Honest,
        Behaviour::Honest,
        Behaviour::Honest,
    ])
    .without_registration();

    let mut network = Network::new(config).unwrap();
    let transitions = network.run(10).unwrap();

    assert!(transitions.iter().all(|t| t.event == DONE));
    assert_eq!(period(&network), 2);
}

#[test]
fn too_many_dissenting_agents_prevent_a_quorum() {
    let config = NetworkConfig::new(vec![
        Behaviour::Dissenting,
        Behaviour::Dissenting,
        Behaviour::Honest,
        Behaviour::Honest,
    ])
    .without_registration();

    let mut network = Network::new(config).unwrap();
    let transitions = network.run(3).unwrap();

    for transition in &transitions {
        assert_eq!(transition.from, RoundName::Randomness);
        assert_eq!(transition.event, Event::NoMajority);
    }
    assert_eq!(transitions.len(), 3);
    assert_eq!(period(&network), 0);
}

#[test]
fn registration_needs_every_agent() {
    let config = NetworkConfig::new(vec![Behaviour::Honest, Behaviour::Honest, Behaviour::Silent])
        .with_timeouts(AppTimeouts {
            round: Duration::from_secs(3),
            reset: Duration::from_secs(3),
        });

    let mut network = Network::new(config).unwrap();
    let transitions = network.run(10).unwrap();

    assert!(!transitions.is_empty());
    for transition in &transitions {
        assert_eq!(transition.from, RoundName::Registration);
        assert_eq!(transition.event, Event::RoundTimeout);
    }
    assert_eq!(network.current_round(), Some(RoundName::Registration));
}

#[test]
fn restarted_agent_catches_up() {
    let dir = TempDir::new().unwrap();
    let config = NetworkConfig::honest(4).with_store_dir(dir.path());

    let mut network = Network::new(config).unwrap();
    network.run(8).unwrap();

    network.restart_agent(2).unwrap();
    assert_eq!(network.agent(2).unwrap().sequencer.height(), 8);

    network.run(10).unwrap();
    network.check_consistency().unwrap();
    assert_eq!(period(&network), 3);
}

#[test]
fn network_resumes_from_its_stores() {
    let dir = TempDir::new().unwrap();
    let config = NetworkConfig::honest(4).with_store_dir(dir.path());

    let data = {
        let mut network = Network::new(config.clone()).unwrap();
        network.run(6).unwrap();
        network.synchronized_data().cloned()
    };

    let mut network = Network::new(config).unwrap();
    assert_eq!(network.height(), 6);
    assert_eq!(network.synchronized_data().cloned(), data);

    let transitions = network.run(5).unwrap();
    assert_eq!(transitions.len(), 5);
    assert_eq!(period(&network), 2);
}

#[test]
fn stores_keep_only_recent_checkpoints() {
    let dir = TempDir::new().unwrap();
    let mut config = NetworkConfig::honest(4).with_store_dir(dir.path());
    config.store_retain = 4;

    let mut network = Network::new(config.clone()).unwrap();
    network.run(30).unwrap();

    for i in 0..4 {
        let store = network.agent(i).unwrap().store.as_ref().unwrap();
        assert_eq!(store.heights().unwrap(), vec![27, 28, 29, 30]);
    }

    drop(network);

    // The retained checkpoints are enough to resume
    let mut network = Network::new(config).unwrap();
    assert_eq!(network.height(), 30);
    network.run(3).unwrap();
    network.check_consistency().unwrap();
}

#[test]
fn restarting_requires_a_store() {
    let mut network = Network::new(NetworkConfig::honest(4)).unwrap();
    network.run(1).unwrap();

    assert!(network.restart_agent(0).is_err());
    assert!(network.restart_agent(9).is_err());
}
