//! Test context and demo application for roundfsm.
//!
//! Provides a concrete [`Context`](roundfsm_core_types::Context), the rounds of a
//! small keeper-based application, the behaviour of its agents, and an in-process
//! network running several agents on a shared chain.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unused_import_braces,
    unused_qualifications
)]

mod address;
mod context;
mod hash;
mod payloads;

pub mod behaviour;
pub mod rounds;

pub use address::Address;
pub use context::TestContext;
pub use hash::Hash;
pub use payloads::{Body, PayloadKind};
pub use rounds::{AppEvent, AppTimeouts, RoundName};

use roundfsm_core_types::{Payload, SynchronizedData};

/// The addresses `agent-0` to `agent-{n-1}`.
pub fn addresses(n: usize) -> Vec<Address> {
    (0..n).map(|i| Address::new(format!("agent-{i}"))).collect()
}

/// A payload of `sender`, not bound to any round instance.
pub fn payload(sender: &str, body: Body) -> Payload<TestContext> {
    Payload::new(Address::new(sender), body)
}

/// A snapshot of the first period with the given participants.
pub fn data_with(participants: &[&str]) -> SynchronizedData<TestContext> {
    SynchronizedData::new(participants.iter().copied().map(Address::new))
}
