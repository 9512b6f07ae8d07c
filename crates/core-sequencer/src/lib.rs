//! Bridges the block lifecycle of a consensus engine to the rounds of a roundfsm application.
//!
//! The [`RoundSequencer`] owns the current round, feeds it the payloads of every
//! block, asks it at commit time whether it concludes, and routes its decision
//! through the application's transition table. Deadlines are scheduled against
//! block timestamps, so every replica fires them at the same block.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unused_import_braces,
    unused_qualifications
)]

extern crate alloc;

mod block;
mod checkpoint;
mod error;
mod history;
mod mempool;
mod sequencer;

pub mod timeouts;

pub use block::{BlockHeader, BlockPhase, Transition};
pub use checkpoint::Checkpoint;
pub use error::Error;
pub use history::{History, RoundRecord, Version};
pub use mempool::{Mempool, MempoolError};
pub use sequencer::RoundSequencer;
