//! Core types for the roundfsm round engine: participants' payloads,
//! the synchronized data they agree upon, and the quorum thresholds.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unused_import_braces,
    unused_qualifications
)]

extern crate alloc;

mod context;
mod event;
mod params;
mod payload;
mod synchronized_data;
mod threshold;
mod time;
mod value;

pub use context::{Context, PayloadKind};
pub use event::Event;
pub use params::ConsensusParams;
pub use payload::{Ballot, Payload, PayloadBody};
pub use synchronized_data::{DataError, SynchronizedData, Update};
pub use threshold::{ThresholdParam, ThresholdParams, Weight};
pub use time::Timestamp;
pub use value::Value;
