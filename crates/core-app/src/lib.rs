//! The transition table of a roundfsm application.
//!
//! An [`AbciApp`] maps every round and event to the round to enter next,
//! and every timeout event to its duration. Tables are checked for
//! completeness when they are built, so that a modeling mistake surfaces
//! at startup rather than in the middle of a period.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unused_import_braces,
    unused_qualifications
)]

extern crate alloc;

mod app;
mod builder;
mod chain;
mod error;

pub use app::{AbciApp, TransitionFunction};
pub use builder::AbciAppBuilder;
pub use error::AbciAppInternalError;
