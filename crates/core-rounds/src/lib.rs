//! Rounds of the roundfsm engine.
//!
//! A [`Round`] collects the payloads of the participants until its [`Quorum`]
//! policy lets it conclude, at which point it hands new synchronized data and
//! an event to the application's transition table.

#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unused_import_braces,
    unused_qualifications
)]

extern crate alloc;

mod collection;
mod def;
mod error;
mod quorum;
mod round;

pub use collection::Collection;
pub use def::{keep_data, Outcome, RoundDef, UpdateFn};
pub use error::TransactionNotValid;
pub use quorum::{Family, Quorum};
pub use round::{Admission, Round, RoundResult};
