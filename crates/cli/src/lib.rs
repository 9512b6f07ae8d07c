//! Command line interface of roundfsm: writes a node configuration and runs
//! a simulated network of agents with it.

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod args;
pub mod cmd;
pub mod logging;
