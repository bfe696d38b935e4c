#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Coordination rules for the Godfield agent: scene model, phase
//! debouncing, the act-now gate, deferred replay and polling cadence.
//!
//! Nothing in this crate reads a clock. Every time-dependent rule takes the
//! current monotonic time in milliseconds so the async shell decides where
//! time comes from.

pub mod api;
pub mod echo;
pub mod deferred;
pub mod gate;
pub mod model;
pub mod phase;
pub mod polling;
pub mod signature;
pub mod vocabulary;

mod util;

pub use util::{elapsed, new_ulid, Millis};
