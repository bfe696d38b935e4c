//! Async shell around `godfield-core`: the scheduler loop, the Action Lock,
//! the decision client and the input executors.

pub mod actions;
pub mod agent;
pub mod bridge;
pub mod client;
pub mod clock;
pub mod config;
pub mod lock;
pub mod scene;
pub mod scheduler;
pub mod ui_queue;

pub use agent::Agent;
pub use config::{AgentConfig, FileConfig, Timings};
