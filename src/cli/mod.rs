//! Command-line orchestration, independent of argument parsing.

pub mod orchestration;

pub use orchestration::{dispatch, run, RunMode, RunOutcome, SyncArgs};
