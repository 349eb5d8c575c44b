pub mod advisory;
pub mod archive;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod hosted;
pub mod logbook;
pub mod sync;
pub mod ui;
pub mod version;
pub mod whitelist;

pub use error::{Result, SyncError};
