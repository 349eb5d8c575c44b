//! Branch synchronization: development sync and the release state machine.
//!
//! A release walks a fixed sequence of [SyncState]s. Once it starts mutating
//! the release side of the repository it holds a [DevBranchGuard], which
//! force-checks-out the development branch again on every exit path.

pub mod dev;
pub mod release;

pub use dev::{sync_dev, DevSyncOutcome};
pub use release::ReleaseSynchronizer;

use crate::advisory::Advisory;
use crate::error::Result;
use crate::git::Vcs;
use crate::logbook::RunLog;

/// Shape of release-branch history a release produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Keep release history: pull, overlay development content, commit on top
    Incremental,
    /// Replace release history with a single orphan commit, then force-push
    Flattened,
}

impl ReleaseMode {
    pub fn label(&self) -> &'static str {
        match self {
            ReleaseMode::Incremental => "UPDATE (INCREMENTAL)",
            ReleaseMode::Flattened => "DEPLOY (FLATTENED)",
        }
    }

    /// Whether publishing the release branch rewrites remote history
    pub fn force_push(&self) -> bool {
        matches!(self, ReleaseMode::Flattened)
    }
}

/// Steps of a release, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    OnDev,
    PreparingReleaseBase,
    Filtering,
    Stamping,
    Committing,
    Publishing,
    Tagging,
    PublishingHostedRelease,
    ReturnedToDev,
}

impl SyncState {
    /// The step that follows this one for `mode`; `None` once back on dev
    pub fn next(self, mode: ReleaseMode) -> Option<SyncState> {
        match self {
            SyncState::OnDev => Some(SyncState::PreparingReleaseBase),
            SyncState::PreparingReleaseBase => Some(SyncState::Filtering),
            SyncState::Filtering => Some(SyncState::Stamping),
            SyncState::Stamping => Some(SyncState::Committing),
            SyncState::Committing => Some(SyncState::Publishing),
            SyncState::Publishing => Some(SyncState::Tagging),
            SyncState::Tagging => match mode {
                ReleaseMode::Flattened => Some(SyncState::PublishingHostedRelease),
                ReleaseMode::Incremental => Some(SyncState::ReturnedToDev),
            },
            SyncState::PublishingHostedRelease => Some(SyncState::ReturnedToDev),
            SyncState::ReturnedToDev => None,
        }
    }
}

/// What a finished release did
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub mode: ReleaseMode,
    pub tag: String,
    /// Steps entered, in order
    pub states: Vec<SyncState>,
    /// Top-level entries removed by the whitelist purge
    pub purged: Vec<String>,
    pub pushed: bool,
    pub tagged: bool,
    /// Tag of the hosted release that was created
    pub hosted_release: Option<String>,
    pub returned_to_dev: bool,
    pub advisories: Vec<Advisory>,
}

impl SyncReport {
    pub fn new(mode: ReleaseMode, tag: impl Into<String>) -> Self {
        SyncReport {
            mode,
            tag: tag.into(),
            states: Vec::new(),
            purged: Vec::new(),
            pushed: false,
            tagged: false,
            hosted_release: None,
            returned_to_dev: false,
            advisories: Vec::new(),
        }
    }
}

/// Holds the run on the release side of the repository.
///
/// [DevBranchGuard::release] returns to the development branch and reports
/// failure; dropping an unreleased guard (an error unwound past it) returns
/// to the development branch and logs any failure instead.
pub struct DevBranchGuard<'a, V: Vcs> {
    vcs: &'a V,
    dev_branch: &'a str,
    log: &'a RunLog,
    released: bool,
}

impl<'a, V: Vcs> DevBranchGuard<'a, V> {
    pub fn acquire(vcs: &'a V, dev_branch: &'a str, log: &'a RunLog) -> Self {
        DevBranchGuard {
            vcs,
            dev_branch,
            log,
            released: false,
        }
    }

    /// Force-checks-out the development branch.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.return_to_dev()
    }

    fn return_to_dev(&self) -> Result<()> {
        self.log
            .info(&format!("Returning to '{}' branch", self.dev_branch));
        self.vcs.checkout(self.dev_branch, true)
    }
}

impl<V: Vcs> Drop for DevBranchGuard<'_, V> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.return_to_dev() {
            self.log.error(&format!(
                "Could not return to '{}' after a failed run: {}",
                self.dev_branch, e
            ));
        }
    }
}
