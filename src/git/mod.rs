//! Version-control abstraction layer
//!
//! The release state machine never talks to git directly; it drives a [Vcs]
//! implementation. The concrete implementations are:
//!
//! - [repository::GitRepository]: `git2` for read-only queries, the system
//!   `git` binary for porcelain mutations (checkout, pull, commit, push)
//! - [mock::MockVcs]: records the command lines it would have run, for tests
//!
//! Both render their mutations through [command::args], so a test can assert
//! the exact git command sequence a release performs.

pub mod command;
pub mod logged;
pub mod mock;
pub mod repository;

pub use command::GitCommand;
pub use logged::LoggedVcs;
pub use mock::MockVcs;
pub use repository::GitRepository;

use crate::error::Result;
use std::path::Path;

/// Commit information used for changelogs and release notes
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// First line of the commit message
    pub summary: String,
}

impl CommitInfo {
    /// Seven-character abbreviated hash
    pub fn short_hash(&self) -> &str {
        let end = self.hash.len().min(7);
        &self.hash[..end]
    }
}

/// Version-control operations needed by a sync run
///
/// Query methods observe the working tree; every other method mutates it and
/// corresponds to one git command line. A mutation that reports failure
/// returns [crate::error::SyncError::Command]; whether that aborts the run is
/// decided by the caller.
pub trait Vcs {
    /// Root of the working tree
    fn workdir(&self) -> &Path;

    /// Name of the checked-out branch (`HEAD` when detached)
    fn current_branch(&self) -> Result<String>;

    /// `git checkout <branch> [--force]`
    fn checkout(&self, branch: &str, force: bool) -> Result<()>;

    /// `git checkout --orphan <branch> <start_point>`
    ///
    /// Creates a branch with no history whose index and tree are seeded from
    /// `start_point`.
    fn checkout_orphan(&self, branch: &str, start_point: &str) -> Result<()>;

    /// `git checkout <source> -- .`
    ///
    /// Copies the source branch's content into the index and working tree
    /// without changing the current branch or its history.
    fn overlay_tree(&self, source: &str) -> Result<()>;

    /// `git branch -D <branch>`
    fn delete_branch(&self, branch: &str) -> Result<()>;

    /// `git branch -M <from> <to>`
    fn rename_branch(&self, from: &str, to: &str) -> Result<()>;

    /// `git pull --no-edit <remote> <branch>`
    fn pull(&self, remote: &str, branch: &str) -> Result<()>;

    /// `git add <pathspec>`
    fn stage(&self, pathspec: &str) -> Result<()>;

    /// `git add -A`, leaving the `excluded` paths out of the index update
    fn stage_all(&self, excluded: &[String]) -> Result<()>;

    /// `git rm -r --cached --ignore-unmatch -- <pathspec>`
    ///
    /// Drops a path from the index while keeping it on disk.
    fn untrack(&self, pathspec: &str) -> Result<()>;

    /// Whether the index differs from HEAD
    fn has_staged_changes(&self) -> Result<bool>;

    /// Whether the working tree has any change, staged, unstaged or untracked
    fn is_dirty(&self) -> Result<bool>;

    /// `git commit -m <message> [--allow-empty]`
    fn commit(&self, message: &str, allow_empty: bool) -> Result<()>;

    /// `git push <remote> <branch> [--force]`
    fn push(&self, remote: &str, branch: &str, force: bool) -> Result<()>;

    /// `git tag -a <tag> -m <message> -f`, overwriting an existing tag
    fn create_annotated_tag(&self, tag: &str, message: &str) -> Result<()>;

    /// `git push <remote> refs/tags/<tag> --force`
    fn push_tag(&self, remote: &str, tag: &str) -> Result<()>;

    /// Fetch URL of a remote
    fn remote_url(&self, remote: &str) -> Result<String>;

    /// Nearest tag reachable from HEAD, like `git describe --tags --abbrev=0`
    fn latest_tag(&self) -> Result<Option<String>>;

    /// Commits on HEAD newest first: everything after `since_tag`, or the
    /// last `limit` commits when there is no tag
    fn commits_since(&self, since_tag: Option<&str>, limit: usize) -> Result<Vec<CommitInfo>>;

    /// `git archive --format=zip -o <output> <treeish>`
    fn archive(&self, treeish: &str, output: &Path) -> Result<()>;

    /// `git bundle create <output> --all`
    fn bundle(&self, output: &Path) -> Result<()>;
}
