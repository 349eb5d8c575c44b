use crate::error::{Result, SyncError};
use crate::git::command::{args, render};
use crate::git::{CommitInfo, Vcs};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Mock repository for testing without running git
///
/// Every mutation is recorded as the command line the real repository would
/// run (`git checkout dev --force`, ...). Branch switches update the mock's
/// current branch so precondition checks behave as they would on disk.
pub struct MockVcs {
    workdir: PathBuf,
    current: RefCell<String>,
    calls: RefCell<Vec<String>>,
    failing: Vec<String>,
    sticky: HashSet<String>,
    staged: Cell<bool>,
    dirty: Cell<bool>,
    remotes: HashMap<String, String>,
    latest_tag: Option<String>,
    commits: Vec<CommitInfo>,
    archive_bytes: usize,
}

impl MockVcs {
    /// Create a mock rooted at `workdir` with `branch` checked out
    pub fn new(workdir: impl Into<PathBuf>, branch: &str) -> Self {
        MockVcs {
            workdir: workdir.into(),
            current: RefCell::new(branch.to_string()),
            calls: RefCell::new(Vec::new()),
            failing: Vec::new(),
            sticky: HashSet::new(),
            staged: Cell::new(false),
            dirty: Cell::new(false),
            remotes: HashMap::new(),
            latest_tag: None,
            commits: Vec::new(),
            archive_bytes: 0,
        }
    }

    /// Make every command whose rendered line starts with `prefix` fail
    pub fn fail_on(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    /// Checkouts of `branch` report success without switching to it
    pub fn stuck_on_checkout(mut self, branch: &str) -> Self {
        self.sticky.insert(branch.to_string());
        self
    }

    /// Whether `git add` leaves staged changes behind
    pub fn with_staged_changes(self, staged: bool) -> Self {
        self.staged.set(staged);
        self
    }

    /// Whether the tree reports uncommitted changes
    pub fn with_dirty_tree(self, dirty: bool) -> Self {
        self.dirty.set(dirty);
        self
    }

    pub fn with_remote(mut self, name: &str, url: &str) -> Self {
        self.remotes.insert(name.to_string(), url.to_string());
        self
    }

    pub fn with_latest_tag(mut self, tag: &str) -> Self {
        self.latest_tag = Some(tag.to_string());
        self
    }

    pub fn with_commits(mut self, commits: Vec<CommitInfo>) -> Self {
        self.commits = commits;
        self
    }

    /// Size of the file written by `archive` and `bundle`
    pub fn with_archive_bytes(mut self, bytes: usize) -> Self {
        self.archive_bytes = bytes;
        self
    }

    /// Command lines recorded so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Branch the mock currently has checked out
    pub fn current(&self) -> String {
        self.current.borrow().clone()
    }

    fn record(&self, args: Vec<String>) -> Result<()> {
        let line = render(&args);
        self.calls.borrow_mut().push(line.clone());
        let command = line.trim_start_matches("git ");
        if self.failing.iter().any(|prefix| command.starts_with(prefix.as_str())) {
            return Err(SyncError::command(line, "mock failure"));
        }
        Ok(())
    }

    fn switch_to(&self, branch: &str) {
        if !self.sticky.contains(branch) {
            *self.current.borrow_mut() = branch.to_string();
        }
    }

    fn write_output(&self, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, vec![0u8; self.archive_bytes])?;
        Ok(())
    }
}

impl Vcs for MockVcs {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.current())
    }

    fn checkout(&self, branch: &str, force: bool) -> Result<()> {
        self.record(args::checkout(branch, force))?;
        self.switch_to(branch);
        Ok(())
    }

    fn checkout_orphan(&self, branch: &str, start_point: &str) -> Result<()> {
        self.record(args::checkout_orphan(branch, start_point))?;
        self.switch_to(branch);
        Ok(())
    }

    fn overlay_tree(&self, source: &str) -> Result<()> {
        self.record(args::overlay_tree(source))
    }

    fn delete_branch(&self, branch: &str) -> Result<()> {
        self.record(args::delete_branch(branch))
    }

    fn rename_branch(&self, from: &str, to: &str) -> Result<()> {
        self.record(args::rename_branch(from, to))?;
        if self.current() == from {
            self.switch_to(to);
        }
        Ok(())
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.record(args::pull(remote, branch))
    }

    fn stage(&self, pathspec: &str) -> Result<()> {
        self.record(args::stage(pathspec))
    }

    fn stage_all(&self, excluded: &[String]) -> Result<()> {
        self.record(args::stage_all(excluded))
    }

    fn untrack(&self, pathspec: &str) -> Result<()> {
        self.record(args::untrack(pathspec))
    }

    fn has_staged_changes(&self) -> Result<bool> {
        Ok(self.staged.get())
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self.dirty.get())
    }

    fn commit(&self, message: &str, allow_empty: bool) -> Result<()> {
        self.record(args::commit(message, allow_empty))?;
        self.staged.set(false);
        self.dirty.set(false);
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str, force: bool) -> Result<()> {
        self.record(args::push(remote, branch, force))
    }

    fn create_annotated_tag(&self, tag: &str, message: &str) -> Result<()> {
        self.record(args::annotated_tag(tag, message))
    }

    fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        self.record(args::push_tag(remote, tag))
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        self.remotes
            .get(remote)
            .cloned()
            .ok_or_else(|| SyncError::config(format!("Remote '{}' not found", remote)))
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        Ok(self.latest_tag.clone())
    }

    fn commits_since(&self, since_tag: Option<&str>, limit: usize) -> Result<Vec<CommitInfo>> {
        let cap = if since_tag.is_some() { usize::MAX } else { limit };
        Ok(self.commits.iter().take(cap).cloned().collect())
    }

    fn archive(&self, treeish: &str, output: &Path) -> Result<()> {
        self.record(args::archive(treeish, output))?;
        self.write_output(output)
    }

    fn bundle(&self, output: &Path) -> Result<()> {
        self.record(args::bundle(output))?;
        self.write_output(output)
    }
}
