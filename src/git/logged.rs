use crate::error::Result;
use crate::git::command::{args, render};
use crate::git::{CommitInfo, Vcs};
use crate::logbook::RunLog;
use std::path::Path;

/// Echoes every mutating command to the run log before it runs, and its
/// error text when it fails. Queries pass straight through.
pub struct LoggedVcs<'a, V: Vcs> {
    inner: &'a V,
    log: &'a RunLog,
}

impl<'a, V: Vcs> LoggedVcs<'a, V> {
    pub fn new(inner: &'a V, log: &'a RunLog) -> Self {
        LoggedVcs { inner, log }
    }

    fn traced(&self, args: Vec<String>, op: impl FnOnce() -> Result<()>) -> Result<()> {
        self.log.debug(&format!("EXECUTING: {}", render(&args)));
        op().map_err(|e| {
            self.log.error(&format!("COMMAND FAILED: {}", e));
            e
        })
    }
}

impl<V: Vcs> Vcs for LoggedVcs<'_, V> {
    fn workdir(&self) -> &Path {
        self.inner.workdir()
    }

    fn current_branch(&self) -> Result<String> {
        self.inner.current_branch()
    }

    fn checkout(&self, branch: &str, force: bool) -> Result<()> {
        self.traced(args::checkout(branch, force), || {
            self.inner.checkout(branch, force)
        })
    }

    fn checkout_orphan(&self, branch: &str, start_point: &str) -> Result<()> {
        self.traced(args::checkout_orphan(branch, start_point), || {
            self.inner.checkout_orphan(branch, start_point)
        })
    }

    fn overlay_tree(&self, source: &str) -> Result<()> {
        self.traced(args::overlay_tree(source), || self.inner.overlay_tree(source))
    }

    fn delete_branch(&self, branch: &str) -> Result<()> {
        self.traced(args::delete_branch(branch), || {
            self.inner.delete_branch(branch)
        })
    }

    fn rename_branch(&self, from: &str, to: &str) -> Result<()> {
        self.traced(args::rename_branch(from, to), || {
            self.inner.rename_branch(from, to)
        })
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.traced(args::pull(remote, branch), || self.inner.pull(remote, branch))
    }

    fn stage(&self, pathspec: &str) -> Result<()> {
        self.traced(args::stage(pathspec), || self.inner.stage(pathspec))
    }

    fn stage_all(&self, excluded: &[String]) -> Result<()> {
        self.traced(args::stage_all(excluded), || self.inner.stage_all(excluded))
    }

    fn untrack(&self, pathspec: &str) -> Result<()> {
        self.traced(args::untrack(pathspec), || self.inner.untrack(pathspec))
    }

    fn has_staged_changes(&self) -> Result<bool> {
        self.inner.has_staged_changes()
    }

    fn is_dirty(&self) -> Result<bool> {
        self.inner.is_dirty()
    }

    fn commit(&self, message: &str, allow_empty: bool) -> Result<()> {
        self.traced(args::commit(message, allow_empty), || {
            self.inner.commit(message, allow_empty)
        })
    }

    fn push(&self, remote: &str, branch: &str, force: bool) -> Result<()> {
        self.traced(args::push(remote, branch, force), || {
            self.inner.push(remote, branch, force)
        })
    }

    fn create_annotated_tag(&self, tag: &str, message: &str) -> Result<()> {
        self.traced(args::annotated_tag(tag, message), || {
            self.inner.create_annotated_tag(tag, message)
        })
    }

    fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        self.traced(args::push_tag(remote, tag), || {
            self.inner.push_tag(remote, tag)
        })
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        self.inner.remote_url(remote)
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        self.inner.latest_tag()
    }

    fn commits_since(&self, since_tag: Option<&str>, limit: usize) -> Result<Vec<CommitInfo>> {
        self.inner.commits_since(since_tag, limit)
    }

    fn archive(&self, treeish: &str, output: &Path) -> Result<()> {
        self.traced(args::archive(treeish, output), || {
            self.inner.archive(treeish, output)
        })
    }

    fn bundle(&self, output: &Path) -> Result<()> {
        self.traced(args::bundle(output), || self.inner.bundle(output))
    }
}
