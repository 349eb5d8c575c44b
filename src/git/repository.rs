use crate::error::{Result, SyncError};
use crate::git::command::{args, GitCommand};
use crate::git::{CommitInfo, Vcs};
use git2::{Oid, Repository as Git2Repo, Sort, Status, StatusOptions};
use std::collections::HashMap;
use std::path::Path;

/// Real repository: `git2` answers queries, the system `git` binary performs
/// porcelain mutations such as orphan checkouts, pulls and forced pushes.
pub struct GitRepository {
    repo: Git2Repo,
    git: GitCommand,
}

impl GitRepository {
    /// Open or discover a git repository with a working tree
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| SyncError::precondition("Repository has no working tree"))?
            .to_path_buf();

        Ok(GitRepository {
            repo,
            git: GitCommand::new(workdir),
        })
    }

    fn run(&self, args: Vec<String>) -> Result<()> {
        self.git.run(&args).map(|_| ())
    }

    /// Maps each tagged commit to a tag name, peeling annotated tags.
    fn tagged_commits(&self) -> Result<HashMap<Oid, String>> {
        let mut tag_oids = HashMap::new();
        let tags = self.repo.tag_names(None)?;

        for tag_name in tags.iter().flatten() {
            if let Ok(tag_ref) = self.repo.find_reference(&format!("refs/tags/{}", tag_name)) {
                if let Ok(target) = tag_ref.peel(git2::ObjectType::Commit) {
                    tag_oids.insert(target.id(), tag_name.to_string());
                }
            }
        }

        Ok(tag_oids)
    }

    fn tag_commit(&self, tag_name: &str) -> Result<Oid> {
        let reference = self
            .repo
            .find_reference(&format!("refs/tags/{}", tag_name))?;
        Ok(reference.peel(git2::ObjectType::Commit)?.id())
    }

    fn statuses_matching(&self, include_untracked: bool, mask: Status) -> Result<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(include_untracked)
            .include_ignored(false)
            .recurse_untracked_dirs(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses.iter().any(|entry| entry.status().intersects(mask)))
    }
}

impl Vcs for GitRepository {
    fn workdir(&self) -> &Path {
        self.git.workdir()
    }

    fn current_branch(&self) -> Result<String> {
        // Read HEAD symbolically so an unborn orphan branch still reports its name
        let head = self.repo.find_reference("HEAD")?;
        match head.symbolic_target() {
            Some(target) => Ok(target
                .strip_prefix("refs/heads/")
                .unwrap_or(target)
                .to_string()),
            None => Ok("HEAD".to_string()),
        }
    }

    fn checkout(&self, branch: &str, force: bool) -> Result<()> {
        self.run(args::checkout(branch, force))
    }

    fn checkout_orphan(&self, branch: &str, start_point: &str) -> Result<()> {
        self.run(args::checkout_orphan(branch, start_point))
    }

    fn overlay_tree(&self, source: &str) -> Result<()> {
        self.run(args::overlay_tree(source))
    }

    fn delete_branch(&self, branch: &str) -> Result<()> {
        self.run(args::delete_branch(branch))
    }

    fn rename_branch(&self, from: &str, to: &str) -> Result<()> {
        self.run(args::rename_branch(from, to))
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.run(args::pull(remote, branch))
    }

    fn stage(&self, pathspec: &str) -> Result<()> {
        self.run(args::stage(pathspec))
    }

    fn stage_all(&self, excluded: &[String]) -> Result<()> {
        self.run(args::stage_all(excluded))
    }

    fn untrack(&self, pathspec: &str) -> Result<()> {
        self.run(args::untrack(pathspec))
    }

    fn has_staged_changes(&self) -> Result<bool> {
        self.statuses_matching(
            false,
            Status::INDEX_NEW
                | Status::INDEX_MODIFIED
                | Status::INDEX_DELETED
                | Status::INDEX_RENAMED
                | Status::INDEX_TYPECHANGE,
        )
    }

    fn is_dirty(&self) -> Result<bool> {
        self.statuses_matching(true, Status::all().difference(Status::IGNORED))
    }

    fn commit(&self, message: &str, allow_empty: bool) -> Result<()> {
        self.run(args::commit(message, allow_empty))
    }

    fn push(&self, remote: &str, branch: &str, force: bool) -> Result<()> {
        self.run(args::push(remote, branch, force))
    }

    fn create_annotated_tag(&self, tag: &str, message: &str) -> Result<()> {
        self.run(args::annotated_tag(tag, message))
    }

    fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        self.run(args::push_tag(remote, tag))
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        let found = self
            .repo
            .find_remote(remote)
            .map_err(|e| SyncError::config(format!("Remote '{}' not found: {}", remote, e)))?;
        found
            .url()
            .map(|url| url.to_string())
            .ok_or_else(|| SyncError::config(format!("Remote '{}' has no URL", remote)))
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        let tag_oids = self.tagged_commits()?;
        if tag_oids.is_empty() {
            return Ok(None);
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        for oid in revwalk {
            let oid = oid?;
            if let Some(tag_name) = tag_oids.get(&oid) {
                return Ok(Some(tag_name.clone()));
            }
        }

        Ok(None)
    }

    fn commits_since(&self, since_tag: Option<&str>, limit: usize) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let cap = match since_tag {
            Some(tag) => {
                revwalk.hide(self.tag_commit(tag)?)?;
                usize::MAX
            }
            None => limit,
        };

        let mut commits = Vec::new();
        for oid in revwalk.take(cap) {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            commits.push(CommitInfo {
                hash: oid.to_string(),
                summary: commit.summary().unwrap_or("(empty message)").to_string(),
            });
        }

        Ok(commits)
    }

    fn archive(&self, treeish: &str, output: &Path) -> Result<()> {
        self.run(args::archive(treeish, output))
    }

    fn bundle(&self, output: &Path) -> Result<()> {
        self.run(args::bundle(output))
    }
}
