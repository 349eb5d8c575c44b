use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, SyncError};

/// Runs the system `git` binary against one working tree.
#[derive(Debug, Clone)]
pub struct GitCommand {
    workdir: PathBuf,
}

impl GitCommand {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        GitCommand {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Runs `git <args>` and returns trimmed stdout.
    ///
    /// # Returns
    /// * `Ok(String)` - Standard output of a successful command
    /// * `Err(SyncError::Command)` - Spawn failure or non-zero exit, carrying stderr
    pub fn run(&self, args: &[String]) -> Result<String> {
        let rendered = render(args);
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.workdir)
            .args(["-c", "advice.detachedHead=false"])
            .args(["-c", "core.quotePath=false"])
            .args(args)
            .output()
            .map_err(|e| SyncError::command(&rendered, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(SyncError::command(rendered, detail));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Renders arguments as the command line shown in logs, e.g. `git push origin master`.
pub fn render(args: &[String]) -> String {
    format!("git {}", args.join(" "))
}

/// Argument lists for every mutating git command a sync run issues.
pub mod args {
    use std::path::Path;

    fn owned(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    pub fn checkout(branch: &str, force: bool) -> Vec<String> {
        let mut args = owned(&["checkout", branch]);
        if force {
            args.push("--force".to_string());
        }
        args
    }

    pub fn checkout_orphan(branch: &str, start_point: &str) -> Vec<String> {
        owned(&["checkout", "--orphan", branch, start_point])
    }

    pub fn overlay_tree(source: &str) -> Vec<String> {
        owned(&["checkout", source, "--", "."])
    }

    pub fn delete_branch(branch: &str) -> Vec<String> {
        owned(&["branch", "-D", branch])
    }

    pub fn rename_branch(from: &str, to: &str) -> Vec<String> {
        owned(&["branch", "-M", from, to])
    }

    pub fn pull(remote: &str, branch: &str) -> Vec<String> {
        owned(&["pull", "--no-edit", remote, branch])
    }

    pub fn stage(pathspec: &str) -> Vec<String> {
        owned(&["add", pathspec])
    }

    /// `add -A`, or `add -A -- . :(exclude)<path>...` when paths are excluded
    pub fn stage_all(excluded: &[String]) -> Vec<String> {
        let mut args = owned(&["add", "-A"]);
        if !excluded.is_empty() {
            args.push("--".to_string());
            args.push(".".to_string());
            args.extend(excluded.iter().map(|path| format!(":(exclude){}", path)));
        }
        args
    }

    pub fn untrack(pathspec: &str) -> Vec<String> {
        owned(&["rm", "-r", "--cached", "--ignore-unmatch", "--quiet", "--", pathspec])
    }

    pub fn commit(message: &str, allow_empty: bool) -> Vec<String> {
        let mut args = owned(&["commit", "-m", message]);
        if allow_empty {
            args.push("--allow-empty".to_string());
        }
        args
    }

    pub fn push(remote: &str, branch: &str, force: bool) -> Vec<String> {
        let mut args = owned(&["push", remote, branch]);
        if force {
            args.push("--force".to_string());
        }
        args
    }

    pub fn annotated_tag(tag: &str, message: &str) -> Vec<String> {
        owned(&["tag", "-a", tag, "-m", message, "-f"])
    }

    pub fn push_tag(remote: &str, tag: &str) -> Vec<String> {
        let refspec = format!("refs/tags/{}", tag);
        owned(&["push", remote, refspec.as_str(), "--force"])
    }

    pub fn archive(treeish: &str, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        owned(&["archive", "--format=zip", "-o", output.as_ref(), treeish])
    }

    pub fn bundle(output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        owned(&["bundle", "create", output.as_ref(), "--all"])
    }
}
