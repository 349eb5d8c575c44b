use crate::error::{Result, SyncError};
use crate::hosted::{HostedReleases, ReleaseRequest};
use std::process::Command;

/// Hosted releases through the GitHub CLI
pub struct GhCli {
    program: String,
}

impl GhCli {
    /// `program` is the CLI to invoke, normally `gh`
    pub fn new(program: impl Into<String>) -> Self {
        GhCli {
            program: program.into(),
        }
    }

    /// Runs the CLI with `args`; any non-zero exit code is a failure.
    fn run(&self, args: &[String]) -> Result<()> {
        let rendered = format!("{} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| {
                SyncError::command(&rendered, format!("Failed to execute {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SyncError::command(
                rendered,
                format!(
                    "exit code {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            ));
        }

        Ok(())
    }
}

/// `gh release delete <tag> --repo <repo> -y`
pub fn delete_args(repo: &str, tag: &str) -> Vec<String> {
    vec![
        "release".to_string(),
        "delete".to_string(),
        tag.to_string(),
        "--repo".to_string(),
        repo.to_string(),
        "-y".to_string(),
    ]
}

/// `gh release create <tag> [assets...] --repo <repo> --title <title> --notes <notes>`
pub fn create_args(request: &ReleaseRequest) -> Vec<String> {
    let mut args = vec![
        "release".to_string(),
        "create".to_string(),
        request.tag.clone(),
    ];
    args.extend(
        request
            .assets
            .iter()
            .map(|asset| asset.to_string_lossy().into_owned()),
    );
    args.extend([
        "--repo".to_string(),
        request.repo.clone(),
        "--title".to_string(),
        request.title.clone(),
        "--notes".to_string(),
        request.notes.clone(),
    ]);
    args
}

impl HostedReleases for GhCli {
    fn program(&self) -> &str {
        &self.program
    }

    fn delete_release(&self, repo: &str, tag: &str) -> Result<()> {
        self.run(&delete_args(repo, tag))
    }

    fn create_release(&self, request: &ReleaseRequest) -> Result<()> {
        self.run(&create_args(request))
    }
}
