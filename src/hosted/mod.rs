//! Hosted release publishing
//!
//! A hosted release is a tagged, named object on the hosting platform with
//! notes and optional binary attachments. The real implementation drives the
//! `gh` CLI; [mock::MockHosted] records calls for tests.

pub mod gh;
pub mod logged;
pub mod mock;

pub use gh::GhCli;
pub use logged::LoggedHosted;
pub use mock::MockHosted;

use crate::error::{Result, SyncError};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Everything needed to create one hosted release
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseRequest {
    /// Hosted repository identifier, `owner/name`
    pub repo: String,
    /// Tag the release is attached to
    pub tag: String,
    pub title: String,
    pub notes: String,
    /// Files uploaded as release assets
    pub assets: Vec<PathBuf>,
}

/// Create/delete operations against a hosted-release endpoint
pub trait HostedReleases {
    /// Name of the CLI the calls go through, for log output
    fn program(&self) -> &str;

    /// Deletes the release for `tag`; callers treat failure as advisory
    fn delete_release(&self, repo: &str, tag: &str) -> Result<()>;

    /// Creates a release, uploading its assets
    fn create_release(&self, request: &ReleaseRequest) -> Result<()>;
}

/// Derives `owner/name` from a GitHub remote URL.
///
/// Accepts `https://github.com/owner/name(.git)` and
/// `git@github.com:owner/name(.git)` forms.
pub fn repository_slug(remote_url: &str) -> Result<String> {
    let re = Regex::new(r"github\.com[:/]+([^/\s]+/[^/\s]+?)(?:\.git)?/?$")
        .map_err(|e| SyncError::release(format!("Remote URL pattern: {}", e)))?;
    re.captures(remote_url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            SyncError::release(format!(
                "Remote URL '{}' does not point to a hosted-release capable host",
                remote_url
            ))
        })
}

/// Existing files among `candidates`, and the ones that are missing.
pub fn split_assets(candidates: &[PathBuf]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    candidates
        .iter()
        .cloned()
        .partition(|path| Path::new(path).is_file())
}
