use std::fmt;
use std::path::PathBuf;

/// Non-fatal problems met during a run.
///
/// Advisories are logged and collected in the run report; they never abort a
/// release. Anything that must abort is a [`crate::error::SyncError`] instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory {
    /// Readme has no version-labeled line to stamp
    VersionMarkerNotFound { path: PathBuf },
    /// Readme file is missing entirely
    ReadmeMissing { path: PathBuf },
    /// Changelog already has a section for this version
    ChangelogEntryExists { version: String },
    /// A non-whitelisted entry could not be removed
    PurgeFailed { path: PathBuf, reason: String },
    /// Leftover temporary branch could not be deleted (usually it did not exist)
    TempBranchNotDeleted { branch: String },
    /// Annotated tag could not be created
    TagCreateFailed { tag: String, reason: String },
    /// Tag could not be pushed; the release branch is published but untagged
    UntaggedRelease { tag: String, remote: String, reason: String },
    /// Previous hosted release could not be deleted (usually it did not exist)
    HostedReleaseNotDeleted { tag: String, reason: String },
    /// Configured release asset does not exist on disk
    ReleaseAssetMissing { path: PathBuf },
    /// Archive is larger than the configured warning threshold
    ArchiveTooLarge { path: PathBuf, size_mb: u64, limit_mb: u64 },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::VersionMarkerNotFound { path } => {
                write!(f, "No version marker found in '{}'", path.display())
            }
            Advisory::ReadmeMissing { path } => {
                write!(f, "Readme '{}' not found, version not stamped", path.display())
            }
            Advisory::ChangelogEntryExists { version } => {
                write!(f, "Changelog already contains an entry for v{}", version)
            }
            Advisory::PurgeFailed { path, reason } => {
                write!(f, "Could not remove '{}': {}", path.display(), reason)
            }
            Advisory::TempBranchNotDeleted { branch } => {
                write!(f, "Temporary branch '{}' was not deleted", branch)
            }
            Advisory::TagCreateFailed { tag, reason } => {
                write!(f, "Could not create tag '{}': {}", tag, reason)
            }
            Advisory::UntaggedRelease {
                tag,
                remote,
                reason,
            } => {
                write!(
                    f,
                    "Release pushed but tag '{}' was not pushed ({}). Run: git push {} {} --force",
                    tag, reason, remote, tag
                )
            }
            Advisory::HostedReleaseNotDeleted { tag, reason } => {
                write!(f, "Previous hosted release '{}' not deleted: {}", tag, reason)
            }
            Advisory::ReleaseAssetMissing { path } => {
                write!(f, "Release asset '{}' does not exist, skipping upload", path.display())
            }
            Advisory::ArchiveTooLarge {
                path,
                size_mb,
                limit_mb,
            } => {
                write!(
                    f,
                    "Archive '{}' is {} MB, above the {} MB limit",
                    path.display(),
                    size_mb,
                    limit_mb
                )
            }
        }
    }
}
