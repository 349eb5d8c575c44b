//! Release archives and full repository backups.

use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

use crate::advisory::Advisory;
use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::git::Vcs;
use crate::logbook::RunLog;
use crate::version::VersionTag;

const MIB: u64 = 1024 * 1024;

/// What gets written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Zip of the release branch content
    Release,
    /// Bundle of every ref in the repository
    Backup,
}

impl ArchiveKind {
    pub fn label(&self) -> &'static str {
        match self {
            ArchiveKind::Release => "release",
            ArchiveKind::Backup => "backup",
        }
    }
}

/// A written archive and any size warning it raised
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveOutcome {
    pub path: PathBuf,
    pub advisory: Option<Advisory>,
}

/// Expands the `{date}`, `{time}`, `{type}`, `{remote}`, `{version}` and
/// `{branch}` placeholders of the backup name template.
pub fn archive_name(
    template: &str,
    kind: ArchiveKind,
    remote: &str,
    version: &str,
    branch: &str,
    at: NaiveDateTime,
) -> String {
    template
        .replace("{date}", &at.format("%Y-%m-%d").to_string())
        .replace("{time}", &at.format("%H%M%S").to_string())
        .replace("{type}", kind.label())
        .replace("{remote}", remote)
        .replace("{version}", version)
        .replace("{branch}", &branch.replace(['/', '\\'], "-"))
}

/// Writes a release zip or a full bundle into the configured backup directory.
///
/// Release archives hold the release branch as committed; backups hold every
/// ref so the repository can be restored with `git clone <bundle>`.
pub fn create_archive<V: Vcs>(
    vcs: &V,
    config: &ReleaseConfig,
    kind: ArchiveKind,
    version: &VersionTag,
    log: &RunLog,
) -> Result<ArchiveOutcome> {
    let dir = config.resolved_backup_dir(vcs.workdir());
    fs::create_dir_all(&dir)?;

    let now = Local::now().naive_local();
    let path = match kind {
        ArchiveKind::Release => {
            let name = archive_name(
                &config.backup_format,
                kind,
                &config.release_remote,
                version.as_str(),
                &config.release_branch,
                now,
            );
            let path = dir.join(name);
            log.info(&format!(
                "Archiving '{}' to {}",
                config.release_branch,
                path.display()
            ));
            vcs.archive(&config.release_branch, &path)?;
            path
        }
        ArchiveKind::Backup => {
            let branch = vcs.current_branch()?;
            let name = archive_name(
                &config.backup_format,
                kind,
                &config.dev_remote,
                version.as_str(),
                &branch,
                now,
            );
            let stem = name.strip_suffix(".zip").unwrap_or(&name);
            let path = dir.join(format!("{}.bundle", stem));
            log.info(&format!("Bundling all refs to {}", path.display()));
            vcs.bundle(&path)?;
            path
        }
    };

    let advisory = check_size(&path, config.archive_size_warn_mb)?;
    if let Some(advisory) = &advisory {
        log.advisory(advisory);
    }
    log.info(&format!("{} archive written: {}", kind.label(), path.display()));

    Ok(ArchiveOutcome { path, advisory })
}

/// Warns when a file exceeds `limit_mb`; a limit of 0 disables the check.
fn check_size(path: &Path, limit_mb: u64) -> Result<Option<Advisory>> {
    if limit_mb == 0 {
        return Ok(None);
    }
    let bytes = fs::metadata(path)?.len();
    if bytes > limit_mb.saturating_mul(MIB) {
        return Ok(Some(Advisory::ArchiveTooLarge {
            path: path.to_path_buf(),
            size_mb: bytes / MIB,
            limit_mb,
        }));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockVcs;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap()
    }

    #[test]
    fn test_archive_name_default_template() {
        let name = archive_name(
            "{date}_{time}_{type}_{remote}_v{version}_{branch}.zip",
            ArchiveKind::Release,
            "origin",
            "1.2.0",
            "master",
            at(),
        );
        assert_eq!(name, "2024-05-17_143005_release_origin_v1.2.0_master.zip");
    }

    fn backup_config(dir: &Path, limit_mb: u64) -> ReleaseConfig {
        ReleaseConfig {
            backup_dir: Some(dir.join("backups").display().to_string()),
            archive_size_warn_mb: limit_mb,
            ..ReleaseConfig::default()
        }
    }

    #[test]
    fn test_oversized_archive_raises_advisory() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = MockVcs::new(dir.path(), "dev").with_archive_bytes(2 * 1024 * 1024 + 1);
        let config = backup_config(dir.path(), 1);
        let log = RunLog::memory();
        let version = VersionTag::new("1.2.0").unwrap();

        let outcome =
            create_archive(&vcs, &config, ArchiveKind::Release, &version, &log).unwrap();

        assert!(outcome.path.is_file());
        assert_eq!(
            outcome.advisory,
            Some(Advisory::ArchiveTooLarge {
                path: outcome.path.clone(),
                size_mb: 2,
                limit_mb: 1,
            })
        );
        assert!(log.contains("MB, above the 1 MB limit"));
    }

    #[test]
    fn test_archive_within_limit_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = MockVcs::new(dir.path(), "dev").with_archive_bytes(1024);
        let config = backup_config(dir.path(), 1);
        let log = RunLog::memory();
        let version = VersionTag::new("1.2.0").unwrap();

        let outcome = create_archive(&vcs, &config, ArchiveKind::Backup, &version, &log).unwrap();

        assert_eq!(outcome.advisory, None);
        assert!(outcome.path.to_string_lossy().ends_with(".bundle"));
    }

    #[test]
    fn test_huge_limit_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.zip");
        fs::write(&path, vec![0u8; 16]).unwrap();

        assert_eq!(check_size(&path, u64::MAX).unwrap(), None);
        assert_eq!(check_size(&path, 0).unwrap(), None);
    }

    #[test]
    fn test_archive_name_flattens_branch_separators() {
        let name = archive_name("{branch}", ArchiveKind::Backup, "", "", "feature/x", at());
        assert_eq!(name, "feature-x");
    }
}
