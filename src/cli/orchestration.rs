//! Run orchestration
//!
//! Turns parsed command-line options into one sync run: settings, work tree
//! checks, run log, version resolution, then the selected operation. Keeping
//! this out of main.rs lets the operations be driven programmatically with
//! mock collaborators.

use anyhow::Result;
use std::path::Path;

use crate::archive::{create_archive, ArchiveKind};
use crate::config::{self, ConfigLoad, ReleaseConfig};
use crate::error::SyncError;
use crate::git::{GitRepository, LoggedVcs, Vcs};
use crate::hosted::{GhCli, HostedReleases};
use crate::logbook::{open_log, RunLog};
use crate::sync::{sync_dev, DevSyncOutcome, ReleaseMode, ReleaseSynchronizer};
use crate::ui;
use crate::version::{read_manifest_version, VersionTag, FALLBACK_VERSION};
use crate::whitelist::Whitelist;

/// Operation selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Commit and push pending work on the development branch
    DevSync,
    /// Publish a release
    Release(ReleaseMode),
    /// Zip the release branch
    Archive,
    /// Bundle every ref
    Backup,
}

impl RunMode {
    /// Picks the mode from the mutually exclusive flags; none selects dev sync.
    pub fn from_flags(update: bool, deploy: bool, archive: bool, backup: bool) -> Self {
        if update {
            RunMode::Release(ReleaseMode::Incremental)
        } else if deploy {
            RunMode::Release(ReleaseMode::Flattened)
        } else if archive {
            RunMode::Archive
        } else if backup {
            RunMode::Backup
        } else {
            RunMode::DevSync
        }
    }
}

/// Arguments for one run
///
/// Mirrors the CLI arguments without depending on clap.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncArgs {
    /// Path to a custom settings file
    pub config_path: Option<String>,

    pub mode: RunMode,

    /// Skip confirmation and use the automatic commit message
    pub yes: bool,

    /// Open the run log when finished
    pub open: bool,

    /// Version to release instead of the manifest's
    pub release_version: Option<String>,
}

/// Result of a run that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Settings were created; nothing else happened
    SettingsCreated,
    /// The user declined the confirmation
    Cancelled,
    DevSync(DevSyncOutcome),
    /// Tag of the published release
    Released { tag: String, tagged: bool },
    /// Path of the written archive or bundle
    Archived(std::path::PathBuf),
}

/// Runs one invocation against the repository in the current directory.
///
/// # Returns
///
/// * `Ok(RunOutcome)` - What the run did
/// * `Err` - Settings, precondition, or critical command failure
pub fn run(args: SyncArgs) -> Result<RunOutcome> {
    let settings = config::settings_path(args.config_path.as_deref());
    let config = match config::load_or_bootstrap(&settings)? {
        ConfigLoad::Created(path) => {
            ui::display_setup_instructions(&path.display().to_string());
            return Ok(RunOutcome::SettingsCreated);
        }
        ConfigLoad::Loaded { config, repaired } => {
            for key in repaired {
                ui::display_warning(&format!("Added missing setting '{}'", key));
            }
            config
        }
    };
    config.validate_identity()?;
    let whitelist = Whitelist::new(&config.release_whitelist)?;

    let repo = GitRepository::open(".")?;
    config.verify_workdir(repo.workdir())?;

    let log = RunLog::in_dir(&config.resolved_log_dir(repo.workdir()));
    let hosted = GhCli::new(config.hosted_cli.clone());

    let result = resolve_version(&args, &config, repo.workdir(), &log).and_then(|version| {
        dispatch(&args, &config, &whitelist, &repo, &hosted, &log, &version)
    });

    if let Err(e) = &result {
        log.error(&format!("Run aborted: {}", e));
    }
    if args.open {
        if let Some(path) = log.path() {
            if let Err(e) = open_log(path, config.editor.as_deref()) {
                ui::display_warning(&format!("Could not open log: {}", e));
            }
        }
    }
    result
}

/// Version from the command line, else the manifest, else the fallback.
pub fn resolve_version(
    args: &SyncArgs,
    config: &ReleaseConfig,
    workdir: &Path,
    log: &RunLog,
) -> Result<VersionTag> {
    if let Some(version) = &args.release_version {
        return Ok(VersionTag::new(version)?);
    }
    let manifest = workdir.join(&config.manifest_path);
    match read_manifest_version(&manifest) {
        Ok(version) => Ok(version),
        Err(e) => {
            log.warn(&format!("{}; using {}", e, FALLBACK_VERSION));
            Ok(VersionTag::new(FALLBACK_VERSION)?)
        }
    }
}

/// Runs the selected operation against the given collaborators.
pub fn dispatch<V: Vcs, H: HostedReleases>(
    args: &SyncArgs,
    config: &ReleaseConfig,
    whitelist: &Whitelist,
    vcs: &V,
    hosted: &H,
    log: &RunLog,
    version: &VersionTag,
) -> Result<RunOutcome> {
    log.info(&format!(
        "{} at {} (version {})",
        config.project_name,
        vcs.workdir().display(),
        version
    ));

    match args.mode {
        RunMode::DevSync => {
            let outcome = sync_dev(vcs, config, log, version, args.yes, |prompt| {
                ui::prompt_line(prompt)
                    .map_err(|e| SyncError::precondition(format!("No commit message: {}", e)))
            })?;
            Ok(RunOutcome::DevSync(outcome))
        }
        RunMode::Release(mode) => {
            let question = format!("Run {} for {}?", mode.label(), version.tag_name());
            if !args.yes && !ui::confirm_action(&question)? {
                log.info("Cancelled by user.");
                return Ok(RunOutcome::Cancelled);
            }

            let settings = config::settings_path(args.config_path.as_deref());
            let owned = config.owned_paths(vcs.workdir(), &settings);
            let report = ReleaseSynchronizer::new(vcs, hosted, config, whitelist, log)
                .with_owned_paths(owned)
                .run(mode, version)?;
            ui::display_release_summary(
                mode.label(),
                &report.tag,
                &config.release_branch,
                report.tagged,
            );
            Ok(RunOutcome::Released {
                tag: report.tag,
                tagged: report.tagged,
            })
        }
        RunMode::Archive | RunMode::Backup => {
            let kind = if args.mode == RunMode::Archive {
                ArchiveKind::Release
            } else {
                ArchiveKind::Backup
            };
            let outcome = create_archive(&LoggedVcs::new(vcs, log), config, kind, version, log)?;
            ui::display_success(&format!("Written {}", outcome.path.display()));
            Ok(RunOutcome::Archived(outcome.path))
        }
    }
}
