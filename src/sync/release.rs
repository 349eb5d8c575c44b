use chrono::{Local, NaiveDate};
use std::path::{Component, Path, PathBuf};

use crate::advisory::Advisory;
use crate::archive::{create_archive, ArchiveKind};
use crate::changelog::{format_notes, stamp_readme_file, update_changelog_file};
use crate::config::{relative_to_workdir, ReleaseConfig};
use crate::error::{Result, SyncError};
use crate::git::{LoggedVcs, Vcs};
use crate::hosted::{repository_slug, split_assets, HostedReleases, LoggedHosted, ReleaseRequest};
use crate::logbook::RunLog;
use crate::sync::{DevBranchGuard, ReleaseMode, SyncReport, SyncState};
use crate::version::VersionTag;
use crate::whitelist::Whitelist;

/// Drives one release from the development branch to a tagged release branch.
pub struct ReleaseSynchronizer<'a, V: Vcs, H: HostedReleases> {
    vcs: LoggedVcs<'a, V>,
    hosted: LoggedHosted<'a, H>,
    config: &'a ReleaseConfig,
    whitelist: &'a Whitelist,
    log: &'a RunLog,
    today: NaiveDate,
    /// Work-tree paths the tool writes itself, relative to the workdir
    owned: Vec<PathBuf>,
}

/// Values carried between states of a single run
struct RunContext<'g, V: Vcs> {
    notes: String,
    guard: Option<DevBranchGuard<'g, V>>,
    /// Paths spared by the purge and left out of the release commit
    protected: Vec<PathBuf>,
}

impl<'a, V: Vcs, H: HostedReleases> ReleaseSynchronizer<'a, V, H> {
    pub fn new(
        vcs: &'a V,
        hosted: &'a H,
        config: &'a ReleaseConfig,
        whitelist: &'a Whitelist,
        log: &'a RunLog,
    ) -> Self {
        ReleaseSynchronizer {
            vcs: LoggedVcs::new(vcs, log),
            hosted: LoggedHosted::new(hosted, log),
            config,
            whitelist,
            log,
            today: Local::now().date_naive(),
            owned: Vec::new(),
        }
    }

    /// Paths relative to the workdir that stay on disk through the purge and
    /// never enter the release commit, such as the settings file and log directory
    pub fn with_owned_paths(mut self, owned: Vec<PathBuf>) -> Self {
        self.owned = owned;
        self
    }

    /// Date written into the changelog section
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Runs every state for `mode` in order.
    ///
    /// The development branch is checked out again whether the run succeeds
    /// or fails once release-side work has begun.
    ///
    /// # Returns
    /// * `Ok(SyncReport)` - The release was committed and pushed
    /// * `Err` - A critical step failed; advisories gathered so far are in the log
    pub fn run(&self, mode: ReleaseMode, version: &VersionTag) -> Result<SyncReport> {
        if self.whitelist.is_empty() {
            return Err(SyncError::config(
                "'release_whitelist' is empty; refusing to purge the release tree",
            ));
        }

        self.log.info(&format!(
            "Starting {} for {}",
            mode.label(),
            version.tag_name()
        ));

        let mut report = SyncReport::new(mode, version.tag_name());
        let mut ctx = RunContext {
            notes: String::new(),
            guard: None,
            protected: Vec::new(),
        };

        let mut state = Some(SyncState::OnDev);
        while let Some(current) = state {
            report.states.push(current);
            self.enter(current, mode, version, &mut ctx, &mut report)?;
            state = current.next(mode);
        }

        self.log.info(&format!(
            "{} finished with {} advisory(ies)",
            mode.label(),
            report.advisories.len()
        ));
        Ok(report)
    }

    fn enter<'g>(
        &'g self,
        state: SyncState,
        mode: ReleaseMode,
        version: &VersionTag,
        ctx: &mut RunContext<'g, LoggedVcs<'a, V>>,
        report: &mut SyncReport,
    ) -> Result<()> {
        match state {
            SyncState::OnDev => {
                ctx.notes = self.prepare_dev(version, report)?;
            }
            SyncState::PreparingReleaseBase => {
                ctx.guard = Some(DevBranchGuard::acquire(
                    &self.vcs,
                    &self.config.dev_branch,
                    self.log,
                ));
                self.select_release_base(mode, report)?;
            }
            SyncState::Filtering => {
                ctx.protected = self.protected_paths();
                let purge = self
                    .whitelist
                    .purge_protecting(self.vcs.workdir(), &ctx.protected)?;
                self.log.info(&format!(
                    "Whitelist kept {} entr(ies), removed {}",
                    purge.kept.len(),
                    purge.removed.len()
                ));
                for advisory in purge.advisories {
                    self.advise(report, advisory);
                }
                report.purged = purge.removed;
            }
            SyncState::Stamping => {
                let readme = self.vcs.workdir().join(&self.config.readme_path);
                if let Some(advisory) = stamp_readme_file(&readme, version.as_str())? {
                    self.advise(report, advisory);
                }
            }
            SyncState::Committing => {
                let excluded: Vec<String> =
                    ctx.protected.iter().map(|p| pathspec(p)).collect();
                self.vcs.stage_all(&excluded)?;
                for path in &excluded {
                    self.vcs.untrack(path)?;
                }
                self.vcs
                    .commit(&format!("Release {}", version.tag_name()), true)?;
                if mode == ReleaseMode::Flattened {
                    self.vcs
                        .rename_branch(&self.config.temp_branch, &self.config.release_branch)?;
                }
            }
            SyncState::Publishing => {
                self.vcs.push(
                    &self.config.release_remote,
                    &self.config.release_branch,
                    mode.force_push(),
                )?;
                report.pushed = true;
            }
            SyncState::Tagging => {
                let tagged = self.tag_release(version, report);
                report.tagged = tagged;
            }
            SyncState::PublishingHostedRelease => {
                self.publish_hosted_release(version, &ctx.notes, report)?;
            }
            SyncState::ReturnedToDev => {
                if let Some(guard) = ctx.guard.take() {
                    guard.release()?;
                }
                report.returned_to_dev = true;
            }
        }
        Ok(())
    }

    /// Switches to dev, writes the changelog section and commits it there.
    /// Returns the notes used for the section.
    fn prepare_dev(&self, version: &VersionTag, report: &mut SyncReport) -> Result<String> {
        let dev = &self.config.dev_branch;
        if self.vcs.current_branch()? != *dev {
            self.log
                .warn(&format!("Not on '{}'; switching with --force", dev));
            self.vcs.checkout(dev, true)?;
        }

        let since = self.vcs.latest_tag()?;
        let commits = self
            .vcs
            .commits_since(since.as_deref(), self.config.changelog_fallback_commits)?;
        let notes = format_notes(&commits);

        let changelog = self.vcs.workdir().join(&self.config.changelog_path);
        if let Some(advisory) =
            update_changelog_file(&changelog, version.as_str(), self.today, &notes)?
        {
            self.advise(report, advisory);
        }

        self.vcs.stage(&self.config.changelog_path)?;
        if self.vcs.has_staged_changes()? {
            self.vcs.commit(
                &format!("{} | Update changelog for release", version.tag_name()),
                false,
            )?;
        }
        if self.vcs.is_dirty()? {
            self.log.warn(&format!(
                "'{}' has uncommitted changes; run a dev sync first so the release matches its history",
                dev
            ));
        }
        Ok(notes)
    }

    /// Owned paths plus a release asset the whitelist would otherwise purge
    /// before it is uploaded.
    fn protected_paths(&self) -> Vec<PathBuf> {
        let mut protected = self.owned.clone();
        let workdir = self.vcs.workdir();
        let asset = self
            .config
            .release_asset
            .as_ref()
            .and_then(|asset| relative_to_workdir(&workdir.join(asset), workdir));
        if let Some(asset) = asset {
            let mut components = asset.components();
            let top = components.next();
            let nested = components.next().is_some();
            let whitelisted = match top {
                Some(Component::Normal(name)) => {
                    let is_dir = nested || workdir.join(name).is_dir();
                    self.whitelist.allows(&name.to_string_lossy(), is_dir)
                }
                _ => false,
            };
            if !whitelisted && !protected.contains(&asset) {
                self.log.debug(&format!(
                    "Keeping release asset '{}' out of the purge",
                    asset.display()
                ));
                protected.push(asset);
            }
        }
        protected
    }

    fn select_release_base(&self, mode: ReleaseMode, report: &mut SyncReport) -> Result<()> {
        let cfg = self.config;
        match mode {
            ReleaseMode::Incremental => {
                self.vcs.checkout(&cfg.release_branch, false)?;
                let active = self.vcs.current_branch()?;
                if active != cfg.release_branch {
                    return Err(SyncError::precondition(format!(
                        "Branch mismatch! Expected '{}', found '{}'",
                        cfg.release_branch, active
                    )));
                }
                self.vcs.pull(&cfg.release_remote, &cfg.release_branch)?;
                self.vcs.overlay_tree(&cfg.dev_branch)?;
            }
            ReleaseMode::Flattened => {
                if self.vcs.delete_branch(&cfg.temp_branch).is_err() {
                    self.advise(
                        report,
                        Advisory::TempBranchNotDeleted {
                            branch: cfg.temp_branch.clone(),
                        },
                    );
                }
                self.vcs.checkout_orphan(&cfg.temp_branch, &cfg.dev_branch)?;
            }
        }
        Ok(())
    }

    /// Creates and pushes the annotated tag; returns whether it reached the remote.
    fn tag_release(&self, version: &VersionTag, report: &mut SyncReport) -> bool {
        let tag = version.tag_name();
        let message = format!("Version {}", version);

        if let Err(e) = self.vcs.create_annotated_tag(&tag, &message) {
            self.advise(
                report,
                Advisory::TagCreateFailed {
                    tag,
                    reason: e.to_string(),
                },
            );
            return false;
        }

        match self.vcs.push_tag(&self.config.release_remote, &tag) {
            Ok(()) => true,
            Err(e) => {
                self.advise(
                    report,
                    Advisory::UntaggedRelease {
                        tag,
                        remote: self.config.release_remote.clone(),
                        reason: e.to_string(),
                    },
                );
                false
            }
        }
    }

    fn publish_hosted_release(
        &self,
        version: &VersionTag,
        notes: &str,
        report: &mut SyncReport,
    ) -> Result<()> {
        let tag = version.tag_name();
        let url = self.vcs.remote_url(&self.config.release_remote)?;
        let repo = repository_slug(&url)?;

        self.log
            .info(&format!("Recreating hosted release {} on {}", tag, repo));
        if let Err(e) = self.hosted.delete_release(&repo, &tag) {
            self.advise(
                report,
                Advisory::HostedReleaseNotDeleted {
                    tag: tag.clone(),
                    reason: e.to_string(),
                },
            );
        }

        let mut candidates = Vec::new();
        if let Some(asset) = &self.config.release_asset {
            candidates.push(self.vcs.workdir().join(asset));
        }
        let (mut assets, missing) = split_assets(&candidates);
        for path in missing {
            self.advise(report, Advisory::ReleaseAssetMissing { path });
        }
        if self.config.attach_archive {
            let outcome = create_archive(
                &self.vcs,
                self.config,
                ArchiveKind::Release,
                version,
                self.log,
            )?;
            if let Some(advisory) = outcome.advisory {
                report.advisories.push(advisory);
            }
            assets.push(outcome.path);
        }

        let request = ReleaseRequest {
            repo,
            tag: tag.clone(),
            title: tag.clone(),
            notes: notes.to_string(),
            assets,
        };
        self.hosted.create_release(&request)?;
        self.log.info(&format!("Hosted release {} created", tag));
        report.hosted_release = Some(tag);
        Ok(())
    }

    fn advise(&self, report: &mut SyncReport, advisory: Advisory) {
        self.log.advisory(&advisory);
        report.advisories.push(advisory);
    }
}

/// Git pathspec for a workdir-relative path
fn pathspec(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
