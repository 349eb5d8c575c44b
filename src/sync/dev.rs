use crate::changelog::stamp_readme_file;
use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::git::{LoggedVcs, Vcs};
use crate::logbook::RunLog;
use crate::version::VersionTag;

/// Commit message used when confirmation is skipped
pub const AUTO_MESSAGE: &str = "auto sync";

/// How a development sync ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevSyncOutcome {
    /// The tree had nothing to commit
    NothingToSync,
    /// An empty commit message was given; changes stay staged
    Skipped,
    /// Changes were committed and pushed with this message
    Pushed { message: String },
}

/// Commits and pushes pending work on the development branch.
///
/// `prompt` asks for the commit message and is only called when there is
/// something to commit and `auto_confirm` is off.
pub fn sync_dev<V, F>(
    vcs: &V,
    config: &ReleaseConfig,
    log: &RunLog,
    version: &VersionTag,
    auto_confirm: bool,
    prompt: F,
) -> Result<DevSyncOutcome>
where
    V: Vcs,
    F: FnOnce(&str) -> Result<String>,
{
    let vcs = LoggedVcs::new(vcs, log);
    let dev = &config.dev_branch;

    if vcs.current_branch()? != *dev {
        log.warn(&format!("Not on '{}'; switching with --force", dev));
        vcs.checkout(dev, true)?;
    }

    let readme = vcs.workdir().join(&config.readme_path);
    if let Some(advisory) = stamp_readme_file(&readme, version.as_str())? {
        log.advisory(&advisory);
    }

    vcs.stage(".")?;
    if !vcs.has_staged_changes()? {
        log.info("Nothing to sync on dev.");
        return Ok(DevSyncOutcome::NothingToSync);
    }

    let message = if auto_confirm {
        AUTO_MESSAGE.to_string()
    } else {
        prompt("Commit message: ")?.trim().to_string()
    };
    if message.is_empty() {
        log.warn("Empty commit message; dev sync skipped");
        return Ok(DevSyncOutcome::Skipped);
    }

    vcs.commit(&format!("{} | {}", version.tag_name(), message), false)?;
    vcs.push(&config.dev_remote, dev, false)?;
    log.info(&format!("Pushed '{}' to {}", dev, config.dev_remote));

    Ok(DevSyncOutcome::Pushed { message })
}
