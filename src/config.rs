use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Settings file looked up in the current directory when no path is given.
pub const SETTINGS_FILE: &str = "release-sync.toml";

/// Identity value written on first run. A run refuses to mutate anything
/// while `project_name` still holds it.
pub const PLACEHOLDER_PROJECT: &str = "CHANGE_ME";

/// Settings for one project, loaded once per invocation.
///
/// Contains branch and remote names, the release whitelist, file locations and
/// archive options. Passed by reference to every operation; never mutated
/// after loading.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_project_name")]
    pub project_name: String,

    #[serde(default = "default_dev_remote")]
    pub dev_remote: String,

    #[serde(default = "default_release_remote")]
    pub release_remote: String,

    #[serde(default = "default_dev_branch")]
    pub dev_branch: String,

    #[serde(default = "default_release_branch")]
    pub release_branch: String,

    #[serde(default = "default_temp_branch")]
    pub temp_branch: String,

    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,

    #[serde(default = "default_readme_path")]
    pub readme_path: String,

    #[serde(default = "default_changelog_path")]
    pub changelog_path: String,

    #[serde(default = "default_changelog_fallback_commits")]
    pub changelog_fallback_commits: usize,

    #[serde(default = "default_release_whitelist")]
    pub release_whitelist: Vec<String>,

    #[serde(default = "default_backup_format")]
    pub backup_format: String,

    #[serde(default = "default_archive_size_warn_mb")]
    pub archive_size_warn_mb: u64,

    #[serde(default)]
    pub attach_archive: bool,

    #[serde(default = "default_hosted_cli")]
    pub hosted_cli: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_asset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

fn default_project_name() -> String {
    PLACEHOLDER_PROJECT.to_string()
}

fn default_dev_remote() -> String {
    "private".to_string()
}

fn default_release_remote() -> String {
    "origin".to_string()
}

fn default_dev_branch() -> String {
    "dev".to_string()
}

fn default_release_branch() -> String {
    "master".to_string()
}

fn default_temp_branch() -> String {
    "temp_release".to_string()
}

fn default_manifest_path() -> String {
    "manifest.xml".to_string()
}

fn default_readme_path() -> String {
    "README.md".to_string()
}

fn default_changelog_path() -> String {
    "CHANGELOG.md".to_string()
}

fn default_changelog_fallback_commits() -> usize {
    5
}

/// Returns the default public surface of a release.
fn default_release_whitelist() -> Vec<String> {
    vec![
        "Plugin/".to_string(),
        "manifest.xml".to_string(),
        ".gitignore".to_string(),
        "LICENSE".to_string(),
        "CHANGELOG.md".to_string(),
        r".*\.csproj$".to_string(),
        r".*\.sln$".to_string(),
        r".*\.md$".to_string(),
    ]
}

fn default_backup_format() -> String {
    "{date}_{time}_{type}_{remote}_v{version}_{branch}.zip".to_string()
}

fn default_archive_size_warn_mb() -> u64 {
    100
}

fn default_hosted_cli() -> String {
    "gh".to_string()
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            project_name: default_project_name(),
            dev_remote: default_dev_remote(),
            release_remote: default_release_remote(),
            dev_branch: default_dev_branch(),
            release_branch: default_release_branch(),
            temp_branch: default_temp_branch(),
            manifest_path: default_manifest_path(),
            readme_path: default_readme_path(),
            changelog_path: default_changelog_path(),
            changelog_fallback_commits: default_changelog_fallback_commits(),
            release_whitelist: default_release_whitelist(),
            backup_format: default_backup_format(),
            archive_size_warn_mb: default_archive_size_warn_mb(),
            attach_archive: false,
            hosted_cli: default_hosted_cli(),
            release_asset: None,
            log_dir: None,
            backup_dir: None,
            editor: None,
        }
    }
}

/// Outcome of reading the settings file.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLoad {
    /// No settings existed; defaults with a placeholder identity were written here
    Created(PathBuf),
    /// Settings were read; `repaired` lists keys that were missing and got backfilled
    Loaded {
        config: ReleaseConfig,
        repaired: Vec<String>,
    },
}

impl ReleaseConfig {
    /// Fails when the identity still holds the first-run placeholder.
    pub fn validate_identity(&self) -> Result<()> {
        let name = self.project_name.trim();
        if name.is_empty() || name == PLACEHOLDER_PROJECT {
            return Err(SyncError::precondition(format!(
                "'project_name' is not set; edit the settings file and replace '{}'",
                PLACEHOLDER_PROJECT
            )));
        }
        Ok(())
    }

    /// Fails unless the work tree directory is named after the project.
    pub fn verify_workdir(&self, workdir: &Path) -> Result<()> {
        let current = workdir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if current != self.project_name {
            return Err(SyncError::precondition(format!(
                "Directory mismatch: must run in '{}', found '{}'",
                self.project_name, current
            )));
        }
        Ok(())
    }

    /// Directory for run logs; relative settings resolve against the work tree.
    pub fn resolved_log_dir(&self, workdir: &Path) -> PathBuf {
        match &self.log_dir {
            Some(dir) => workdir.join(dir),
            None => self.data_dir().join("logs"),
        }
    }

    /// Directory for archives and backups; relative settings resolve against the work tree.
    pub fn resolved_backup_dir(&self, workdir: &Path) -> PathBuf {
        match &self.backup_dir {
            Some(dir) => workdir.join(dir),
            None => self.data_dir().join("backups"),
        }
    }

    /// Paths the tool itself owns inside the work tree: the settings file in
    /// use and the log and backup directories when they resolve there.
    ///
    /// Returned relative to `workdir`, for a release to keep on disk and out
    /// of its commit.
    pub fn owned_paths(&self, workdir: &Path, settings: &Path) -> Vec<PathBuf> {
        let mut owned = Vec::new();
        for path in [
            settings.to_path_buf(),
            self.resolved_log_dir(workdir),
            self.resolved_backup_dir(workdir),
        ] {
            if let Some(relative) = relative_to_workdir(&path, workdir) {
                if !owned.contains(&relative) {
                    owned.push(relative);
                }
            }
        }
        owned
    }

    fn data_dir(&self) -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("release-sync")
            .join(&self.project_name)
    }
}

/// `path` relative to `workdir`, or `None` when it lies outside (or is) the
/// work tree. Symlinked prefixes are resolved for paths that exist.
pub fn relative_to_workdir(path: &Path, workdir: &Path) -> Option<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    let candidates = [
        (absolute.canonicalize().ok(), workdir.canonicalize().ok()),
        (Some(absolute.clone()), Some(workdir.to_path_buf())),
    ];
    candidates.into_iter().find_map(|(path, root)| {
        let relative = path?.strip_prefix(root?).ok()?.to_path_buf();
        let relative: PathBuf = relative
            .components()
            .filter(|c| !matches!(c, std::path::Component::CurDir))
            .collect();
        (!relative.as_os_str().is_empty()).then_some(relative)
    })
}

/// Resolves the settings path: an explicit path wins, otherwise `./release-sync.toml`.
pub fn settings_path(config_path: Option<&str>) -> PathBuf {
    match config_path {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(".").join(SETTINGS_FILE),
    }
}

/// Loads settings, creating or repairing the file as needed.
///
/// - Missing file: defaults are written with the placeholder identity and
///   [`ConfigLoad::Created`] is returned. The caller is expected to stop.
/// - Existing file: every default key absent from the file is backfilled and
///   the file is rewritten, then the merged settings are returned.
///
/// # Returns
/// * `Ok(ConfigLoad)` - Created or loaded settings
/// * `Err` - If the file cannot be read, parsed or written
pub fn load_or_bootstrap(path: &Path) -> Result<ConfigLoad> {
    if !path.exists() {
        let defaults = toml::to_string_pretty(&ReleaseConfig::default())
            .map_err(|e| SyncError::config(format!("Cannot serialize defaults: {}", e)))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, defaults)?;
        return Ok(ConfigLoad::Created(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let mut table: toml::Table = toml::from_str(&content)?;

    let defaults = match toml::Value::try_from(ReleaseConfig::default()) {
        Ok(toml::Value::Table(defaults)) => defaults,
        Ok(_) => return Err(SyncError::config("Defaults did not serialize to a table")),
        Err(e) => {
            return Err(SyncError::config(format!(
                "Cannot serialize defaults: {}",
                e
            )))
        }
    };

    let mut repaired = Vec::new();
    for (key, value) in defaults {
        if !table.contains_key(&key) {
            table.insert(key.clone(), value);
            repaired.push(key);
        }
    }

    if !repaired.is_empty() {
        let rewritten = toml::to_string_pretty(&table)
            .map_err(|e| SyncError::config(format!("Cannot serialize settings: {}", e)))?;
        fs::write(path, rewritten)?;
    }

    let config: ReleaseConfig = toml::Value::Table(table).try_into()?;
    Ok(ConfigLoad::Loaded { config, repaired })
}
