//! Release whitelist: the single source of truth for what may exist on the
//! release branch.
//!
//! Rules are matched against top-level entry names only. A rule ending in `/`
//! keeps a directory with exactly that name. Any other rule is a regular
//! expression anchored at the start of the bare name; it is not anchored at
//! the end, so suffix rules need an explicit `$` (e.g. `.*\.md$`).

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::advisory::Advisory;
use crate::error::Result;

/// Version-control metadata directory, never touched by a purge.
pub const VCS_DIR: &str = ".git";

#[derive(Debug, Clone)]
enum Rule {
    Directory(String),
    Pattern(Regex),
}

/// Compiled whitelist, in configuration order.
#[derive(Debug, Clone)]
pub struct Whitelist {
    rules: Vec<Rule>,
}

/// What a purge pass did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PurgeReport {
    pub kept: Vec<String>,
    pub removed: Vec<String>,
    pub advisories: Vec<Advisory>,
}

impl Whitelist {
    /// Compiles whitelist patterns.
    ///
    /// Blank entries are ignored. Invalid regular expressions are rejected here
    /// so a broken whitelist never reaches the release branch.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut rules = Vec::new();
        for raw in patterns {
            let pattern = raw.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            if let Some(dir) = pattern.strip_suffix('/') {
                rules.push(Rule::Directory(dir.to_string()));
            } else {
                rules.push(Rule::Pattern(Regex::new(&format!("^(?:{})", pattern))?));
            }
        }
        Ok(Whitelist { rules })
    }

    /// Whether a top-level entry survives a purge.
    pub fn allows(&self, name: &str, is_dir: bool) -> bool {
        self.rules.iter().any(|rule| match rule {
            Rule::Directory(dir) => is_dir && dir == name,
            Rule::Pattern(re) => re.is_match(name),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Deletes every top-level entry of `root` the whitelist does not allow.
    ///
    /// Directories go recursively, files singly. Removal failures are
    /// reported as advisories and the pass continues.
    ///
    /// # Returns
    /// * `Ok(PurgeReport)` - Names kept and removed, sorted, plus advisories
    /// * `Err` - If `root` itself cannot be listed
    pub fn purge(&self, root: &Path) -> Result<PurgeReport> {
        self.purge_protecting(root, &[])
    }

    /// Like [Whitelist::purge], but never deletes the `protected` paths
    /// (relative to `root`) nor the directories leading to them.
    ///
    /// A non-whitelisted directory that contains a protected path is emptied
    /// of everything else instead of being removed. Protected entries are
    /// reported in `kept` by their relative path.
    pub fn purge_protecting(&self, root: &Path, protected: &[PathBuf]) -> Result<PurgeReport> {
        let mut report = PurgeReport::default();

        for entry in fs::read_dir(root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == VCS_DIR {
                continue;
            }

            // Symlinks are judged and removed as files, never followed
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if self.allows(&name, is_dir) {
                report.kept.push(name);
                continue;
            }

            let relative = PathBuf::from(&name);
            clear_entry(&entry.path(), &relative, is_dir, protected, &mut report);
        }

        report.kept.sort();
        report.removed.sort();
        Ok(report)
    }
}

/// Removes one non-whitelisted entry, sparing protected paths below it.
fn clear_entry(
    path: &Path,
    relative: &Path,
    is_dir: bool,
    protected: &[PathBuf],
    report: &mut PurgeReport,
) {
    let display = relative.to_string_lossy().replace('\\', "/");
    if protected.iter().any(|p| p.as_path() == relative) {
        report.kept.push(display);
        return;
    }

    if is_dir && protected.iter().any(|p| p.starts_with(relative)) {
        match fs::read_dir(path) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let child_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                    let child = relative.join(entry.file_name());
                    clear_entry(&entry.path(), &child, child_dir, protected, report);
                }
            }
            Err(e) => report.advisories.push(Advisory::PurgeFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
        return;
    }

    let removal = if is_dir {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match removal {
        Ok(()) => report.removed.push(display),
        Err(e) => report.advisories.push(Advisory::PurgeFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
