//! Readme version stamping and changelog maintenance.
//!
//! The text transforms are pure functions over strings; `stamp_readme_file`
//! and `update_changelog_file` wrap them with file I/O.

use chrono::NaiveDate;
use regex::Regex;
use std::fs;
use std::path::Path;

use crate::advisory::Advisory;
use crate::error::Result;
use crate::git::CommitInfo;

/// Header kept at the very top of the changelog.
pub const CHANGELOG_HEADER: &str = "# Changelog\n\n";

/// Notes used when no commits are found for a release.
pub const EMPTY_NOTES: &str = "- Performance and stability improvements.";

const VERSION_MARKER: &str = r"(?i)(\*?\*?version\*?\*?[:\s]+)([0-9.]+)";

/// Result of trying to prepend a changelog section.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangelogUpdate {
    /// New document content
    Updated(String),
    /// A section for this version already exists; nothing changes
    AlreadyPresent,
}

/// Replaces the number of every version-labeled line (`Version: 1.0`,
/// `**Version** 1.0`) with `version`.
///
/// Returns `None` when the text has no such line.
pub fn stamp_version(content: &str, version: &str) -> Option<String> {
    let re = Regex::new(VERSION_MARKER).ok()?;
    if !re.is_match(content) {
        return None;
    }
    let stamped = re.replace_all(content, |caps: &regex::Captures<'_>| {
        format!("{}{}", &caps[1], version)
    });
    Some(stamped.into_owned())
}

/// Formats commits as changelog bullet lines, `- subject (shorthash)`.
pub fn format_notes(commits: &[CommitInfo]) -> String {
    if commits.is_empty() {
        return EMPTY_NOTES.to_string();
    }
    commits
        .iter()
        .map(|c| format!("- {} ({})", c.summary, c.short_hash()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prepends a `## [version] - date` section below the changelog header.
///
/// An existing header is moved back to the top, so the document always
/// carries exactly one.
pub fn prepend_entry(existing: &str, version: &str, date: NaiveDate, notes: &str) -> ChangelogUpdate {
    if existing.contains(&format!("## [{}]", version)) {
        return ChangelogUpdate::AlreadyPresent;
    }
    let entry = format!("## [{}] - {}\n{}\n\n", version, date.format("%Y-%m-%d"), notes);
    let rest = existing.replacen(CHANGELOG_HEADER, "", 1);
    ChangelogUpdate::Updated(format!("{}{}{}", CHANGELOG_HEADER, entry, rest))
}

/// Stamps the version into a readme file in place.
///
/// # Returns
/// * `Ok(None)` - The file was stamped
/// * `Ok(Some(advisory))` - File or marker missing; nothing was written
/// * `Err` - If the file exists but cannot be read or written
pub fn stamp_readme_file(path: &Path, version: &str) -> Result<Option<Advisory>> {
    if !path.exists() {
        return Ok(Some(Advisory::ReadmeMissing {
            path: path.to_path_buf(),
        }));
    }
    let content = fs::read_to_string(path)?;
    match stamp_version(&content, version) {
        Some(stamped) => {
            if stamped != content {
                fs::write(path, stamped)?;
            }
            Ok(None)
        }
        None => Ok(Some(Advisory::VersionMarkerNotFound {
            path: path.to_path_buf(),
        })),
    }
}

/// Adds a changelog section for `version` unless one exists. A missing
/// changelog file is created.
pub fn update_changelog_file(
    path: &Path,
    version: &str,
    date: NaiveDate,
    notes: &str,
) -> Result<Option<Advisory>> {
    let existing = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };
    match prepend_entry(&existing, version, date, notes) {
        ChangelogUpdate::Updated(content) => {
            fs::write(path, content)?;
            Ok(None)
        }
        ChangelogUpdate::AlreadyPresent => Ok(Some(Advisory::ChangelogEntryExists {
            version: version.to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[test]
    fn test_stamp_replaces_only_number() {
        let readme = "# Mamba\n\n**Version**: 1.0.4 (stable)\nOther text\n";
        let stamped = stamp_version(readme, "2.3.0").unwrap();
        assert_eq!(stamped, "# Mamba\n\n**Version**: 2.3.0 (stable)\nOther text\n");
    }

    #[test]
    fn test_stamp_is_case_insensitive() {
        let stamped = stamp_version("version 0.9", "1.0.0").unwrap();
        assert_eq!(stamped, "version 1.0.0");
    }

    #[test]
    fn test_stamp_without_marker() {
        assert!(stamp_version("# Title\nNo marker here\n", "1.0.0").is_none());
    }

    #[test]
    fn test_prepend_entry_to_empty() {
        let ChangelogUpdate::Updated(doc) = prepend_entry("", "1.2.0", date(), "- fix (abc1234)")
        else {
            panic!("expected update");
        };
        assert_eq!(doc, "# Changelog\n\n## [1.2.0] - 2024-05-17\n- fix (abc1234)\n\n");
    }

    #[test]
    fn test_prepend_entry_keeps_single_header() {
        let existing = "# Changelog\n\n## [1.1.0] - 2024-01-01\n- older\n\n";
        let ChangelogUpdate::Updated(doc) = prepend_entry(existing, "1.2.0", date(), "- newer")
        else {
            panic!("expected update");
        };
        assert_eq!(doc.matches("# Changelog").count(), 1);
        assert!(doc.starts_with("# Changelog\n\n## [1.2.0] - 2024-05-17\n- newer\n\n## [1.1.0]"));
    }

    #[test]
    fn test_prepend_entry_idempotent() {
        let existing = "# Changelog\n\n## [1.2.0] - 2024-05-01\n- done\n\n";
        assert_eq!(
            prepend_entry(existing, "1.2.0", date(), "- again"),
            ChangelogUpdate::AlreadyPresent
        );
    }

    #[test]
    fn test_format_notes() {
        let commits = vec![CommitInfo {
            hash: "abcdef0123456789".to_string(),
            summary: "Add plugin loader".to_string(),
        }];
        assert_eq!(format_notes(&commits), "- Add plugin loader (abcdef0)");
        assert_eq!(format_notes(&[]), EMPTY_NOTES);
    }
}
