use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Result, SyncError};

/// Version used when the manifest cannot be read.
pub const FALLBACK_VERSION: &str = "0.0.0";

/// Release version label, e.g. `1.2.0`.
///
/// Treated as an opaque, non-empty string: it is never parsed or compared,
/// only substituted into tags, commit messages and file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag(String);

impl VersionTag {
    /// Creates a version label from user or manifest input.
    ///
    /// # Returns
    /// * `Ok(VersionTag)` - Trimmed, non-empty label
    /// * `Err` - If the input is empty or contains whitespace
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SyncError::version("Version must not be empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(SyncError::version(format!(
                "Version '{}' must not contain whitespace",
                trimmed
            )));
        }
        Ok(VersionTag(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tag name for this version (`v1.2.0`).
    pub fn tag_name(&self) -> String {
        format!("v{}", self.0)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the `<Version>` element from an XML-like manifest document.
pub fn parse_manifest_version(manifest: &str) -> Result<VersionTag> {
    let re = Regex::new(r"(?s)<Version>\s*(.*?)\s*</Version>")
        .map_err(|e| SyncError::version(format!("Manifest pattern: {}", e)))?;
    let captured = re
        .captures(manifest)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| SyncError::version("Manifest has no <Version> element"))?;
    VersionTag::new(captured)
}

/// Reads the release version from a manifest file.
pub fn read_manifest_version(path: &Path) -> Result<VersionTag> {
    let content = fs::read_to_string(path).map_err(|e| {
        SyncError::version(format!("Cannot read manifest '{}': {}", path.display(), e))
    })?;
    parse_manifest_version(&content)
}
