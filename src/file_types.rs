//! File kind detection and processing order
//!
//! This module maps file paths to the Gradle file kinds we extract from and
//! defines the order in which a batch of files is processed.

use std::cmp::Ordering;
use std::path::Path;

use serde::Serialize;

/// Supported Gradle file kinds.
///
/// The declaration order is the processing rank within one directory:
/// property files and catalogs define values that scripts refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    /// `gradle.properties`
    Properties,
    /// `*.versions.toml`, `gradle/*.toml`
    Catalog,
    /// `settings.gradle`, `settings.gradle.kts`
    SettingsScript,
    /// `build.gradle`, `build.gradle.kts` and other `*.gradle(.kts)` scripts
    BuildScript,
}

impl FileKind {
    /// Detect the file kind from a path.
    ///
    /// Returns `None` for files we do not extract from.
    pub fn detect(path: &Path) -> Option<Self> {
        let filename = path.file_name()?.to_str()?;
        if filename == "gradle.properties" {
            Some(FileKind::Properties)
        } else if filename.ends_with(".versions.toml")
            || (filename.ends_with(".toml")
                && path
                    .parent()
                    .and_then(Path::file_name)
                    .is_some_and(|dir| dir == "gradle"))
        {
            Some(FileKind::Catalog)
        } else if filename == "settings.gradle" || filename == "settings.gradle.kts" {
            Some(FileKind::SettingsScript)
        } else if filename.ends_with(".gradle") || filename.ends_with(".gradle.kts") {
            Some(FileKind::BuildScript)
        } else {
            None
        }
    }

    /// Processing rank within a directory, lower first
    pub fn rank(self) -> u8 {
        match self {
            FileKind::Properties => 0,
            FileKind::Catalog => 1,
            FileKind::SettingsScript => 2,
            FileKind::BuildScript => 3,
        }
    }
}

/// Processing order of two files.
///
/// Parent directories come before their children (so inherited variables are
/// known), then files in one directory are ordered by kind rank, then by name.
/// Files of unknown kind sort last within their directory.
pub fn processing_order(a: &Path, b: &Path) -> Ordering {
    let rank = |path: &Path| FileKind::detect(path).map_or(u8::MAX, FileKind::rank);
    let dir = |path: &Path| path.parent().unwrap_or(Path::new("")).to_path_buf();

    dir(a)
        .cmp(&dir(b))
        .then_with(|| rank(a).cmp(&rank(b)))
        .then_with(|| a.file_name().cmp(&b.file_name()))
}
