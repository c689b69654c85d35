//! Parser for Gradle version catalogs (`gradle/libs.versions.toml`)
//!
//! The TOML is parsed with the `toml` crate, which does not report positions.
//! Positions of version strings are recovered afterwards by searching the raw
//! text of the relevant section for the entry key followed by its value.

use std::path::Path;

use regex::Regex;
use toml::{Table, Value};
use tracing::debug;

use super::{Dependency, Extraction, ParseError, Parser, SkipReason, Variables};

/// Errors raised while reading a version catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid version catalog: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Parser for TOML version catalogs
#[derive(Debug, Default)]
pub struct CatalogParser;

impl CatalogParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for CatalogParser {
    fn parse(
        &self,
        content: &str,
        _variables: &Variables,
        source_file: &Path,
    ) -> Result<Extraction, ParseError> {
        Ok(Extraction {
            dependencies: extract_catalog(content, source_file)?,
            ..Extraction::default()
        })
    }
}

/// Extract library and plugin dependencies from a version catalog.
///
/// `[bundles]` only groups libraries declared elsewhere and is ignored.
pub fn extract_catalog(content: &str, source_file: &Path) -> Result<Vec<Dependency>, CatalogError> {
    let table: Table = toml::from_str(content)?;
    let catalog = Catalog {
        source_file,
        versions: table.get("versions").and_then(Value::as_table),
        versions_section: Section::find(content, "versions"),
    };

    let mut dependencies = Vec::new();
    if let Some(libraries) = table.get("libraries").and_then(Value::as_table) {
        let section = Section::find(content, "libraries");
        for (alias, entry) in libraries {
            match catalog.library(alias, entry, &section) {
                Some(dependency) => dependencies.push(dependency),
                None => debug!("Skipping catalog library {alias}: unsupported declaration"),
            }
        }
    }
    if let Some(plugins) = table.get("plugins").and_then(Value::as_table) {
        let section = Section::find(content, "plugins");
        for (alias, entry) in plugins {
            match catalog.plugin(alias, entry, &section) {
                Some(dependency) => dependencies.push(dependency),
                None => debug!("Skipping catalog plugin {alias}: unsupported declaration"),
            }
        }
    }
    Ok(dependencies)
}

/// How an entry declares its version
enum VersionDecl<'a> {
    Missing,
    Literal(&'a str),
    Ref(&'a str),
    Rich(&'a Table),
}

impl<'a> VersionDecl<'a> {
    fn from_value(value: Option<&'a Value>) -> Option<Self> {
        match value {
            None => Some(VersionDecl::Missing),
            Some(Value::String(version)) => Some(VersionDecl::Literal(version)),
            Some(Value::Table(table)) => match table.get("ref") {
                Some(Value::String(key)) => Some(VersionDecl::Ref(key)),
                Some(_) => None,
                None => Some(VersionDecl::Rich(table)),
            },
            Some(_) => None,
        }
    }
}

/// Outcome of evaluating a rich version table
enum RichVersion<'a> {
    Version(&'a str),
    Skip(SkipReason),
}

fn rich_version(table: &Table) -> RichVersion<'_> {
    let rejects = table.contains_key("reject")
        || table.get("rejectAll").and_then(Value::as_bool) == Some(true);
    if rejects {
        return RichVersion::Skip(SkipReason::UnsupportedVersion);
    }

    if populated(table, "require").is_some() && populated(table, "strictly").is_some() {
        return RichVersion::Skip(SkipReason::MultipleConstraints);
    }
    match ["require", "prefer", "strictly"]
        .into_iter()
        .find_map(|key| populated(table, key))
    {
        Some(version) => RichVersion::Version(version),
        None => RichVersion::Skip(SkipReason::UnknownVersion),
    }
}

fn populated<'t>(table: &'t Table, key: &str) -> Option<&'t str> {
    table
        .get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
}

/// A catalog section: the text from its header to the end of the file
struct Section<'c> {
    start: usize,
    text: &'c str,
}

impl<'c> Section<'c> {
    /// Locate `[name]`, falling back to the first bare occurrence of the name
    /// (dotted keys such as `versions.kotlin = ...`), then to the whole file.
    fn find(content: &'c str, name: &str) -> Self {
        let start = content
            .find(&format!("[{name}]"))
            .or_else(|| content.find(name))
            .unwrap_or(0);
        Self {
            start,
            text: &content[start..],
        }
    }

    /// Absolute offset of the version declared for `key`
    fn find_version(&self, key: &str, version: &str) -> Option<usize> {
        find_version_index(self.text, key, version)
            .or_else(|| find_index_after(self.text, key, version))
            .map(|i| self.start + i)
    }

    /// Absolute offset of the first `find` after `key`
    fn find_after(&self, key: &str, find: &str) -> Option<usize> {
        find_index_after(self.text, key, find).map(|i| self.start + i)
    }
}

struct Catalog<'a> {
    source_file: &'a Path,
    versions: Option<&'a Table>,
    versions_section: Section<'a>,
}

impl<'a> Catalog<'a> {
    fn library(&self, alias: &str, entry: &'a Value, section: &Section<'_>) -> Option<Dependency> {
        match entry {
            Value::String(notation) => {
                let mut parts = notation.splitn(3, ':');
                let (group, artifact) = (parts.next()?, parts.next()?);
                let name = format!("{group}:{artifact}");
                let dependency = Dependency::new(name, self.source_file);
                match parts.next() {
                    Some(version) if !version.is_empty() => {
                        let position = section
                            .find_after(alias, notation)
                            .map(|i| i + group.len() + artifact.len() + 2);
                        Some(located(dependency, version, position))
                    }
                    _ => Some(dependency.skipped(SkipReason::NoVersion)),
                }
            }
            Value::Table(table) => {
                let name = match table.get("module").and_then(Value::as_str) {
                    Some(module) => {
                        let (group, artifact) = module.split_once(':')?;
                        format!("{group}:{artifact}")
                    }
                    None => {
                        let group = table.get("group").and_then(Value::as_str)?;
                        let artifact = table.get("name").and_then(Value::as_str)?;
                        format!("{group}:{artifact}")
                    }
                };
                let decl = VersionDecl::from_value(table.get("version"))?;
                Some(self.resolve(Dependency::new(name, self.source_file), alias, decl, section))
            }
            _ => None,
        }
    }

    fn plugin(&self, alias: &str, entry: &'a Value, section: &Section<'_>) -> Option<Dependency> {
        match entry {
            Value::String(notation) => {
                let (id, version) = match notation.split_once(':') {
                    Some((id, version)) => (id, Some(version)),
                    None => (notation.as_str(), None),
                };
                let dependency = Dependency::plugin(id, self.source_file);
                match version.filter(|v| !v.is_empty()) {
                    Some(version) => {
                        let position = section.find_after(alias, notation).map(|i| i + id.len() + 1);
                        Some(located(dependency, version, position))
                    }
                    None => Some(dependency.skipped(SkipReason::NoVersion)),
                }
            }
            Value::Table(table) => {
                let id = table.get("id").and_then(Value::as_str)?;
                let decl = VersionDecl::from_value(table.get("version"))?;
                Some(self.resolve(Dependency::plugin(id, self.source_file), alias, decl, section))
            }
            _ => None,
        }
    }

    fn resolve(
        &self,
        dependency: Dependency,
        alias: &str,
        decl: VersionDecl<'_>,
        section: &Section<'_>,
    ) -> Dependency {
        match decl {
            VersionDecl::Missing => dependency.skipped(SkipReason::NoVersion),
            VersionDecl::Literal(version) => {
                let position = section.find_version(alias, version);
                located(dependency, version, position)
            }
            VersionDecl::Rich(table) => match rich_version(table) {
                RichVersion::Version(version) => {
                    let position = section.find_version(alias, version);
                    located(dependency, version, position)
                }
                RichVersion::Skip(reason) => dependency.skipped(reason),
            },
            VersionDecl::Ref(reference) => self.resolve_ref(dependency, reference),
        }
    }

    /// Follow a `version.ref` into `[versions]`, one level deep
    fn resolve_ref(&self, dependency: Dependency, reference: &str) -> Dependency {
        let Some((key, value)) = self
            .versions
            .and_then(|versions| find_original_alias(versions, reference))
        else {
            debug!("Unknown version reference {reference} in {}", self.source_file.display());
            return dependency.skipped(SkipReason::UnknownVersion);
        };

        let dependency = Dependency {
            group_name: Some(key.to_string()),
            ..dependency
        };
        let section = &self.versions_section;
        match value {
            Value::String(version) => {
                let position = section.find_version(key, version);
                located(dependency, version, position)
            }
            Value::Table(table) => match rich_version(table) {
                RichVersion::Version(version) => {
                    let position = section.find_version(key, version);
                    located(dependency, version, position)
                }
                RichVersion::Skip(reason) => dependency.skipped(reason),
            },
            _ => dependency.skipped(SkipReason::UnknownVersion),
        }
    }
}

/// Attach a version whose position may not have been recovered
fn located(dependency: Dependency, version: &str, position: Option<usize>) -> Dependency {
    match position {
        Some(position) => dependency.with_version(version, position),
        None => {
            debug!("Could not locate version {version} of {}", dependency.name);
            Dependency {
                current_value: Some(version.to_string()),
                ..dependency
            }
            .skipped(SkipReason::UnknownVersion)
        }
    }
}

/// Find `version` declared for `key` on the same line, e.g. `key = "1.0"`,
/// `key = { module = "g:a", version = "1.0" }` or `{ id = "key", version = "1.0" }`.
fn find_version_index(section: &str, key: &str, version: &str) -> Option<usize> {
    let pattern = format!(
        r#"(?m)(?:^|[^\w.-])(?:id\s*=\s*)?['"]?{}["']?(?:(?:\s*=\s*)|:|,\s*)(?:.*version(?:\.ref)?(?:\s*=\s*))?["']?{}['"]?"#,
        regex::escape(key),
        regex::escape(version)
    );
    let re = Regex::new(&pattern).ok()?;
    let found = re.find(section)?;
    found
        .as_str()
        .rfind(version)
        .map(|i| found.start() + i)
}

/// Offset of the first `find` after the first `key` in `section`
fn find_index_after(section: &str, key: &str, find: &str) -> Option<usize> {
    let key_index = section.find(key)?;
    let after = key_index + key.len();
    section[after..].find(find).map(|i| after + i)
}

/// Catalog aliases treat `-`, `_` and `.` as the same separator
fn normalize_alias(alias: &str) -> String {
    alias.replace(['-', '_'], ".")
}

/// Look up an alias in `[versions]` regardless of separator style
fn find_original_alias<'t>(versions: &'t Table, alias: &str) -> Option<(&'t str, &'t Value)> {
    if let Some((key, value)) = versions.get_key_value(alias) {
        return Some((key.as_str(), value));
    }
    let normalized = normalize_alias(alias);
    versions
        .iter()
        .find(|(key, _)| normalize_alias(key) == normalized)
        .map(|(key, value)| (key.as_str(), value))
}
