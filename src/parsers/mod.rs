//! Parsers for Gradle dependency files (build scripts, gradle.properties, version catalogs)

use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub mod build_script;
pub mod catalog;
pub mod coordinate;
pub mod handlers;
pub mod interpolation;
pub mod matcher;
pub mod properties;
pub mod tokenizer;

/// Maven repository of the Gradle plugin portal
pub const GRADLE_PLUGIN_PORTAL: &str = "https://plugins.gradle.org/m2/";

/// Maven Central, the repository Gradle falls back to when none is declared
pub const MAVEN_CENTRAL: &str = "https://repo.maven.apache.org/maven2";

/// Well-known repository shorthands (`mavenCentral()`, `google()`, ...) and their URLs
pub const BUILTIN_REGISTRY_ALIASES: &[(&str, &str)] = &[
    ("mavenCentral", MAVEN_CENTRAL),
    ("google", "https://dl.google.com/android/maven2/"),
    ("gradlePluginPortal", GRADLE_PLUGIN_PORTAL),
    ("jcenter", "https://jcenter.bintray.com/"),
];

/// Kind of dependency declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// Library coordinate (`group:artifact:version`)
    #[default]
    Regular,
    /// Gradle plugin (`id 'x' version 'y'`)
    Plugin,
}

/// Why a dependency cannot be updated in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Version is built from variables that did not all resolve
    ContainsVariable,
    /// Version refers to something that is neither a literal nor a known variable
    UnknownVersion,
    /// No version is declared
    NoVersion,
    /// Rich version uses `reject` or `rejectAll`
    UnsupportedVersion,
    /// Rich version declares conflicting constraints
    #[serde(rename = "multiple-constraint-dep")]
    MultipleConstraints,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::ContainsVariable => "contains-variable",
            SkipReason::UnknownVersion => "unknown-version",
            SkipReason::NoVersion => "no-version",
            SkipReason::UnsupportedVersion => "unsupported-version",
            SkipReason::MultipleConstraints => "multiple-constraint-dep",
        }
    }
}

/// Represents a dependency extracted from a Gradle file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Coordinate name (`group:artifact`) or plugin id
    pub name: String,
    /// Version text as written (or as resolved from a variable)
    pub current_value: Option<String>,
    /// Byte offset of the first character of the version text in `source_file`
    pub file_replace_position: Option<usize>,
    /// File holding the version text, which is not always the declaring file
    pub source_file: PathBuf,
    /// Variable or shared version alias the version comes from
    pub group_name: Option<String>,
    /// Set when the dependency cannot be updated automatically
    pub skip_reason: Option<SkipReason>,
    pub dep_type: DependencyType,
    /// Artifact to look up for plugins (`<id>:<id>.gradle.plugin`)
    pub package_name: Option<String>,
    /// Artifact classifier after `@` (e.g. `aar`, `pom`)
    pub data_type: Option<String>,
    /// Repositories to resolve the dependency from
    #[serde(default)]
    pub registry_urls: Vec<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, source_file: &Path) -> Self {
        Self {
            name: name.into(),
            current_value: None,
            file_replace_position: None,
            source_file: source_file.to_path_buf(),
            group_name: None,
            skip_reason: None,
            dep_type: DependencyType::Regular,
            package_name: None,
            data_type: None,
            registry_urls: Vec::new(),
        }
    }

    /// Plugin dependency, looked up through its marker artifact on the plugin portal
    pub fn plugin(id: impl Into<String>, source_file: &Path) -> Self {
        let id = id.into();
        Self {
            package_name: Some(format!("{id}:{id}.gradle.plugin")),
            dep_type: DependencyType::Plugin,
            registry_urls: vec![GRADLE_PLUGIN_PORTAL.to_string()],
            ..Self::new(id, source_file)
        }
    }

    pub fn with_version(mut self, value: impl Into<String>, position: usize) -> Self {
        self.current_value = Some(value.into());
        self.file_replace_position = Some(position);
        self
    }

    pub fn skipped(mut self, reason: SkipReason) -> Self {
        self.skip_reason = Some(reason);
        self
    }

    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }
}

/// A variable assignment found in a build script or properties file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    pub value: String,
    /// Byte offset of the first character of `value` in `source_file`
    pub file_replace_position: usize,
    pub source_file: PathBuf,
}

/// Variables visible to a file, keyed by name
pub type Variables = HashMap<String, Variable>;

/// Insertion-ordered, de-duplicated list of repository URLs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryUrls(Vec<String>);

impl RegistryUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a URL unless already present. Returns whether it was added.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.0.contains(&url) {
            return false;
        }
        self.0.push(url);
        true
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl Extend<String> for RegistryUrls {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for url in iter {
            self.insert(url);
        }
    }
}

impl FromIterator<String> for RegistryUrls {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut urls = Self::new();
        urls.extend(iter);
        urls
    }
}

impl IntoIterator for RegistryUrls {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Everything extracted from a single file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub dependencies: Vec<Dependency>,
    /// Variables defined by the file, in definition order
    pub variables: Vec<Variable>,
    pub registry_urls: RegistryUrls,
}

/// Errors a parser reports for a whole file
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Catalog(#[from] catalog::CatalogError),
}

/// Trait for parsing Gradle dependency files
pub trait Parser: Send + Sync {
    /// Parse the given file content with the variables visible from its directory
    fn parse(
        &self,
        content: &str,
        variables: &Variables,
        source_file: &Path,
    ) -> Result<Extraction, ParseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_urls_deduplicate_in_order() {
        let mut urls = RegistryUrls::new();
        assert!(urls.insert("https://b.example/"));
        assert!(urls.insert("https://a.example/"));
        assert!(!urls.insert("https://b.example/"));
        assert_eq!(urls.as_slice(), ["https://b.example/", "https://a.example/"]);
    }

    #[test]
    fn test_plugin_dependency_defaults() {
        let dep = Dependency::plugin("org.example.tool", Path::new("build.gradle"));
        assert_eq!(dep.dep_type, DependencyType::Plugin);
        assert_eq!(
            dep.package_name.as_deref(),
            Some("org.example.tool:org.example.tool.gradle.plugin")
        );
        assert_eq!(dep.registry_urls, vec![GRADLE_PLUGIN_PORTAL.to_string()]);
    }

    #[test]
    fn test_skip_reason_serializes_kebab_case() {
        let json = serde_json::to_string(&SkipReason::MultipleConstraints).unwrap();
        assert_eq!(json, "\"multiple-constraint-dep\"");
        assert_eq!(
            serde_json::to_string(&SkipReason::ContainsVariable).unwrap(),
            "\"contains-variable\""
        );
        assert_eq!(SkipReason::NoVersion.as_str(), "no-version");
    }
}
