//! Multi-file extraction
//!
//! Files are processed one at a time in [`processing_order`], so variables
//! from `gradle.properties` and parent directories are known before the
//! scripts that use them. A file that fails to parse is reported and skipped;
//! it never aborts the batch.

use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::file_types::{FileKind, processing_order};
use crate::parsers::build_script::BuildScriptParser;
use crate::parsers::catalog::CatalogParser;
use crate::parsers::properties::PropertiesParser;
use crate::parsers::{Dependency, Extraction, ParseError, Parser, RegistryUrls, Variables};
use crate::variables::VariableRegistry;

/// A file handed to the extractor
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Dependencies whose version text lives in one file
#[derive(Debug, Clone, Serialize)]
pub struct PackageFile {
    pub path: PathBuf,
    pub kind: Option<FileKind>,
    pub dependencies: Vec<Dependency>,
}

/// A file that could not be parsed
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Result of extracting a batch of files
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractReport {
    pub package_files: Vec<PackageFile>,
    /// Repositories declared anywhere in the batch
    pub registry_urls: RegistryUrls,
    pub failed_files: Vec<FailedFile>,
}

impl ExtractReport {
    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.package_files.iter().flat_map(|file| &file.dependencies)
    }

    pub fn dependency_count(&self) -> usize {
        self.package_files.iter().map(|file| file.dependencies.len()).sum()
    }
}

/// Parsers for every supported file kind
#[derive(Debug)]
pub struct Extractor {
    build_script_parser: BuildScriptParser,
    properties_parser: PropertiesParser,
    catalog_parser: CatalogParser,
}

impl Extractor {
    pub fn new(config: &Config) -> Self {
        Self {
            build_script_parser: BuildScriptParser::new()
                .with_registry_aliases(config.registry_aliases()),
            properties_parser: PropertiesParser::new(),
            catalog_parser: CatalogParser::new(),
        }
    }

    /// Parse one file with the parser for its kind
    pub fn parse_file(
        &self,
        kind: FileKind,
        content: &str,
        variables: &Variables,
        path: &Path,
    ) -> Result<Extraction, ParseError> {
        match kind {
            FileKind::Properties => self.properties_parser.parse(content, variables, path),
            FileKind::Catalog => self.catalog_parser.parse(content, variables, path),
            FileKind::SettingsScript | FileKind::BuildScript => {
                self.build_script_parser.parse(content, variables, path)
            }
        }
    }
}

/// Extract dependencies from a batch of Gradle files.
///
/// Each dependency is reported under the file holding its version text,
/// which for variable-backed versions is the file defining the variable.
/// Dependencies matching `config.ignore` are dropped. Every remaining
/// dependency gets its own repositories plus those declared in the batch,
/// or `config.registries.default_urls` when there are none.
pub fn extract_all_package_files(config: &Config, files: &[SourceFile]) -> ExtractReport {
    let extractor = Extractor::new(config);
    let mut ordered: Vec<&SourceFile> = files.iter().collect();
    ordered.sort_by(|a, b| processing_order(&a.path, &b.path));

    let mut registry = VariableRegistry::new();
    let mut report = ExtractReport::default();
    let mut dependencies = Vec::new();

    for file in ordered {
        let Some(kind) = FileKind::detect(&file.path) else {
            debug!("Skipping unsupported file {}", file.path.display());
            continue;
        };
        let dir = file.path.parent().unwrap_or(Path::new(""));
        let visible = registry.visible(dir);

        match extractor.parse_file(kind, &file.content, &visible, &file.path) {
            Ok(extraction) => {
                debug!(
                    "Extracted {} dependencies and {} variables from {}",
                    extraction.dependencies.len(),
                    extraction.variables.len(),
                    file.path.display()
                );
                registry.merge(dir, extraction.variables);
                report.registry_urls.extend(extraction.registry_urls);
                dependencies.extend(extraction.dependencies);
            }
            Err(e) => {
                warn!("Failed to parse {}: {e}", file.path.display());
                report.failed_files.push(FailedFile {
                    path: file.path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let mut index: HashMap<PathBuf, usize> = HashMap::new();
    for mut dependency in dependencies {
        if config.is_ignored(&dependency.name) {
            debug!("Ignoring {}", dependency.name);
            continue;
        }

        let mut urls: RegistryUrls = std::mem::take(&mut dependency.registry_urls)
            .into_iter()
            .collect();
        urls.extend(report.registry_urls.iter().cloned());
        if urls.is_empty() {
            urls.extend(config.registries.default_urls.iter().cloned());
        }
        dependency.registry_urls = urls.into_vec();

        let slot = *index
            .entry(dependency.source_file.clone())
            .or_insert_with(|| {
                report.package_files.push(PackageFile {
                    path: dependency.source_file.clone(),
                    kind: FileKind::detect(&dependency.source_file),
                    dependencies: Vec::new(),
                });
                report.package_files.len() - 1
            });
        report.package_files[slot].dependencies.push(dependency);
    }
    report
        .package_files
        .sort_by(|a, b| processing_order(&a.path, &b.path));

    report
}
