//! Configuration management for Dependi Gradle

use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use regex::Regex;
use serde::Deserialize;

use crate::parsers::MAVEN_CENTRAL;

/// Default patterns selecting Gradle files during a directory scan
const DEFAULT_FILE_MATCH: &[&str] = &[
    r"\.gradle(\.kts)?$",
    r"(^|/)gradle\.properties$",
    r"(^|/)gradle/.+\.toml$",
    r"\.versions\.toml$",
];

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid file_match pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Extraction configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Repository configuration
    pub registries: RegistriesConfig,
    /// File selection configuration
    pub files: FilesConfig,
    /// Dependencies to ignore (glob patterns)
    pub ignore: Vec<String>,
}

/// Repository configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistriesConfig {
    /// Extra repository shorthands (`companyRepo()` -> URL)
    pub aliases: HashMap<String, String>,
    /// Repositories assigned to dependencies when a project declares none
    pub default_urls: Vec<String>,
}

impl Default for RegistriesConfig {
    fn default() -> Self {
        Self {
            aliases: HashMap::new(),
            default_urls: vec![MAVEN_CENTRAL.to_string()],
        }
    }
}

/// File selection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Regexes matched against `/`-separated relative paths
    pub file_match: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            file_match: DEFAULT_FILE_MATCH.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FilesConfig {
    /// Compile the `file_match` patterns
    pub fn matcher(&self) -> Result<FileMatcher, ConfigError> {
        let patterns = self
            .file_match
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FileMatcher { patterns })
    }
}

/// Compiled `file_match` patterns
#[derive(Debug, Clone)]
pub struct FileMatcher {
    patterns: Vec<Regex>,
}

impl FileMatcher {
    pub fn matches(&self, path: &Path) -> bool {
        let path = path.to_string_lossy().replace('\\', "/");
        self.patterns.iter().any(|re| re.is_match(&path))
    }
}

impl Config {
    /// Parse configuration from a JSON value, falling back to defaults when invalid
    pub fn from_json(options: Option<serde_json::Value>) -> Self {
        match options {
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
            None => Self::default(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file; `.json` files are read as JSON, anything else as TOML
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// `<config dir>/dependi/gradle.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dependi").join("gradle.toml"))
    }

    /// Load `path` if given, else the default config file if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Whether a dependency name matches one of the `ignore` patterns.
    ///
    /// A pattern with `*` matches by prefix and suffix, anything else exactly.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|pattern| {
            if pattern.contains('*') {
                let parts: Vec<&str> = pattern.split('*').collect();
                if parts.len() == 2 {
                    name.starts_with(parts[0]) && name.ends_with(parts[1])
                } else {
                    name.starts_with(parts[0])
                }
            } else {
                name == pattern
            }
        })
    }

    /// Repository shorthands from config, as `(name, url)` pairs
    pub fn registry_aliases(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.registries
            .aliases
            .iter()
            .map(|(name, url)| (name.clone(), url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.registries.default_urls, vec![MAVEN_CENTRAL.to_string()]);
        assert!(config.registries.aliases.is_empty());
        assert_eq!(config.files.file_match.len(), DEFAULT_FILE_MATCH.len());
        assert!(config.ignore.is_empty());
    }

    #[test]
    fn test_parse_from_json() {
        let json = json!({
            "registries": {
                "aliases": { "companyRepo": "https://nexus.example.com/maven/" },
                "default_urls": ["https://mirror.example.com/maven2"]
            },
            "ignore": ["org.example:*", "junit:junit"]
        });

        let config = Config::from_json(Some(json));
        assert_eq!(
            config.registries.aliases.get("companyRepo").map(String::as_str),
            Some("https://nexus.example.com/maven/")
        );
        assert_eq!(
            config.registries.default_urls,
            vec!["https://mirror.example.com/maven2".to_string()]
        );
        assert_eq!(config.ignore.len(), 2);
    }

    #[test]
    fn test_partial_config() {
        let json = json!({ "ignore": ["a:b"] });
        let config = Config::from_json(Some(json));
        // Other fields should use defaults
        assert_eq!(config.registries.default_urls, vec![MAVEN_CENTRAL.to_string()]);
        assert_eq!(config.files.file_match.len(), DEFAULT_FILE_MATCH.len());
    }

    #[test]
    fn test_from_json_invalid() {
        let config = Config::from_json(Some(json!("invalid")));
        assert!(config.ignore.is_empty());
        assert!(Config::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml_str(
            r#"
ignore = ["com.android.tools.build:*"]

[registries]
default_urls = []

[registries.aliases]
internal = "https://repo.internal.example/maven"
"#,
        )
        .unwrap();
        assert!(config.registries.default_urls.is_empty());
        assert_eq!(config.registries.aliases.len(), 1);
        assert!(config.is_ignored("com.android.tools.build:gradle"));
    }

    #[test]
    fn test_from_toml_invalid() {
        let err = Config::from_toml_str("ignore = [").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("gradle.toml");
        std::fs::write(&toml_path, "ignore = [\"x:y\"]\n").unwrap();
        assert_eq!(Config::load(&toml_path).unwrap().ignore, vec!["x:y"]);

        let json_path = dir.path().join("gradle.json");
        std::fs::write(&json_path, r#"{"ignore": ["a:b"]}"#).unwrap();
        assert_eq!(Config::load(&json_path).unwrap().ignore, vec!["a:b"]);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(&missing),
            Err(ConfigError::Io { .. })
        ));
        assert!(Config::load_or_default(Some(missing.as_path())).is_err());
    }

    #[test]
    fn test_is_ignored() {
        let config = Config {
            ignore: vec![
                "org.example:*".to_string(),
                "*-bom".to_string(),
                "junit:junit".to_string(),
            ],
            ..Default::default()
        };
        assert!(config.is_ignored("org.example:lib"));
        assert!(config.is_ignored("io.micronaut:micronaut-bom"));
        assert!(config.is_ignored("junit:junit"));
        assert!(!config.is_ignored("junit:junit-dep"));
        assert!(!config.is_ignored("com.example:lib"));
    }

    #[test]
    fn test_file_matcher_defaults() {
        let matcher = FilesConfig::default().matcher().unwrap();
        assert!(matcher.matches(Path::new("build.gradle")));
        assert!(matcher.matches(Path::new("app/build.gradle.kts")));
        assert!(matcher.matches(Path::new("gradle.properties")));
        assert!(matcher.matches(Path::new("sub/gradle.properties")));
        assert!(matcher.matches(Path::new("gradle/libs.versions.toml")));
        assert!(matcher.matches(Path::new("gradle/deps.toml")));
        assert!(matcher.matches(Path::new("catalog/shared.versions.toml")));
        assert!(!matcher.matches(Path::new("Cargo.toml")));
        assert!(!matcher.matches(Path::new("my-gradle.properties")));
    }

    #[test]
    fn test_invalid_file_match() {
        let files = FilesConfig {
            file_match: vec!["(".to_string()],
        };
        assert!(matches!(
            files.matcher(),
            Err(ConfigError::Pattern { .. })
        ));
    }
}
