//! Parser for `gradle.properties` files

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::coordinate::parse_dependency_string;
use super::{Dependency, Extraction, ParseError, Parser, Variable, Variables};

static PROPERTY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?P<leftPart>\s*(?P<key>[a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*[= :]\s*['"]?)(?P<value>[^\s'"]+)['"]?\s*$"#,
    )
    .expect("property regex is valid")
});

/// Parser for Java-style `key=value` property files
#[derive(Debug, Default)]
pub struct PropertiesParser;

impl PropertiesParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for PropertiesParser {
    fn parse(
        &self,
        content: &str,
        _variables: &Variables,
        source_file: &Path,
    ) -> Result<Extraction, ParseError> {
        Ok(extract_properties_file(content, source_file))
    }
}

/// Extract variables and dependency coordinates from a properties file.
///
/// Values shaped like `group:artifact:version` become dependencies; every
/// other single-token value becomes a variable. Offsets are byte offsets in
/// `content`, so CRLF line endings are accounted for.
pub fn extract_properties_file(content: &str, source_file: &Path) -> Extraction {
    let mut extraction = Extraction::default();

    let mut line_start = 0;
    for raw_line in content.split_inclusive('\n') {
        let offset = line_start;
        line_start += raw_line.len();

        let line = raw_line
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(raw_line);
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let Some(caps) = PROPERTY_LINE.captures(line) else {
            continue;
        };
        let (Some(key), Some(value)) = (caps.name("key"), caps.name("value")) else {
            continue;
        };
        let position = offset + value.start();

        match parse_dependency_string(value.as_str()) {
            Some(coordinate) => {
                let mut dependency = Dependency::new(coordinate.name(), source_file)
                    .with_version(coordinate.version, position + coordinate.version_offset());
                dependency.data_type = coordinate.data_type.map(str::to_string);
                extraction.dependencies.push(dependency);
            }
            None => extraction.variables.push(Variable {
                key: key.as_str().to_string(),
                value: value.as_str().to_string(),
                file_replace_position: position,
                source_file: source_file.to_path_buf(),
            }),
        }
    }

    extraction
}
