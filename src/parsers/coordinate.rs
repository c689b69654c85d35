//! Maven coordinate helpers: `group:artifact:version[@classifier]`

use std::sync::LazyLock;

use regex::Regex;

static ARTIFACT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][-_a-zA-Z0-9]*(?:\.[a-zA-Z0-9][-_a-zA-Z0-9]*?)*$")
        .expect("artifact regex is valid")
});

static VERSION_LIKE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<version>[-.\[\](),a-zA-Z0-9+_]+)").expect("version regex is valid")
});

/// A parsed dependency string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate<'a> {
    pub group: &'a str,
    pub artifact: &'a str,
    pub version: &'a str,
    /// Text after `@`, e.g. `aar`
    pub data_type: Option<&'a str>,
}

impl Coordinate<'_> {
    /// `group:artifact`
    pub fn name(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// Byte offset of the version inside the dependency string
    pub fn version_offset(&self) -> usize {
        self.group.len() + self.artifact.len() + 2
    }
}

/// Whether `name` is a valid group id or artifact id
pub fn is_artifact_name(name: &str) -> bool {
    ARTIFACT_REGEX.is_match(name)
}

/// Longest prefix of `input` made of characters that can appear in a version
/// or version range (`1.0`, `[1.0,2.0)`, `1.0-rc+build`).
pub fn version_like_substring(input: &str) -> Option<&str> {
    VERSION_LIKE_REGEX
        .captures(input)
        .and_then(|caps| caps.name("version"))
        .map(|m| m.as_str())
}

pub fn is_version_like(input: &str) -> bool {
    version_like_substring(input) == Some(input)
}

/// Parse `group:artifact:version` with an optional `@classifier` suffix
pub fn parse_dependency_string(input: &str) -> Option<Coordinate<'_>> {
    let mut parts = input.split(':');
    let (Some(group), Some(artifact), Some(version_part), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let (version, data_type) = match version_part.split_once('@') {
        Some((version, data_type)) => {
            if data_type.is_empty() || data_type.contains('@') {
                return None;
            }
            (version, Some(data_type))
        }
        None => (version_part, None),
    };

    if !is_artifact_name(group) || !is_artifact_name(artifact) || !is_version_like(version) {
        return None;
    }
    if data_type.is_some_and(|t| !t.bytes().all(|b| b.is_ascii_alphanumeric())) {
        return None;
    }

    Some(Coordinate {
        group,
        artifact,
        version,
        data_type,
    })
}

/// Split a `group:artifact:` prefix, as found before an interpolated version
pub fn parse_coordinate_prefix(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_suffix(':')?;
    let (group, artifact) = rest.split_once(':')?;
    (is_artifact_name(group) && is_artifact_name(artifact)).then_some((group, artifact))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dependency_string() {
        let coordinate = parse_dependency_string("org.jetbrains.kotlin:kotlin-stdlib:1.9.22").unwrap();
        assert_eq!(coordinate.group, "org.jetbrains.kotlin");
        assert_eq!(coordinate.artifact, "kotlin-stdlib");
        assert_eq!(coordinate.version, "1.9.22");
        assert_eq!(coordinate.data_type, None);
        assert_eq!(coordinate.name(), "org.jetbrains.kotlin:kotlin-stdlib");
        assert_eq!(coordinate.version_offset(), "org.jetbrains.kotlin:kotlin-stdlib:".len());
    }

    #[test]
    fn test_parse_dependency_string_with_classifier() {
        let coordinate = parse_dependency_string("com.example:widget:2.0@aar").unwrap();
        assert_eq!(coordinate.version, "2.0");
        assert_eq!(coordinate.data_type, Some("aar"));

        assert!(parse_dependency_string("com.example:widget:2.0@").is_none());
        assert!(parse_dependency_string("com.example:widget:2.0@a@b").is_none());
    }

    fn is_dependency_string(input: &str) -> bool {
        parse_dependency_string(input).is_some()
    }

    #[test]
    fn test_version_ranges_are_accepted() {
        assert!(is_dependency_string("g:a:[1.0,2.0)"));
        assert!(is_dependency_string("g:a:1.0.0-SNAPSHOT"));
        assert!(is_dependency_string("g:a:1.0+build.5"));
        assert!(is_dependency_string("g:a:1.0_1"));
        assert!(is_version_like("2.0_beta"));
    }

    #[test]
    fn test_rejects_non_coordinates() {
        assert!(!is_dependency_string("g:a"));
        assert!(!is_dependency_string("g:a:1.0:extra"));
        assert!(!is_dependency_string("g:a:"));
        assert!(!is_dependency_string("g:a:$version"));
        assert!(!is_dependency_string("https://example.com:8080/x"));
        assert!(!is_dependency_string("1g:a:1.0"));
        assert!(!is_dependency_string("hello world"));
    }

    #[test]
    fn test_version_like_substring() {
        assert_eq!(version_like_substring("1.2.3' // comment"), Some("1.2.3"));
        assert_eq!(version_like_substring("[1.0,2.0)\""), Some("[1.0,2.0)"));
        assert_eq!(version_like_substring("\"1.0\""), None);
        assert!(is_version_like("1.0-rc1"));
        assert!(!is_version_like("1.0 beta"));
    }

    #[test]
    fn test_artifact_names() {
        assert!(is_artifact_name("org.example"));
        assert!(is_artifact_name("kotlin-stdlib-jdk8"));
        assert!(is_artifact_name("my_lib.v2"));
        assert!(!is_artifact_name(""));
        assert!(!is_artifact_name("-lib"));
        assert!(!is_artifact_name("org..example"));
    }

    #[test]
    fn test_parse_coordinate_prefix() {
        assert_eq!(
            parse_coordinate_prefix("org.example:lib:"),
            Some(("org.example", "lib"))
        );
        assert_eq!(parse_coordinate_prefix("org.example:lib"), None);
        assert_eq!(parse_coordinate_prefix("a:b:c:"), None);
    }
}
