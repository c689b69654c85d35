//! Handlers turning matched idioms into dependencies, variables and registry URLs
//!
//! Handlers never fail. Anything they cannot resolve becomes a dependency with
//! a [`SkipReason`], or is dropped when it does not look like a dependency at all.

use std::ops::Range;
use std::path::Path;

use hashbrown::HashMap;
use tracing::debug;
use url::Url;

use super::coordinate::{
    Coordinate, is_artifact_name, is_version_like, parse_coordinate_prefix,
    parse_dependency_string,
};
use super::interpolation::{lookup, resolve_token, strip_scope};
use super::matcher::{Capture, Captures};
use super::tokenizer::{Token, TokenKind};
use super::{Dependency, SkipReason, Variable, Variables};

/// Read-only state shared by handlers during one build script parse
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    /// Variables visible at the current position
    pub variables: &'a Variables,
    pub source_file: &'a Path,
    /// Repository shorthand name to URL
    pub registry_aliases: &'a HashMap<String, String>,
}

/// What a handler contributes to the extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutput {
    pub dependencies: Vec<Dependency>,
    pub variables: Vec<Variable>,
    pub registry_urls: Vec<String>,
}

impl HandlerOutput {
    fn dependency(dependency: Dependency) -> Self {
        Self {
            dependencies: vec![dependency],
            ..Self::default()
        }
    }

    fn registry_url(url: String) -> Self {
        Self {
            registry_urls: vec![url],
            ..Self::default()
        }
    }
}

impl From<Option<Dependency>> for HandlerOutput {
    fn from(dependency: Option<Dependency>) -> Self {
        dependency.map(Self::dependency).unwrap_or_default()
    }
}

/// `key = 'value'`, `set('key', 'value')`, `extra["key"] = "value"`, `val key by extra("value")`
pub fn handle_assignment(captures: &Captures<'_>, ctx: &HandlerContext<'_>) -> HandlerOutput {
    let (Some(key), Some(value)) = (captures.get(Capture::Key), captures.get(Capture::Value))
    else {
        return HandlerOutput::default();
    };
    assign(&key.value, value, ctx)
}

/// `ext.key = 'value'`, `project.ext.key = 'value'`
pub fn handle_dotted_assignment(
    captures: &Captures<'_>,
    ctx: &HandlerContext<'_>,
) -> HandlerOutput {
    let Some(value) = captures.get(Capture::Value) else {
        return HandlerOutput::default();
    };
    let key: String = captures
        .tokens()
        .iter()
        .take_while(|token| token.kind != TokenKind::Assignment)
        .map(|token| token.value.as_str())
        .collect();
    assign(&key, value, ctx)
}

fn assign(key: &str, value: &Token, ctx: &HandlerContext<'_>) -> HandlerOutput {
    let key = strip_scope(key);
    if key == "url" {
        return custom_registry(value, ctx);
    }

    let mut output = HandlerOutput::default();
    if let Some(coordinate) = parse_dependency_string(&value.value) {
        let mut dependency = literal_dependency(&coordinate, value, ctx.source_file);
        dependency.group_name = Some(key.to_string());
        output.dependencies.push(dependency);
    }
    output.variables.push(Variable {
        key: key.to_string(),
        value: value.value.clone(),
        file_replace_position: value.offset,
        source_file: ctx.source_file.to_path_buf(),
    });
    output
}

/// `'group:artifact:version'`
pub fn handle_dependency_string(
    captures: &Captures<'_>,
    ctx: &HandlerContext<'_>,
) -> HandlerOutput {
    captures
        .get(Capture::Value)
        .and_then(|token| {
            parse_dependency_string(&token.value)
                .map(|coordinate| literal_dependency(&coordinate, token, ctx.source_file))
        })
        .into()
}

/// `"group:artifact:$version"` and other interpolated coordinates
pub fn handle_dependency_interpolation(
    captures: &Captures<'_>,
    ctx: &HandlerContext<'_>,
) -> HandlerOutput {
    let Some(token) = captures.get(Capture::Value) else {
        return HandlerOutput::default();
    };
    let Some(interpolation) = token.interpolation.as_ref() else {
        return HandlerOutput::default();
    };

    if interpolation.is_valid
        && interpolation.is_complete
        && let Some(dependency) = resolved_interpolation(token, ctx)
    {
        return HandlerOutput::dependency(dependency);
    }
    unresolved_interpolation(token, ctx.source_file).into()
}

/// Where a resolved interpolation piece came from
struct Piece<'a> {
    resolved: Range<usize>,
    child: &'a Token,
    variable: Option<&'a Variable>,
}

fn resolved_interpolation(token: &Token, ctx: &HandlerContext<'_>) -> Option<Dependency> {
    let mut resolved = String::new();
    let mut pieces = Vec::with_capacity(token.children().len());
    for child in token.children() {
        let start = resolved.len();
        let variable = match child.kind {
            TokenKind::String => {
                resolved.push_str(&child.value);
                None
            }
            TokenKind::Variable => {
                let variable = lookup(ctx.variables, &child.value)?;
                resolved.push_str(&variable.value);
                Some(variable)
            }
            _ => return None,
        };
        pieces.push(Piece {
            resolved: start..resolved.len(),
            child,
            variable,
        });
    }

    let coordinate = parse_dependency_string(&resolved)?;
    let version_start = coordinate.version_offset();
    let version_end = version_start + coordinate.version.len();
    let mut dependency = Dependency::new(coordinate.name(), ctx.source_file);
    dependency.data_type = coordinate.data_type.map(str::to_string);

    let owner = pieces
        .iter()
        .find(|piece| piece.resolved.start <= version_start && version_end <= piece.resolved.end);
    let dependency = match owner {
        Some(Piece {
            resolved: range,
            variable: Some(variable),
            ..
        }) => {
            let position = variable.file_replace_position + (version_start - range.start);
            Dependency {
                source_file: variable.source_file.clone(),
                group_name: Some(variable.key.clone()),
                ..dependency.with_version(coordinate.version, position)
            }
        }
        Some(Piece {
            resolved: range,
            child,
            variable: None,
        }) if child.is_verbatim() => {
            dependency.with_version(coordinate.version, child.offset + version_start - range.start)
        }
        Some(_) => escaped(dependency.with_version(coordinate.version, 0)),
        None => {
            // The version spans several pieces: point at the one it starts in
            let position = pieces
                .iter()
                .find(|piece| version_start < piece.resolved.end)
                .map_or(token.offset, |piece| piece_position(piece, version_start));
            dependency
                .with_version(coordinate.version, position)
                .skipped(SkipReason::ContainsVariable)
        }
    };
    Some(dependency)
}

fn piece_position(piece: &Piece<'_>, resolved_offset: usize) -> usize {
    match piece.variable {
        Some(_) => piece.child.span.start,
        None if piece.child.is_verbatim() => {
            piece.child.offset + resolved_offset - piece.resolved.start
        }
        None => piece.child.offset,
    }
}

/// Keep a record for `"group:artifact:${...}"` even when the version cannot be resolved
fn unresolved_interpolation(token: &Token, source_file: &Path) -> Option<Dependency> {
    let first = token.children().first()?;
    if first.kind != TokenKind::String {
        return None;
    }
    let (group, artifact) = parse_coordinate_prefix(&first.value)?;
    let raw_version = token.value.get(first.span.end - token.offset..)?;
    debug!(
        "Unresolved version for {group}:{artifact} in {}",
        source_file.display()
    );
    Some(
        Dependency::new(format!("{group}:{artifact}"), source_file)
            .with_version(raw_version, first.span.end)
            .skipped(SkipReason::ContainsVariable),
    )
}

/// `id 'x' version 'v'`, `id("x") version "v"`, `kotlin("jvm") version "v"`
pub fn handle_plugin(captures: &Captures<'_>, ctx: &HandlerContext<'_>) -> HandlerOutput {
    let (Some(name), Some(version)) = (
        captures.get(Capture::PluginName),
        captures.get(Capture::PluginVersion),
    ) else {
        return HandlerOutput::default();
    };
    let id = match captures.get(Capture::MethodName) {
        Some(method) if method.value == "kotlin" => format!("org.jetbrains.kotlin.{}", name.value),
        _ => name.value.clone(),
    };
    let dependency = Dependency::plugin(id, ctx.source_file);
    HandlerOutput::dependency(version_dependency(dependency, version, ctx))
}

/// `group: 'g', name: 'a', version: 'v'` and its named and positional variants
pub fn handle_long_form(captures: &Captures<'_>, ctx: &HandlerContext<'_>) -> HandlerOutput {
    let (Some(group), Some(artifact), Some(version)) = (
        captures.get(Capture::GroupId),
        captures.get(Capture::ArtifactId),
        captures.get(Capture::Version),
    ) else {
        return HandlerOutput::default();
    };
    let (Some(group), Some(artifact)) = (
        resolve_token(group, ctx.variables),
        resolve_token(artifact, ctx.variables),
    ) else {
        return HandlerOutput::default();
    };
    if !is_artifact_name(&group) || !is_artifact_name(&artifact) {
        return HandlerOutput::default();
    }
    if version.kind == TokenKind::String && !is_version_like(&version.value) {
        debug!("Ignoring {group}:{artifact} with version {:?}", version.value);
        return HandlerOutput::default();
    }

    let dependency = Dependency::new(format!("{group}:{artifact}"), ctx.source_file);
    HandlerOutput::dependency(version_dependency(dependency, version, ctx))
}

/// `url 'u'`, `url = uri('u')`, `maven('u')`, ...
pub fn handle_custom_registry(
    captures: &Captures<'_>,
    ctx: &HandlerContext<'_>,
) -> HandlerOutput {
    match captures.get(Capture::RegistryUrl) {
        Some(token) => custom_registry(token, ctx),
        None => HandlerOutput::default(),
    }
}

fn custom_registry(token: &Token, ctx: &HandlerContext<'_>) -> HandlerOutput {
    let Some(url) = resolve_token(token, ctx.variables) else {
        debug!("Unresolved registry URL {:?}", token.value);
        return HandlerOutput::default();
    };
    match Url::parse(&url) {
        Ok(parsed) if parsed.has_host() => HandlerOutput::registry_url(url),
        _ => {
            debug!("Ignoring registry URL {url:?}");
            HandlerOutput::default()
        }
    }
}

/// `mavenCentral()`, `google { ... }`
pub fn handle_predefined_registry(
    captures: &Captures<'_>,
    ctx: &HandlerContext<'_>,
) -> HandlerOutput {
    captures
        .get(Capture::MethodName)
        .and_then(|name| ctx.registry_aliases.get(&name.value))
        .map(|url| HandlerOutput::registry_url(url.clone()))
        .unwrap_or_default()
}

fn literal_dependency(coordinate: &Coordinate<'_>, token: &Token, source_file: &Path) -> Dependency {
    let mut dependency = Dependency::new(coordinate.name(), source_file)
        .with_version(coordinate.version, token.offset + coordinate.version_offset());
    dependency.data_type = coordinate.data_type.map(str::to_string);
    if token.is_verbatim() {
        dependency
    } else {
        escaped(dependency)
    }
}

/// Offsets inside an escaped string do not map back to the source, so the
/// version is reported but never rewritten
fn escaped(dependency: Dependency) -> Dependency {
    debug!("Escaped version for {} is not replaceable", dependency.name);
    Dependency {
        file_replace_position: None,
        ..dependency.skipped(SkipReason::UnknownVersion)
    }
}

/// Point the dependency at the text of the variable holding its version
fn from_variable(dependency: Dependency, variable: &Variable) -> Dependency {
    Dependency {
        current_value: Some(variable.value.clone()),
        file_replace_position: Some(variable.file_replace_position),
        source_file: variable.source_file.clone(),
        group_name: Some(variable.key.clone()),
        ..dependency
    }
}

/// Attach the version given by a literal, a variable reference or an interpolation
fn version_dependency(
    dependency: Dependency,
    version: &Token,
    ctx: &HandlerContext<'_>,
) -> Dependency {
    match version.kind {
        TokenKind::String if version.value.is_empty() => dependency.skipped(SkipReason::NoVersion),
        TokenKind::String if version.is_verbatim() => {
            dependency.with_version(&version.value, version.offset)
        }
        TokenKind::String => escaped(dependency.with_version(&version.value, version.offset)),
        TokenKind::Word => match lookup(ctx.variables, &version.value) {
            Some(variable) => from_variable(dependency, variable),
            None => dependency
                .with_version(&version.value, version.offset)
                .skipped(SkipReason::UnknownVersion),
        },
        TokenKind::StringInterpolation => {
            if let [child] = version.children()
                && child.kind == TokenKind::Variable
                && let Some(variable) = lookup(ctx.variables, &child.value)
            {
                return from_variable(dependency, variable);
            }
            let value = resolve_token(version, ctx.variables).unwrap_or_else(|| version.value.clone());
            dependency
                .with_version(value, version.offset)
                .skipped(SkipReason::ContainsVariable)
        }
        _ => dependency.skipped(SkipReason::UnknownVersion),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::parsers::matcher::match_first;
    use crate::parsers::tokenizer::significant_tokens;
    use crate::parsers::{BUILTIN_REGISTRY_ALIASES, DependencyType, GRADLE_PLUGIN_PORTAL};

    fn aliases() -> HashMap<String, String> {
        BUILTIN_REGISTRY_ALIASES
            .iter()
            .map(|(name, url)| (name.to_string(), url.to_string()))
            .collect()
    }

    fn variable(key: &str, value: &str, position: usize, file: &str) -> (String, Variable) {
        (
            key.to_string(),
            Variable {
                key: key.to_string(),
                value: value.to_string(),
                file_replace_position: position,
                source_file: PathBuf::from(file),
            },
        )
    }

    fn run(input: &str, variables: &Variables) -> HandlerOutput {
        let tokens = significant_tokens(input);
        let aliases = aliases();
        let ctx = HandlerContext {
            variables,
            source_file: Path::new("build.gradle"),
            registry_aliases: &aliases,
        };
        let (pattern, captures) = match_first(&tokens).expect("pattern should match");
        (pattern.handler)(&captures, &ctx)
    }

    #[test]
    fn test_literal_dependency_offset() {
        let input = "'org.example:lib:1.2.3@aar'";
        let output = run(input, &Variables::new());
        let dep = &output.dependencies[0];
        assert_eq!(dep.name, "org.example:lib");
        assert_eq!(dep.current_value.as_deref(), Some("1.2.3"));
        assert_eq!(dep.data_type.as_deref(), Some("aar"));
        assert_eq!(dep.file_replace_position, input.find("1.2.3"));
    }

    #[test]
    fn test_non_dependency_string_is_ignored() {
        assert_eq!(run("'hello'", &Variables::new()), HandlerOutput::default());
    }

    #[test]
    fn test_assignment_registers_variable() {
        let input = "kotlinVersion = '1.9.0'";
        let output = run(input, &Variables::new());
        assert!(output.dependencies.is_empty());
        assert_eq!(output.variables.len(), 1);
        assert_eq!(output.variables[0].key, "kotlinVersion");
        assert_eq!(output.variables[0].value, "1.9.0");
        assert_eq!(
            output.variables[0].file_replace_position,
            input.find("1.9.0").unwrap()
        );
    }

    #[test]
    fn test_assignment_of_dependency_string() {
        let input = "ext.junit = 'junit:junit:4.13.2'";
        let output = run(input, &Variables::new());
        assert_eq!(output.variables[0].key, "junit");
        let dep = &output.dependencies[0];
        assert_eq!(dep.name, "junit:junit");
        assert_eq!(dep.group_name.as_deref(), Some("junit"));
        assert_eq!(dep.file_replace_position, input.find("4.13.2"));
    }

    #[test]
    fn test_url_assignment_is_a_registry() {
        let output = run("url = 'https://repo.example.com/maven'", &Variables::new());
        assert!(output.variables.is_empty());
        assert_eq!(output.registry_urls, vec!["https://repo.example.com/maven"]);
    }

    #[test]
    fn test_interpolated_version_points_at_variable() {
        let variables: Variables = [variable("libVersion", "2.0", 42, "gradle.properties")]
            .into_iter()
            .collect();
        let output = run("\"org.example:lib:$libVersion\"", &variables);
        let dep = &output.dependencies[0];
        assert_eq!(dep.current_value.as_deref(), Some("2.0"));
        assert_eq!(dep.file_replace_position, Some(42));
        assert_eq!(dep.source_file, PathBuf::from("gradle.properties"));
        assert_eq!(dep.group_name.as_deref(), Some("libVersion"));
        assert!(dep.skip_reason.is_none());
    }

    #[test]
    fn test_interpolated_group_with_literal_version() {
        let variables: Variables = [variable("group", "org.example", 0, "build.gradle")]
            .into_iter()
            .collect();
        let input = "\"${group}:lib:3.1\"";
        let output = run(input, &variables);
        let dep = &output.dependencies[0];
        assert_eq!(dep.name, "org.example:lib");
        assert_eq!(dep.current_value.as_deref(), Some("3.1"));
        assert_eq!(dep.file_replace_position, input.find("3.1"));
        assert!(dep.skip_reason.is_none());
    }

    #[test]
    fn test_composite_version_contains_variable() {
        let variables: Variables = [variable("major", "1", 0, "build.gradle")]
            .into_iter()
            .collect();
        let input = "\"org.example:lib:$major.0\"";
        let output = run(input, &variables);
        let dep = &output.dependencies[0];
        assert_eq!(dep.current_value.as_deref(), Some("1.0"));
        assert_eq!(dep.skip_reason, Some(SkipReason::ContainsVariable));
        assert_eq!(dep.file_replace_position, input.find("$major"));
    }

    #[test]
    fn test_composite_version_starting_in_literal() {
        let variables: Variables = [variable("patch", "3", 0, "build.gradle")]
            .into_iter()
            .collect();
        let input = "\"org.example:lib:1.2.${patch}\"";
        let output = run(input, &variables);
        let dep = &output.dependencies[0];
        assert_eq!(dep.current_value.as_deref(), Some("1.2.3"));
        assert_eq!(dep.skip_reason, Some(SkipReason::ContainsVariable));
        assert_eq!(dep.file_replace_position, input.find("1.2."));
    }

    #[test]
    fn test_escaped_dependency_string_is_not_replaceable() {
        let output = run(r"'org\.example:lib:1.2.3'", &Variables::new());
        let dep = &output.dependencies[0];
        assert_eq!(dep.name, "org.example:lib");
        assert_eq!(dep.current_value.as_deref(), Some("1.2.3"));
        assert_eq!(dep.file_replace_position, None);
        assert_eq!(dep.skip_reason, Some(SkipReason::UnknownVersion));
    }

    #[test]
    fn test_escaped_literal_piece_is_not_replaceable() {
        let variables: Variables = [variable("group", "org.example", 0, "build.gradle")]
            .into_iter()
            .collect();
        let output = run(r#""${group}:lib\u002d:1.0""#, &variables);
        let dep = &output.dependencies[0];
        assert_eq!(dep.name, "org.example:lib-");
        assert_eq!(dep.file_replace_position, None);
        assert_eq!(dep.skip_reason, Some(SkipReason::UnknownVersion));
    }

    #[test]
    fn test_escaped_plugin_version_is_not_replaceable() {
        let output = run(r"id 'org.example.tool' version '1.0\-rc'", &Variables::new());
        let dep = &output.dependencies[0];
        assert_eq!(dep.current_value.as_deref(), Some("1.0-rc"));
        assert_eq!(dep.file_replace_position, None);
        assert_eq!(dep.skip_reason, Some(SkipReason::UnknownVersion));
    }

    #[test]
    fn test_unresolved_interpolation_keeps_record() {
        let input = "\"org.example:lib:$missing\"";
        let output = run(input, &Variables::new());
        let dep = &output.dependencies[0];
        assert_eq!(dep.name, "org.example:lib");
        assert_eq!(dep.current_value.as_deref(), Some("$missing"));
        assert_eq!(dep.file_replace_position, input.find("$missing"));
        assert_eq!(dep.skip_reason, Some(SkipReason::ContainsVariable));
    }

    #[test]
    fn test_unresolved_interpolation_without_prefix_is_dropped() {
        let output = run("\"$who:lib:1.0\"", &Variables::new());
        assert!(output.dependencies.is_empty());
    }

    #[test]
    fn test_plugin_literal_version() {
        let input = "id 'org.example.tool' version '0.4.0'";
        let output = run(input, &Variables::new());
        let dep = &output.dependencies[0];
        assert_eq!(dep.name, "org.example.tool");
        assert_eq!(dep.dep_type, DependencyType::Plugin);
        assert_eq!(dep.registry_urls, vec![GRADLE_PLUGIN_PORTAL.to_string()]);
        assert_eq!(dep.file_replace_position, input.find("0.4.0"));
    }

    #[test]
    fn test_kotlin_plugin_shorthand() {
        let output = run("kotlin(\"jvm\") version \"1.9.22\"", &Variables::new());
        assert_eq!(output.dependencies[0].name, "org.jetbrains.kotlin.jvm");
        assert_eq!(
            output.dependencies[0].package_name.as_deref(),
            Some("org.jetbrains.kotlin.jvm:org.jetbrains.kotlin.jvm.gradle.plugin")
        );
    }

    #[test]
    fn test_plugin_unknown_word_version() {
        let input = "id(\"org.example\") version someVersion";
        let output = run(input, &Variables::new());
        let dep = &output.dependencies[0];
        assert_eq!(dep.skip_reason, Some(SkipReason::UnknownVersion));
        assert_eq!(dep.current_value.as_deref(), Some("someVersion"));
        assert_eq!(dep.file_replace_position, input.find("someVersion"));
    }

    #[test]
    fn test_plugin_variable_version() {
        let variables: Variables = [variable("toolVersion", "5.0", 7, "gradle.properties")]
            .into_iter()
            .collect();
        let output = run("id 'org.example' version toolVersion", &variables);
        let dep = &output.dependencies[0];
        assert_eq!(dep.current_value.as_deref(), Some("5.0"));
        assert_eq!(dep.file_replace_position, Some(7));
        assert_eq!(dep.source_file, PathBuf::from("gradle.properties"));
    }

    #[test]
    fn test_long_form_named_arguments() {
        let input = "group: 'org.example', name: 'lib', version: '1.0.0'";
        let output = run(input, &Variables::new());
        let dep = &output.dependencies[0];
        assert_eq!(dep.name, "org.example:lib");
        assert_eq!(dep.file_replace_position, input.find("1.0.0"));
    }

    #[test]
    fn test_long_form_rejects_non_version() {
        let output = run("foo('org.example', 'lib', 'not a version')", &Variables::new());
        assert!(output.dependencies.is_empty());
    }

    #[test]
    fn test_predefined_registry() {
        let output = run("google()", &Variables::new());
        assert_eq!(output.registry_urls, vec!["https://dl.google.com/android/maven2/"]);
        let output = run("unknownRepo()", &Variables::new());
        assert!(output.registry_urls.is_empty());
    }

    #[test]
    fn test_custom_registry_requires_host() {
        let output = run("maven('https://repo.example.com/releases')", &Variables::new());
        assert_eq!(output.registry_urls, vec!["https://repo.example.com/releases"]);
        let output = run("maven('not a url')", &Variables::new());
        assert!(output.registry_urls.is_empty());
    }

    #[test]
    fn test_interpolated_registry_url() {
        let variables: Variables = [variable("repoHost", "repo.example.com", 0, "build.gradle")]
            .into_iter()
            .collect();
        let output = run("url \"https://$repoHost/maven\"", &variables);
        assert_eq!(output.registry_urls, vec!["https://repo.example.com/maven"]);
    }
}
