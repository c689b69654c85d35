//! Variable lookup and single-pass string interpolation

use super::tokenizer::{Token, TokenKind};
use super::{Variable, Variables};

/// Scope qualifiers Gradle scripts put in front of extra properties
const SCOPE_PREFIXES: &[&str] = &[
    "project.ext.",
    "rootProject.ext.",
    "project.extra.",
    "rootProject.extra.",
    "project.",
    "rootProject.",
    "ext.",
    "extra.",
];

/// Strip a leading scope qualifier (`project.ext.foo` -> `foo`)
pub fn strip_scope(name: &str) -> &str {
    SCOPE_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(name)
}

/// Look up a variable, retrying without a scope qualifier
pub fn lookup<'v>(variables: &'v Variables, name: &str) -> Option<&'v Variable> {
    variables.get(name).or_else(|| {
        let stripped = strip_scope(name);
        (stripped != name)
            .then(|| variables.get(stripped))
            .flatten()
    })
}

/// Concatenate interpolation children.
///
/// Returns `None` unless every variable reference resolves. Resolved values
/// are inserted as-is and never scanned again.
pub fn interpolate(children: &[Token], variables: &Variables) -> Option<String> {
    let mut resolved = String::new();
    for child in children {
        match child.kind {
            TokenKind::String => resolved.push_str(&child.value),
            TokenKind::Variable => resolved.push_str(&lookup(variables, &child.value)?.value),
            _ => return None,
        }
    }
    Some(resolved)
}

/// Resolve the text a value token stands for
pub fn resolve_token(token: &Token, variables: &Variables) -> Option<String> {
    match token.kind {
        TokenKind::String => Some(token.value.clone()),
        TokenKind::Word => lookup(variables, &token.value).map(|v| v.value.clone()),
        TokenKind::StringInterpolation => {
            let interpolation = token.interpolation.as_ref()?;
            if !interpolation.is_valid || !interpolation.is_complete {
                return None;
            }
            interpolate(&interpolation.children, variables)
        }
        _ => None,
    }
}
