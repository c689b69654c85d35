//! Version replacement
//!
//! Splices a new version into file content at a dependency's
//! `file_replace_position`, after checking that the text found there is the
//! version that was extracted.

use tracing::debug;

use crate::parsers::Dependency;
use crate::parsers::coordinate::version_like_substring;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UpdateError {
    #[error("{0} has no replaceable version")]
    NotReplaceable(String),
    #[error("position {position} is outside the file")]
    OutOfBounds { position: usize },
    #[error("expected {expected:?} at position {position}, found {found:?}")]
    Mismatch {
        position: usize,
        expected: String,
        found: String,
    },
}

/// Replace the version of `dependency` in `content` with `new_value`.
///
/// Content already holding `new_value` at the position is returned as is.
pub fn update_dependency(
    content: &str,
    dependency: &Dependency,
    new_value: &str,
) -> Result<String, UpdateError> {
    let (Some(position), Some(current)) = (
        dependency.file_replace_position,
        dependency.current_value.as_deref(),
    ) else {
        return Err(UpdateError::NotReplaceable(dependency.name.clone()));
    };

    let rest = content
        .get(position..)
        .ok_or(UpdateError::OutOfBounds { position })?;

    if holds_at(rest, new_value) {
        return Ok(content.to_string());
    }
    if !holds_at(rest, current) {
        let found = version_like_substring(rest).unwrap_or_default();
        debug!(
            "Version mismatch for {} at {position}: expected {current:?}, found {found:?}",
            dependency.name
        );
        return Err(UpdateError::Mismatch {
            position,
            expected: current.to_string(),
            found: found.to_string(),
        });
    }

    let mut updated = String::with_capacity(content.len() + new_value.len());
    updated.push_str(&content[..position]);
    updated.push_str(new_value);
    updated.push_str(&rest[current.len()..]);
    Ok(updated)
}

/// `rest` starts with exactly `value`, not with a longer version sharing its prefix
fn holds_at(rest: &str, value: &str) -> bool {
    rest.strip_prefix(value)
        .is_some_and(|after| version_like_substring(after).is_none())
}
