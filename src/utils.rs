//! Small string helpers shared by the report generators.

/// Truncates `s` to at most `max_chars` characters, ending with `...` when cut.
///
/// Counts characters rather than bytes, so multi-byte text is never split.
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }

    let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{truncated}...")
}
