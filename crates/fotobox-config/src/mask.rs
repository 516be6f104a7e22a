//! File-name masks: paths with a single `{}` placeholder.

const PLACEHOLDER: &str = "{}";

/// Substitute `value` for the first `{}` in `mask`.
///
/// A mask without placeholder is returned unchanged.
pub fn format_mask(mask: &str, value: impl std::fmt::Display) -> String {
    mask.replacen(PLACEHOLDER, &value.to_string(), 1)
}

/// Glob pattern matching every file a mask can produce.
pub fn glob_pattern(mask: &str) -> String {
    format_mask(mask, "*")
}
