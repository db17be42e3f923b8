//! Input preparation shared by all capabilities.

/// Longest free-text input forwarded to the service, in characters.
pub const MAX_INPUT_CHARS: usize = 2000;

/// Trim surrounding whitespace and cut to [`MAX_INPUT_CHARS`] characters.
///
/// Truncation is silent and never splits a character.
pub fn trim_input(text: &str) -> String {
    text.trim().chars().take(MAX_INPUT_CHARS).collect()
}
