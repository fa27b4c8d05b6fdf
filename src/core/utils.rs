//! Small shared helpers.

/// Trims surrounding whitespace and caps the result to `max_chars`
/// characters. The cap counts Unicode scalar values, not bytes, so Cyrillic
/// input is not cut mid-character.
pub fn trim_to_chars(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => trimmed[..byte_idx].to_string(),
        None => trimmed.to_string(),
    }
}
