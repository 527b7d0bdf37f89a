//! Utility functions for ZK services.

/// Number of characters (Unicode scalar values) in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Borrow at most the first `max_chars` characters of `s`.
///
/// Cuts on character boundaries, so multi-byte text (umlauts, emoji) is never split.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
