//! String utilities

/// Truncate a string to at most `max_chars` characters on a char boundary
///
/// # Example
/// ```
/// use hanzo_console_gateway::utils::truncate_str;
///
/// assert_eq!(truncate_str("pk-hz-0123456789", 6), "pk-hz-");
/// assert_eq!(truncate_str("short", 100), "short");
/// ```
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
