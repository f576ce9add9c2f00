/// Formats an approximate byte size the way quality buttons show it.
///
/// Whole megabytes when the size reaches 1 MB, whole kilobytes below that.
///
/// # Example
///
/// ```
/// use tubedrop::core::utils::format_approx_size;
///
/// assert_eq!(format_approx_size(12 * 1024 * 1024 + 5), "~12MB");
/// assert_eq!(format_approx_size(300 * 1024), "~300KB");
/// ```
pub fn format_approx_size(bytes: u64) -> String {
    let mb = bytes / (1024 * 1024);
    if mb > 0 {
        format!("~{}MB", mb)
    } else {
        format!("~{}KB", bytes / 1024)
    }
}

/// Formats a byte size in megabytes with one decimal, used in error messages.
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / (1024.0 * 1024.0))
}

/// Truncates a string to at most `max_chars` characters (not bytes).
///
/// When truncation happens the result ends with "..." and still fits in
/// `max_chars` characters.
///
/// # Example
///
/// ```
/// use tubedrop::core::utils::truncate_chars;
///
/// assert_eq!(truncate_chars("Привет, мир", 6), "При...");
/// assert_eq!(truncate_chars("short", 10), "short");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(3);
    let mut result: String = text.chars().take(keep).collect();
    result.push_str("...");
    result
}

/// Escapes `&`, `<` and `>` for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
