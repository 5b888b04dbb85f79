//! Raw handler output truncation, ahead of whatever the context layer
//! does with the resulting tool_result.
//!
//! Handlers (in particular the shell handler) can produce arbitrarily
//! large stdout/stderr; this module caps that before it ever becomes a
//! tool_result, independent of the token-based caps the history/context
//! layer enforces on top.

/// Truncate a string at the nearest char boundary at or before
/// `max_bytes`. Returns a clone if `s` already fits.
pub fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end = end.saturating_sub(1);
    }
    s[..end].to_string()
}

/// Keep the first `n/2` and last `n/2` lines of `s`, joined by a
/// `(truncated)` marker, when `s` has more than `n` lines. A line count
/// at or below `n` is returned unchanged.
pub fn truncate_lines(s: &str, n: usize) -> String {
    let lines: Vec<&str> = s.lines().collect();
    if lines.len() <= n {
        return s.to_string();
    }
    let half = n / 2;
    let head = &lines[..half];
    let tail = &lines[lines.len() - half..];
    let omitted = lines.len() - head.len() - tail.len();
    format!(
        "{}\n… ({omitted} lines truncated) …\n{}",
        head.join("\n"),
        tail.join("\n")
    )
}

/// Apply both the byte cap and the line cap to raw handler output,
/// returning `(text, was_truncated)`.
pub fn truncate_output(s: &str, max_bytes: usize, max_lines: usize) -> (String, bool) {
    let line_capped = truncate_lines(s, max_lines);
    let byte_capped = truncate_at_char_boundary(&line_capped, max_bytes);
    let truncated = byte_capped.len() != s.len() || line_capped.len() != s.len();
    (byte_capped, truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_returned_unchanged() {
        assert_eq!(truncate_at_char_boundary("hello", 200), "hello");
    }

    #[test]
    fn multi_byte_boundary_not_split() {
        let mut s = "x".repeat(198);
        s.push('🦀');
        let result = truncate_at_char_boundary(&s, 200);
        assert_eq!(result, "x".repeat(198));
    }

    #[test]
    fn line_cap_keeps_head_and_tail() {
        let s = (0..10).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let result = truncate_lines(&s, 4);
        assert!(result.starts_with("0\n1"));
        assert!(result.ends_with("8\n9"));
        assert!(result.contains("truncated"));
    }

    #[test]
    fn within_caps_is_unmodified() {
        let (out, truncated) = truncate_output("small output", 1_000, 100);
        assert_eq!(out, "small output");
        assert!(!truncated);
    }

    #[test]
    fn over_byte_cap_is_flagged() {
        let s = "x".repeat(500);
        let (out, truncated) = truncate_output(&s, 100, 800);
        assert_eq!(out.len(), 100);
        assert!(truncated);
    }
}
