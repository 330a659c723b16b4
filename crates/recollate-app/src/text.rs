//! Small text utilities shared by extraction and diagnostics.

/// Collapses runs of whitespace and strips control characters that PDF text
/// extraction tends to leak.
pub fn cleanup_text(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut last_was_space = true;
    for ch in raw.chars() {
        if ch == '\n' {
            // Line structure carries layout signal (footers, lone numbers);
            // keep single newlines, collapse the rest.
            if cleaned.ends_with('\n') {
                continue;
            }
            while cleaned.ends_with(' ') {
                cleaned.pop();
            }
            cleaned.push('\n');
            last_was_space = true;
        } else if ch.is_whitespace() {
            if !last_was_space {
                cleaned.push(' ');
                last_was_space = true;
            }
        } else if !ch.is_control() {
            cleaned.push(ch);
            last_was_space = false;
        }
    }
    while cleaned.ends_with(|c: char| c.is_whitespace()) {
        cleaned.pop();
    }
    cleaned
}

/// First `max_chars` characters, with an ellipsis when truncated. Char-based
/// so multi-byte input never splits a code point.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(max_chars).collect();
    cut.push('…');
    cut
}
