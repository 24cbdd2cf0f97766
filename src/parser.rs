//! Line parsing for .npmrc files.
//!
//! .npmrc files use a simplified INI format without sections. Keys may start
//! with special characters (`@myorg:registry`, `//host/path/:_authToken`),
//! which is why a small custom parser is used instead of an INI library.

/// One line of an .npmrc file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Empty or whitespace-only.
    Blank,
    /// Starts with `#` or `;`.
    Comment,
    /// `key=value` or `key = value`, both sides trimmed.
    Entry { key: &'a str, value: &'a str },
    /// Anything else (npm ignores these).
    Other,
}

/// Classify a single .npmrc line.
pub fn parse_line(line: &str) -> Line<'_> {
    let line = line.trim();

    if line.is_empty() {
        return Line::Blank;
    }

    if line.starts_with('#') || line.starts_with(';') {
        return Line::Comment;
    }

    match line.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Line::Entry {
            key: key.trim(),
            value: value.trim(),
        },
        _ => Line::Other,
    }
}
