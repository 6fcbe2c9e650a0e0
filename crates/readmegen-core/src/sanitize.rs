//! Secret redaction for dotenv-style files.
//!
//! Every `KEY=VALUE` line is rewritten to `KEY=<YOUR_VALUE>`. The key and the
//! line structure are preserved; the value is discarded. Comment lines,
//! blank lines, and anything without an `=` pass through untouched, as do
//! lines whose key is empty. Nothing here can fail.
//!
//! A quoted value left open at the end of its line (a PEM block, a JSON
//! blob) continues until the line holding the closing quote. Each of those
//! continuation lines becomes a bare `<YOUR_VALUE>` line, so no part of the
//! value survives and the line count stays the same.

/// Replacement written in place of every value.
pub const PLACEHOLDER: &str = "<YOUR_VALUE>";

/// Redact all values in dotenv-formatted `text`.
///
/// A trailing newline in the input is kept so that line counts stay
/// stable for the line caps applied afterwards.
///
/// ```rust
/// use readmegen_core::sanitize::sanitize_env;
///
/// let out = sanitize_env("# db\nDB_URL=postgres://u:p@h/db\n");
/// assert_eq!(out, "# db\nDB_URL=<YOUR_VALUE>\n");
/// ```
pub fn sanitize_env(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut open_quote: Option<char> = None;
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if let Some(quote) = open_quote {
            if line.contains(quote) {
                open_quote = None;
            }
            out.push_str(PLACEHOLDER);
            continue;
        }
        let (sanitized, opened) = sanitize_line(line);
        open_quote = opened;
        out.push_str(&sanitized);
    }
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Redacted line, plus the quote character when the value stays open.
fn sanitize_line(line: &str) -> (String, Option<char>) {
    if line.trim_start().starts_with('#') {
        return (line.to_string(), None);
    }
    match line.split_once('=') {
        Some((key, value)) => {
            let key = key.trim();
            if key.is_empty() {
                (line.to_string(), None)
            } else {
                (format!("{}={}", key, PLACEHOLDER), unclosed_quote(value))
            }
        }
        None => (line.to_string(), None),
    }
}

fn unclosed_quote(value: &str) -> Option<char> {
    let mut chars = value.trim_start().chars();
    match chars.next() {
        Some(q @ ('"' | '\'')) if !chars.as_str().contains(q) => Some(q),
        _ => None,
    }
}
