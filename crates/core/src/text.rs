//! Narration text handling.
//!
//! Strips characters XML cannot carry, escapes the XML-significant ones,
//! and splits scripts into the paragraphs a notes body is built from.

use regex::Regex;
use std::sync::LazyLock;

/// ASCII control characters that are not legal in XML text content.
/// Tab, line feed and carriage return are kept.
static CONTROL_CHAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

/// Regex to collapse multiple whitespace characters into one.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Remove control characters that would make an XML document unopenable.
pub fn sanitize_narration(text: &str) -> String {
    CONTROL_CHAR_REGEX.replace_all(text, "").into_owned()
}

/// Escape the five XML-significant characters.
///
/// `&` is replaced first so the entities produced by later replacements
/// are not escaped twice.
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Split sanitized narration into paragraphs, one per line.
///
/// An empty script yields a single empty paragraph so that every notes body
/// has at least one `a:p`.
pub fn narration_paragraphs(text: &str) -> Vec<String> {
    let sanitized = sanitize_narration(text);
    let normalized = sanitized.replace("\r\n", "\n").replace('\r', "\n");
    normalized.split('\n').map(str::to_string).collect()
}

/// Collapse runs of spaces and tabs within a line and trim it.
pub fn collapse_whitespace(line: &str) -> String {
    WHITESPACE_COLLAPSE_REGEX.replace_all(line, " ").trim().to_string()
}
