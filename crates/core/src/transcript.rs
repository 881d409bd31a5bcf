//! Splitting an uploaded transcript into per-slide narration.
//!
//! Two layouts are recognized. A transcript with section headers such as
//! `Slide 2:`, `## Slide 2`, or `[Slide 2]` assigns each section to the
//! slide it names. A transcript without headers is split on blank lines and
//! the paragraphs are assigned to slides in order.

use crate::text::collapse_whitespace;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Matches a slide section header. Group 1 is the ordinal, group 2 any text
/// following the header's delimiter on the same line. A bare "Slide 3 shows"
/// sentence is not a header.
static SLIDE_HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#+\s*)?[\[(]?\s*slide\s+(\d+)\s*[\])]?\s*(?:[:.)\-]\s*(.*))?$").unwrap()
});

/// Splits transcript text into narration scripts for a deck of known size.
#[derive(Debug, Clone)]
pub struct TranscriptSplitter {
    slide_count: usize,
}

impl TranscriptSplitter {
    /// Create a splitter for a deck with `slide_count` slides.
    pub fn new(slide_count: usize) -> Self {
        Self { slide_count }
    }

    /// Split the transcript into a map from 1-based ordinal to script.
    ///
    /// Sections that name ordinals outside the deck are dropped. Sections
    /// repeating an ordinal are appended to the earlier one.
    pub fn split(&self, transcript: &str) -> BTreeMap<usize, String> {
        let text: String = transcript
            .nfc()
            .collect::<String>()
            .replace("\r\n", "\n")
            .replace('\r', "\n");

        let sections = if text.lines().any(|l| SLIDE_HEADER_REGEX.is_match(l)) {
            split_by_headers(&text)
        } else {
            split_by_paragraphs(&text)
        };

        let mut scripts = BTreeMap::new();
        for (ordinal, lines) in sections {
            if ordinal == 0 || ordinal > self.slide_count {
                log::warn!(
                    "Transcript section for slide {} ignored: deck has {} slides",
                    ordinal,
                    self.slide_count
                );
                continue;
            }
            let script = tidy(&lines);
            if script.is_empty() {
                continue;
            }
            scripts
                .entry(ordinal)
                .and_modify(|existing: &mut String| {
                    existing.push('\n');
                    existing.push_str(&script);
                })
                .or_insert(script);
        }

        log::debug!("Transcript split into {} slide scripts", scripts.len());
        scripts
    }
}

fn split_by_headers(text: &str) -> Vec<(usize, Vec<&str>)> {
    let mut sections: Vec<(usize, Vec<&str>)> = Vec::new();
    for line in text.lines() {
        if let Some(caps) = SLIDE_HEADER_REGEX.captures(line) {
            let ordinal = caps[1].parse().unwrap_or(0);
            let mut lines = Vec::new();
            if let Some(rest) = caps.get(2) {
                lines.push(rest.as_str());
            }
            sections.push((ordinal, lines));
        } else if let Some((_, lines)) = sections.last_mut() {
            lines.push(line);
        }
        // Text before the first header is a preamble and is skipped.
    }
    sections
}

fn split_by_paragraphs(text: &str) -> Vec<(usize, Vec<&str>)> {
    let mut sections: Vec<(usize, Vec<&str>)> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                sections.push((sections.len() + 1, std::mem::take(&mut current)));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        sections.push((sections.len() + 1, current));
    }
    sections
}

/// Collapse whitespace per line and drop leading/trailing blank lines.
fn tidy(lines: &[&str]) -> String {
    let lines: Vec<String> = lines.iter().map(|l| collapse_whitespace(l)).collect();
    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}
