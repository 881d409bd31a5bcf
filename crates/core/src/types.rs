//! Domain types for slides and their narration.

use serde::{Deserialize, Serialize};

/// A presentation reduced to the slide records the narration tool works on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    /// Original filename (without path).
    pub filename: String,

    /// Detected format of the source file.
    pub format: PresentationFormat,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Create a new, empty deck with the given filename and format.
    pub fn new(filename: impl Into<String>, format: PresentationFormat) -> Self {
        Self {
            filename: filename.into(),
            format,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the deck.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Number of slides that carry a non-empty narration script.
    pub fn narrated_count(&self) -> usize {
        self.slides.iter().filter(|s| s.has_narration()).count()
    }
}

/// The format of the source presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary). Recognized only to reject it clearly.
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }
}

/// A single slide as seen by the narration tool.
///
/// Not a package part: slides are extracted from a deck, enriched with a
/// narration script, and then handed read-only to the notes synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub ordinal: usize,

    /// Slide title, empty when the slide has none.
    #[serde(default)]
    pub title: String,

    /// Body text of the slide in reading order.
    #[serde(default)]
    pub content: String,

    /// Narration script for this slide.
    #[serde(default)]
    pub narration: Option<String>,
}

impl Slide {
    /// Create a new slide with the given ordinal and no text.
    pub fn new(ordinal: usize) -> Self {
        Self {
            ordinal,
            title: String::new(),
            content: String::new(),
            narration: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the narration script.
    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }

    /// Narration text, or the empty string when none was provided.
    pub fn narration_text(&self) -> &str {
        self.narration.as_deref().unwrap_or("")
    }

    /// Whether a non-blank narration script is present.
    pub fn has_narration(&self) -> bool {
        !self.narration_text().trim().is_empty()
    }
}
