//! Error types for slide narration and notes embedding.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading decks, generating narration, or
/// embedding notes.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// A part the operation requires is absent from the package.
    #[error("Package is missing required part '{0}'")]
    MissingPart(String),

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// A slide record is unusable (e.g. a zero ordinal).
    #[error("Invalid slide: {0}")]
    InvalidSlide(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// A narration collaborator (script generator, transcript) failed.
    #[error("{provider} failed on slide {ordinal}: {message}{}", hint_suffix(.hint))]
    Narration {
        /// Name of the narration source that failed.
        provider: String,
        /// 1-based slide ordinal being narrated.
        ordinal: usize,
        /// Failure detail reported by the source.
        message: String,
        /// Suggested fallback, if any.
        hint: Option<String>,
    },
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref().map(|h| format!(" ({})", h)).unwrap_or_default()
}

impl Error {
    /// Build a narration failure without a fallback hint.
    pub fn narration(provider: impl Into<String>, ordinal: usize, message: impl Into<String>) -> Self {
        Self::Narration {
            provider: provider.into(),
            ordinal,
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a fallback hint to a narration failure. Other variants pass through.
    pub fn with_hint(self, fallback: impl Into<String>) -> Self {
        match self {
            Self::Narration {
                provider,
                ordinal,
                message,
                ..
            } => Self::Narration {
                provider,
                ordinal,
                message,
                hint: Some(fallback.into()),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narration_display_with_hint() {
        let err = Error::narration("cloud-tts", 3, "quota exceeded")
            .with_hint("switch to the on-device engine");
        assert_eq!(
            err.to_string(),
            "cloud-tts failed on slide 3: quota exceeded (switch to the on-device engine)"
        );
    }

    #[test]
    fn test_narration_display_without_hint() {
        let err = Error::narration("llm", 1, "timeout");
        assert_eq!(err.to_string(), "llm failed on slide 1: timeout");
    }

    #[test]
    fn test_with_hint_ignores_other_variants() {
        let err = Error::MissingPart("ppt/presentation.xml".into()).with_hint("ignored");
        assert!(matches!(err, Error::MissingPart(_)));
    }
}
