//! Core domain types, narration text handling, and transcript splitting
//! for embedding slide narration into presentations.

pub mod error;
pub mod narration;
pub mod text;
pub mod transcript;
pub mod types;

pub use error::{Error, Result};
pub use narration::{NarrationPipeline, NarrationSource, Pacing, TranscriptSource};
pub use text::{escape_xml, sanitize_narration};
pub use transcript::TranscriptSplitter;
pub use types::{Deck, PresentationFormat, Slide};
