//! PPTX (Office Open XML) backend for slide narration.
//!
//! Reads slides out of .pptx files (ZIP archives containing XML documents)
//! and embeds narration scripts back into them as speaker notes.

pub mod constants;
pub mod content_types;
pub mod notes;
pub mod package;
pub mod parser;
pub mod patcher;
pub mod rels;
mod xml;

#[cfg(test)]
mod testutil;

pub use content_types::ContentTypes;
pub use notes::notes_slide_xml;
pub use package::Package;
pub use parser::{notes_body_text, SlideExtractor};
pub use patcher::{attach_notes, ContentTypePolicy, NotesOptions, NotesPatcher, PatchReport};
pub use rels::{Relationship, Relationships};
