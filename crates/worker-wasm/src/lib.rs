//! WASM-compatible wrapper for slide extraction and notes embedding.
//!
//! This crate exposes the narration tool's deck handling to JavaScript so
//! the browser wizard can work on uploaded files without a server round trip.

use deck_core::{NarrationPipeline, Pacing, PresentationFormat, Slide, TranscriptSource};
use deck_pptx::{ContentTypePolicy, NotesOptions, SlideExtractor};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Result of extracting a presentation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Number of slides found in the source.
    pub slide_count: usize,
    /// Slides in order, with any notes the deck already carries.
    pub slides: Vec<Slide>,
}

/// Options accepted by [`attach_notes`]. Every field is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttachRequest {
    /// Register a content type override for every notes part.
    pub per_part_content_types: bool,
    /// Cross-reference notes from `presentation.xml`.
    pub link_presentation: bool,
    /// Deflate level (0-9).
    pub compression_level: Option<i32>,
}

impl AttachRequest {
    fn to_options(&self) -> NotesOptions {
        let policy = if self.per_part_content_types {
            ContentTypePolicy::PerPart
        } else {
            ContentTypePolicy::AnyPresent
        };
        let mut options = NotesOptions::new()
            .with_content_type_policy(policy)
            .with_link_presentation(self.link_presentation);
        if let Some(level) = self.compression_level {
            options = options.with_compression_level(level);
        }
        options
    }
}

/// Extract slides from a PowerPoint file.
///
/// # Arguments
/// * `data` - The raw bytes of the PPTX file
/// * `filename` - The original filename (used for format detection)
///
/// # Returns
/// A JavaScript object with the extraction result, or throws on error.
#[wasm_bindgen]
pub fn extract_slides(data: &[u8], filename: &str) -> Result<JsValue, JsValue> {
    let result = extract_slides_impl(data, filename).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn extract_slides_impl(data: &[u8], filename: &str) -> Result<ExtractionResult, String> {
    ensure_pptx(data, filename)?;

    let deck = SlideExtractor::new()
        .extract(Cursor::new(data), filename)
        .map_err(|e| format!("PPTX parsing error: {}", e))?;

    Ok(ExtractionResult {
        slide_count: deck.slides.len(),
        slides: deck.slides,
    })
}

/// Split an uploaded transcript across the given slides.
///
/// # Arguments
/// * `slides` - Array of slide objects as returned by `extract_slides`
/// * `transcript` - The transcript text
/// * `overwrite` - Replace scripts the slides already have
///
/// # Returns
/// The slides with narration filled in.
#[wasm_bindgen]
pub fn apply_transcript(slides: JsValue, transcript: &str, overwrite: bool) -> Result<JsValue, JsValue> {
    let slides: Vec<Slide> = serde_wasm_bindgen::from_value(slides)
        .map_err(|e| JsValue::from_str(&format!("Invalid slides array: {}", e)))?;

    let slides = apply_transcript_impl(slides, transcript, overwrite).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&slides)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn apply_transcript_impl(mut slides: Vec<Slide>, transcript: &str, overwrite: bool) -> Result<Vec<Slide>, String> {
    let source = TranscriptSource::new(transcript, slides.len());
    NarrationPipeline::new(source)
        .with_pacing(Pacing::immediate())
        .with_overwrite(overwrite)
        .run(&mut slides)
        .map_err(|e| e.to_string())?;
    Ok(slides)
}

/// Embed slide narration into the deck as speaker notes.
///
/// # Arguments
/// * `data` - The raw bytes of the PPTX file
/// * `filename` - The original filename
/// * `slides` - Array of slide objects carrying `narration`
/// * `request` - Optional options object (`perPartContentTypes`,
///   `linkPresentation`, `compressionLevel`)
///
/// # Returns
/// The bytes of the new PPTX file as a `Uint8Array`.
#[wasm_bindgen]
pub fn attach_notes(
    data: &[u8],
    filename: &str,
    slides: JsValue,
    request: JsValue,
) -> Result<js_sys::Uint8Array, JsValue> {
    let slides: Vec<Slide> = serde_wasm_bindgen::from_value(slides)
        .map_err(|e| JsValue::from_str(&format!("Invalid slides array: {}", e)))?;
    let request: AttachRequest = if request.is_undefined() || request.is_null() {
        AttachRequest::default()
    } else {
        serde_wasm_bindgen::from_value(request)
            .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))?
    };

    let bytes = attach_notes_impl(data, filename, &slides, &request).map_err(|e| JsValue::from_str(&e))?;
    Ok(js_sys::Uint8Array::from(bytes.as_slice()))
}

fn attach_notes_impl(
    data: &[u8],
    filename: &str,
    slides: &[Slide],
    request: &AttachRequest,
) -> Result<Vec<u8>, String> {
    ensure_pptx(data, filename)?;
    deck_pptx::attach_notes(data, slides, &request.to_options())
        .map_err(|e| format!("Notes embedding failed: {}", e))
}

fn ensure_pptx(data: &[u8], filename: &str) -> Result<(), String> {
    // Need at least 8 bytes for magic detection
    if data.len() < 8 {
        return Err("File too small to be a valid presentation".to_string());
    }

    let format = PresentationFormat::from_magic(&data[..8])
        .or_else(|| {
            filename
                .rsplit('.')
                .next()
                .and_then(PresentationFormat::from_extension)
        })
        .ok_or_else(|| "Could not detect file format".to_string())?;

    match format {
        PresentationFormat::Pptx => Ok(()),
        PresentationFormat::Ppt => Err("Legacy .ppt files are not supported; save as .pptx".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_pptx::Package;

    fn tiny_deck() -> Vec<u8> {
        let mut package = Package::new();
        package.set(
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#,
        );
        package.set(
            "ppt/presentation.xml",
            r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#,
        );
        package.set(
            "ppt/_rels/presentation.xml.rels",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/></Relationships>"#,
        );
        package.set(
            "ppt/slides/slide1.xml",
            r#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:txBody><a:p><a:r><a:t>Hello</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
        );
        package.to_bytes(6).unwrap()
    }

    #[test]
    fn test_extract_then_attach() {
        let data = tiny_deck();
        let extracted = extract_slides_impl(&data, "tiny.pptx").unwrap();
        assert_eq!(extracted.slide_count, 1);
        assert_eq!(extracted.slides[0].title, "Hello");

        let slides = apply_transcript_impl(extracted.slides, "Slide 1: Good morning.", false).unwrap();
        assert_eq!(slides[0].narration_text(), "Good morning.");

        let bytes = attach_notes_impl(&data, "tiny.pptx", &slides, &AttachRequest::default()).unwrap();
        let again = extract_slides_impl(&bytes, "tiny.pptx").unwrap();
        assert_eq!(again.slides[0].narration.as_deref(), Some("Good morning."));
    }

    #[test]
    fn test_rejects_small_and_legacy_files() {
        assert!(extract_slides_impl(b"PK", "a.pptx").is_err());
        let legacy = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0];
        assert!(ensure_pptx(&legacy, "a.ppt").unwrap_err().contains("Legacy"));
    }

    #[test]
    fn test_request_defaults() {
        let options = AttachRequest::default().to_options();
        assert_eq!(options, NotesOptions::default());
    }
}
