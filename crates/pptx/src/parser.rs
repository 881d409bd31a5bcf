//! Slide extraction from PPTX files.
//!
//! Produces the [`Slide`] records the narration tool works on: ordinal,
//! title, body text in reading order, and any speaker notes already present.

use crate::constants::{rel_type, rels_part_for, resolve_target, PRESENTATION_PART, PRESENTATION_RELS_PART};
use crate::package::Package;
use crate::rels::Relationships;
use crate::xml::{attribute, local_name};
use deck_core::text::collapse_whitespace;
use deck_core::{Deck, Error, PresentationFormat, Result, Slide};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};

/// Extracts slide records from PPTX (Office Open XML) files.
pub struct SlideExtractor;

impl SlideExtractor {
    /// Create a new slide extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract slides from a PPTX file read from `reader`.
    pub fn extract<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Deck> {
        let package = Package::from_reader(reader)?;
        self.extract_package(&package, filename)
    }

    /// Extract slides from an already decoded package.
    pub fn extract_package(&self, package: &Package, filename: &str) -> Result<Deck> {
        let mut deck = Deck::new(filename, PresentationFormat::Pptx);

        for (idx, slide_ref) in slide_parts(package)?.iter().enumerate() {
            let slide_path = &slide_ref.path;
            let slide = match self.parse_slide(package, slide_path, idx + 1) {
                Ok(slide) => slide,
                Err(e) => {
                    log::warn!("Slide {} ({}) unreadable, keeping it empty: {}", idx + 1, slide_path, e);
                    Slide::new(idx + 1)
                }
            };
            deck.add_slide(slide);
        }

        log::info!("Extracted {} slides from {}", deck.slides.len(), filename);
        Ok(deck)
    }

    /// Parse a single slide and its existing notes.
    fn parse_slide(&self, package: &Package, slide_path: &str, ordinal: usize) -> Result<Slide> {
        let content = package.require_str(slide_path)?;
        let mut shapes = extract_shapes_from_xml(&content)?;

        // Sort by position (top-to-bottom, left-to-right)
        shapes.sort_by(|a, b| {
            a.y.partial_cmp(&b.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let title_idx = shapes
            .iter()
            .position(|s| matches!(s.placeholder.as_deref(), Some("title") | Some("ctrTitle")))
            .or(if shapes.is_empty() { None } else { Some(0) });

        let mut slide = Slide::new(ordinal);
        if let Some(idx) = title_idx {
            slide.title = shapes.remove(idx).text.replace('\n', " ");
        }
        slide.content = shapes
            .into_iter()
            .map(|s| s.text)
            .collect::<Vec<_>>()
            .join("\n");
        slide.narration = self.existing_notes(package, slide_path)?;

        Ok(slide)
    }

    /// Text of the notes slide linked from `slide_path`, if any.
    fn existing_notes(&self, package: &Package, slide_path: &str) -> Result<Option<String>> {
        let Some(rels_content) = package.read_str(&rels_part_for(slide_path))? else {
            return Ok(None);
        };
        let rels = Relationships::parse(&rels_content)?;
        let Some(notes_rel) = rels.first_of_type(rel_type::NOTES_SLIDE) else {
            return Ok(None);
        };

        let notes_path = resolve_target(slide_path, &notes_rel.target);
        match package.read_str(&notes_path)? {
            Some(xml) => {
                let text = notes_body_text(&xml)?;
                Ok(if text.trim().is_empty() { None } else { Some(text) })
            }
            None => {
                log::warn!("{} links missing notes part {}", slide_path, notes_path);
                Ok(None)
            }
        }
    }
}

impl Default for SlideExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// A slide part and the presentation relationship that reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlidePart {
    pub rel_id: String,
    pub path: String,
}

/// Slide parts in display order, so that slide ordinal K is entry K - 1.
///
/// The slide ID list in `presentation.xml` decides the order. Without one,
/// slides are ordered by the number in their relationship ID or file name.
pub(crate) fn slide_parts(package: &Package) -> Result<Vec<SlidePart>> {
    let rels_content = package.require_str(PRESENTATION_RELS_PART)?;
    let rels = Relationships::parse(&rels_content)?;

    let slide_part = |id: &str| {
        rels.get(id)
            .filter(|r| r.rel_type == rel_type::SLIDE)
            .map(|r| SlidePart {
                rel_id: r.id.clone(),
                path: resolve_target(PRESENTATION_PART, &r.target),
            })
    };

    let listed: Vec<SlidePart> = match package.read_str(PRESENTATION_PART)? {
        Some(presentation) => slide_id_list(&presentation)?
            .iter()
            .filter_map(|id| slide_part(id.as_str()))
            .collect(),
        None => Vec::new(),
    };
    if !listed.is_empty() {
        return Ok(listed);
    }

    let mut slides: Vec<(SlidePart, Option<usize>)> = rels
        .iter()
        .filter(|r| r.rel_type == rel_type::SLIDE)
        .map(|r| {
            let order_num = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
            let part = SlidePart {
                rel_id: r.id.clone(),
                path: resolve_target(PRESENTATION_PART, &r.target),
            };
            (part, order_num)
        })
        .collect();

    // Sort slides by their number
    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.path.cmp(&b.0.path),
    });

    Ok(slides.into_iter().map(|(part, _)| part).collect())
}

/// Information about a shape extracted from XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    x: f64,
    y: f64,
    placeholder: Option<String>,
}

/// Extract shapes with text, position and placeholder type from slide XML.
fn extract_shapes_from_xml(xml_content: &str) -> Result<Vec<ShapeInfo>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);

    let mut current_shape: Option<ShapeInfo> = None;
    let mut lines: Vec<String> = Vec::new();
    let mut in_text_body = false;
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    current_shape = Some(ShapeInfo::default());
                    lines.clear();
                }
                b"txBody" => in_text_body = true,
                b"p" if in_text_body => lines.push(String::new()),
                b"t" if in_text_body => in_run_text = true,
                b"off" => read_offset(e, current_shape.as_mut()),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"off" => read_offset(e, current_shape.as_mut()),
                b"ph" => {
                    if let Some(shape) = current_shape.as_mut() {
                        // A placeholder without a type is a body placeholder.
                        shape.placeholder = Some(attribute(e, b"type").unwrap_or_else(|| "body".to_string()));
                    }
                }
                b"br" if in_text_body => {
                    if let Some(line) = lines.last_mut() {
                        line.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_run_text => {
                let text = e.unescape().unwrap_or_default();
                if let Some(line) = lines.last_mut() {
                    line.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    if let Some(mut shape) = current_shape.take() {
                        shape.text = lines
                            .iter()
                            .map(|l| collapse_whitespace(l))
                            .filter(|l| !l.is_empty())
                            .collect::<Vec<_>>()
                            .join("\n");
                        if !shape.text.is_empty() {
                            shapes.push(shape);
                        }
                    }
                    lines.clear();
                    in_text_body = false;
                }
                b"txBody" => in_text_body = false,
                b"t" => in_run_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    Ok(shapes)
}

fn read_offset(e: &quick_xml::events::BytesStart<'_>, shape: Option<&mut ShapeInfo>) {
    let Some(shape) = shape else { return };
    if let Some(x) = attribute(e, b"x").and_then(|v| v.parse::<f64>().ok()) {
        shape.x = x;
    }
    if let Some(y) = attribute(e, b"y").and_then(|v| v.parse::<f64>().ok()) {
        shape.y = y;
    }
}

/// Text of the body placeholder of a notes slide, one line per paragraph.
///
/// Text is returned exactly as stored, apart from XML unescaping.
pub fn notes_body_text(xml_content: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml_content);

    let mut in_shape = false;
    let mut is_body = false;
    let mut in_run_text = false;
    let mut paragraphs: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    in_shape = true;
                    is_body = false;
                    paragraphs.clear();
                }
                b"p" if in_shape => paragraphs.push(String::new()),
                b"t" if in_shape => in_run_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"ph" if in_shape => {
                    is_body = attribute(e, b"type").as_deref() == Some("body");
                }
                b"p" if in_shape => paragraphs.push(String::new()),
                b"br" if in_shape => {
                    if let Some(p) = paragraphs.last_mut() {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_run_text => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("Bad notes text: {}", e)))?;
                if let Some(p) = paragraphs.last_mut() {
                    p.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    if is_body {
                        return Ok(paragraphs.join("\n"));
                    }
                    in_shape = false;
                }
                b"t" => in_run_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing notes slide: {}", e)));
            }
            _ => {}
        }
    }

    Ok(String::new())
}

/// Extract the slide ID list (`r:id` values in order) from presentation XML.
fn slide_id_list(xml_content: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                if let Some(id) = attribute(e, b"r:id") {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    // Remove common extensions first
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    // Try to find digits at the end
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sample_package, slide_xml};

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_shapes_title_and_position() {
        let xml = slide_xml("Quarterly Review", "Revenue up\nCosts down");
        let shapes = extract_shapes_from_xml(&xml).unwrap();

        assert_eq!(shapes.len(), 2);
        let title = shapes
            .iter()
            .find(|s| s.placeholder.as_deref() == Some("title"))
            .unwrap();
        let body = shapes
            .iter()
            .find(|s| s.placeholder.as_deref() == Some("body"))
            .unwrap();
        assert_eq!(title.text, "Quarterly Review");
        assert_eq!(body.text, "Revenue up\nCosts down");
        assert!(body.y > title.y);
    }

    #[test]
    fn test_extract_package() {
        let package = sample_package(3, &[2]);
        let deck = SlideExtractor::new()
            .extract_package(&package, "talk.pptx")
            .unwrap();

        assert_eq!(deck.slides.len(), 3);
        assert_eq!(deck.slides[0].ordinal, 1);
        assert_eq!(deck.slides[0].title, "Title 1");
        assert_eq!(deck.slides[2].content, "Body of slide 3");
        assert_eq!(deck.slides[1].narration, None);
    }

    #[test]
    fn test_extract_reads_existing_notes() {
        let package = sample_package(2, &[]);
        let slides = vec![Slide::new(1), Slide::new(2).with_narration("Say this & that")];
        let bytes = crate::patcher::attach_notes(
            &package.to_bytes(6).unwrap(),
            &slides,
            &crate::NotesOptions::default(),
        )
        .unwrap();

        let deck = SlideExtractor::new()
            .extract(std::io::Cursor::new(bytes), "talk.pptx")
            .unwrap();
        assert_eq!(deck.slides[0].narration, None);
        assert_eq!(deck.slides[1].narration.as_deref(), Some("Say this & that"));
    }

    #[test]
    fn test_missing_presentation_rels_is_error() {
        let err = SlideExtractor::new()
            .extract_package(&Package::new(), "empty.pptx")
            .unwrap_err();
        assert!(matches!(err, Error::MissingPart(_)));
    }

    #[test]
    fn test_slide_id_list_order() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="257" r:id="rId3"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#;
        assert_eq!(slide_id_list(xml).unwrap(), vec!["rId3", "rId2"]);
    }
}
