//! The package manifest, `[Content_Types].xml`.

use crate::constants::CONTENT_TYPES_NS;
use crate::xml::{attribute, local_name};
use deck_core::{escape_xml, Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Parsed manifest: extension defaults and per-part overrides, in document
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// `(extension, content type)` pairs.
    defaults: Vec<(String, String)>,
    /// `(part name, content type)` pairs. Part names keep their leading `/`.
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the XML of `[Content_Types].xml`.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut types = Self::new();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match local_name(e.name().as_ref()) {
                        b"Default" => {
                            if let (Some(ext), Some(ct)) =
                                (attribute(e, b"Extension"), attribute(e, b"ContentType"))
                            {
                                types.defaults.push((ext, ct));
                            }
                        }
                        b"Override" => {
                            if let (Some(part), Some(ct)) =
                                (attribute(e, b"PartName"), attribute(e, b"ContentType"))
                            {
                                types.overrides.push((part, ct));
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing content types: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(types)
    }

    /// Whether an extension default exists for `ext`.
    pub fn has_default(&self, ext: &str) -> bool {
        self.defaults.iter().any(|(e, _)| e.eq_ignore_ascii_case(ext))
    }

    /// Add an extension default unless one exists. Returns whether it was added.
    pub fn add_default(&mut self, ext: &str, content_type: &str) -> bool {
        if self.has_default(ext) {
            return false;
        }
        self.defaults.push((ext.to_string(), content_type.to_string()));
        true
    }

    /// Whether any override declares `content_type`.
    pub fn declares_type(&self, content_type: &str) -> bool {
        self.overrides.iter().any(|(_, ct)| ct == content_type)
    }

    /// Content type overriding `part_name` (with leading `/`), if any.
    pub fn override_for(&self, part_name: &str) -> Option<&str> {
        self.overrides
            .iter()
            .find(|(part, _)| part == part_name)
            .map(|(_, ct)| ct.as_str())
    }

    /// Number of overrides declaring `content_type`.
    pub fn count_type(&self, content_type: &str) -> usize {
        self.overrides
            .iter()
            .filter(|(_, ct)| ct == content_type)
            .count()
    }

    /// Declare `content_type` for `part_name` unless the part already has an
    /// override. Returns whether an entry was added.
    pub fn add_override(&mut self, part_name: &str, content_type: &str) -> bool {
        if self.override_for(part_name).is_some() {
            return false;
        }
        self.overrides
            .push((part_name.to_string(), content_type.to_string()));
        true
    }

    /// Serialize to manifest XML, defaults first, each group in order.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + (self.defaults.len() + self.overrides.len()) * 120);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<Types xmlns="{}">"#, CONTENT_TYPES_NS));

        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(ct)
            ));
        }
        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(part),
                escape_xml(ct)
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::content_type::NOTES_SLIDE;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
</Types>"#;

    #[test]
    fn test_parse() {
        let types = ContentTypes::parse(SAMPLE).unwrap();
        assert_eq!(types.defaults.len(), 2);
        assert_eq!(
            types.override_for("/ppt/presentation.xml"),
            Some("application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml")
        );
        assert!(!types.declares_type(NOTES_SLIDE));
    }

    #[test]
    fn test_add_override_once_per_part() {
        let mut types = ContentTypes::parse(SAMPLE).unwrap();
        assert!(types.add_override("/ppt/notesSlides/notesSlide1.xml", NOTES_SLIDE));
        assert!(!types.add_override("/ppt/notesSlides/notesSlide1.xml", NOTES_SLIDE));
        assert!(types.declares_type(NOTES_SLIDE));
        assert_eq!(types.count_type(NOTES_SLIDE), 1);
    }

    #[test]
    fn test_add_default_case_insensitive() {
        let mut types = ContentTypes::parse(SAMPLE).unwrap();
        assert!(types.has_default("RELS"));
        assert!(!types.add_default("rels", "application/xml"));
        assert!(types.add_default("png", "image/png"));
    }

    #[test]
    fn test_serialize_then_parse_is_stable() {
        let mut types = ContentTypes::parse(SAMPLE).unwrap();
        types.add_override("/ppt/notesSlides/notesSlide1.xml", NOTES_SLIDE);
        let xml = types.to_xml();
        let reparsed = ContentTypes::parse(&xml).unwrap();

        assert_eq!(reparsed, types);
        assert_eq!(reparsed.to_xml(), xml);
        assert!(xml.starts_with("<?xml"));
    }
}
