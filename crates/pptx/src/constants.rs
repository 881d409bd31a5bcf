//! Part paths, content types and relationship types used by the notes
//! embedding code.

/// Package manifest mapping extensions and parts to content types.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Root presentation definition.
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Relationships owned by the presentation definition.
pub const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// First notes master, linked from notes slides when present.
pub const NOTES_MASTER_PART: &str = "ppt/notesMasters/notesMaster1.xml";

/// Layout a fabricated per-slide relationship file points at.
pub const DEFAULT_LAYOUT_TARGET: &str = "../slideLayouts/slideLayout1.xml";

/// Namespace of every `.rels` part.
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Namespace of `[Content_Types].xml`.
pub const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub mod content_type {
    /// Content type of relationship parts.
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

    /// Content type of a notes slide part.
    pub const NOTES_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
}

pub mod rel_type {
    /// Relationship to a notes slide.
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    /// Relationship to a slide.
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    /// Relationship to a slide layout.
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    /// Relationship to a notes master.
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
}

/// Path of the notes slide part for a 1-based slide ordinal.
pub fn notes_slide_part(ordinal: usize) -> String {
    format!("ppt/notesSlides/notesSlide{}.xml", ordinal)
}

/// Path of the slide part for a slide ordinal.
pub fn slide_part(ordinal: usize) -> String {
    format!("ppt/slides/slide{}.xml", ordinal)
}

/// Relationship file of the slide part for a slide ordinal.
pub fn slide_rels_part(ordinal: usize) -> String {
    format!("ppt/slides/_rels/slide{}.xml.rels", ordinal)
}

/// Relationship file for an arbitrary part, e.g. `ppt/slides/slide3.xml`
/// maps to `ppt/slides/_rels/slide3.xml.rels`.
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target relative to the directory of `source_part`.
///
/// Absolute targets (leading `/`) are taken from the package root.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Relationship target that leads from `source_part` to `target_part`.
///
/// The inverse of [`resolve_target`] for parts inside the package.
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let source_dir: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let target: Vec<&str> = target_part.split('/').collect();
    let (target_dir, file) = target.split_at(target.len() - 1);

    let common = source_dir
        .iter()
        .zip(target_dir)
        .take_while(|(a, b)| a == b)
        .count();
    let mut segments: Vec<&str> = vec![".."; source_dir.len() - common];
    segments.extend_from_slice(&target_dir[common..]);
    segments.extend_from_slice(file);
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_paths() {
        assert_eq!(notes_slide_part(3), "ppt/notesSlides/notesSlide3.xml");
        assert_eq!(slide_rels_part(12), "ppt/slides/_rels/slide12.xml.rels");
        assert_eq!(
            rels_part_for("ppt/presentation.xml"),
            PRESENTATION_RELS_PART
        );
        assert_eq!(rels_part_for("doc.xml"), "_rels/doc.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../notesSlides/notesSlide1.xml"),
            "ppt/notesSlides/notesSlide1.xml"
        );
        assert_eq!(
            resolve_target(PRESENTATION_PART, "slides/slide2.xml"),
            "ppt/slides/slide2.xml"
        );
        assert_eq!(
            resolve_target(PRESENTATION_PART, "/ppt/slides/slide2.xml"),
            "ppt/slides/slide2.xml"
        );
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(
            relative_target("ppt/slides/slide4.xml", "ppt/notesSlides/notesSlide2.xml"),
            "../notesSlides/notesSlide2.xml"
        );
        assert_eq!(
            relative_target(PRESENTATION_PART, "ppt/notesSlides/notesSlide2.xml"),
            "notesSlides/notesSlide2.xml"
        );
        assert_eq!(relative_target("ppt/slides/slide1.xml", "ppt/slides/slide2.xml"), "slide2.xml");
        assert_eq!(relative_target("[Content_Types].xml", "ppt/presentation.xml"), PRESENTATION_PART);
        let target = relative_target("ppt/notesSlides/notesSlide7.xml", "ppt/slides/slide3.xml");
        assert_eq!(resolve_target("ppt/notesSlides/notesSlide7.xml", &target), "ppt/slides/slide3.xml");
    }
}
