//! In-memory fixture decks for tests.

use crate::constants::*;
use crate::package::Package;
use crate::rels::{Relationship, Relationships};

const PRESENTATION_CT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const SLIDE_CT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const SLIDE_MASTER_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const THEME_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

/// Slide XML with a title placeholder and a body placeholder.
pub(crate) fn slide_xml(title: &str, body: &str) -> String {
    let paragraphs: String = body
        .lines()
        .map(|l| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", l))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="3" name="Content"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="2000000"/><a:ext cx="8229600" cy="4000000"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/>{}</p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="274638"/><a:ext cx="8229600" cy="1143000"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
        paragraphs, title
    )
}

/// A minimal deck with `slide_count` slides. Slides whose ordinal is listed
/// in `without_rels` have no relationship part.
///
/// The presentation relationships use `rId1` for the master, `rId2..` for
/// the slides and the next ID for the theme.
pub(crate) fn sample_package(slide_count: usize, without_rels: &[usize]) -> Package {
    let mut package = Package::new();

    let mut content_types = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="{}"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="{}"/>"#,
        CONTENT_TYPES_NS, PRESENTATION_CT
    );
    for k in 1..=slide_count {
        content_types.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="{}"/>"#,
            k, SLIDE_CT
        ));
    }
    content_types.push_str("</Types>");
    package.set(CONTENT_TYPES_PART, content_types);

    let mut root = Relationships::new();
    root.push(Relationship::new("rId1", OFFICE_DOCUMENT_REL, "ppt/presentation.xml"))
        .unwrap();
    package.set("_rels/.rels", root.to_xml());

    let slide_ids: String = (1..=slide_count)
        .map(|k| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + k, k + 1))
        .collect();
    package.set(
        PRESENTATION_PART,
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
            slide_ids
        ),
    );

    let mut pres_rels = Relationships::new();
    pres_rels
        .push(Relationship::new("rId1", SLIDE_MASTER_REL, "slideMasters/slideMaster1.xml"))
        .unwrap();
    for k in 1..=slide_count {
        pres_rels
            .push(Relationship::new(
                format!("rId{}", k + 1),
                rel_type::SLIDE,
                format!("slides/slide{}.xml", k),
            ))
            .unwrap();
    }
    pres_rels
        .push(Relationship::new(
            format!("rId{}", slide_count + 2),
            THEME_REL,
            "theme/theme1.xml",
        ))
        .unwrap();
    package.set(PRESENTATION_RELS_PART, pres_rels.to_xml());

    for k in 1..=slide_count {
        package.set(
            slide_part(k),
            slide_xml(&format!("Title {}", k), &format!("Body of slide {}", k)),
        );
        if !without_rels.contains(&k) {
            let mut rels = Relationships::new();
            rels.push(Relationship::new("rId1", rel_type::SLIDE_LAYOUT, DEFAULT_LAYOUT_TARGET))
                .unwrap();
            package.set(slide_rels_part(k), rels.to_xml());
        }
    }

    package.set("ppt/slideMasters/slideMaster1.xml", "<p:sldMaster/>");
    package.set("ppt/slideLayouts/slideLayout1.xml", "<p:sldLayout/>");
    package.set("ppt/theme/theme1.xml", "<a:theme/>");

    package
}
