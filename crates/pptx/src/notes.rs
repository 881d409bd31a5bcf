//! Notes slide synthesis.

use deck_core::escape_xml;
use deck_core::text::narration_paragraphs;

/// Build the XML of a notes slide part for one slide's narration.
///
/// The part holds a title placeholder and a body placeholder; each line of
/// the narration becomes one paragraph of the body. Control characters XML
/// cannot carry are dropped and the rest is escaped. Output depends only on
/// the inputs.
pub fn notes_slide_xml(narration: &str, ordinal: usize) -> String {
    let mut xml = String::with_capacity(1536 + narration.len() * 2);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(
        r#"<p:notes xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    );
    xml.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    );
    xml.push_str(r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#);

    xml.push_str("<p:cSld><p:spTree>");

    // Group shape properties
    xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
    xml.push_str("<p:grpSpPr><a:xfrm>");
    xml.push_str(r#"<a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#);
    xml.push_str(r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/>"#);
    xml.push_str("</a:xfrm></p:grpSpPr>");

    // Title placeholder
    xml.push_str("<p:sp><p:nvSpPr>");
    xml.push_str(&format!(r#"<p:cNvPr id="2" name="Title Placeholder {}"/>"#, ordinal));
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
    xml.push_str(r#"<p:nvPr><p:ph type="title"/></p:nvPr>"#);
    xml.push_str("</p:nvSpPr><p:spPr/>");
    xml.push_str(r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody>"#);
    xml.push_str("</p:sp>");

    // Notes body placeholder
    xml.push_str("<p:sp><p:nvSpPr>");
    xml.push_str(&format!(r#"<p:cNvPr id="3" name="Notes Placeholder {}"/>"#, ordinal));
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
    xml.push_str(r#"<p:nvPr><p:ph type="body" idx="1"/></p:nvPr>"#);
    xml.push_str("</p:nvSpPr><p:spPr/>");
    xml.push_str("<p:txBody><a:bodyPr/><a:lstStyle/>");
    for paragraph in narration_paragraphs(narration) {
        if paragraph.is_empty() {
            xml.push_str(r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
        } else {
            xml.push_str(r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/>"#);
            xml.push_str(&format!("<a:t>{}</a:t>", escape_xml(&paragraph)));
            xml.push_str("</a:r></a:p>");
        }
    }
    xml.push_str("</p:txBody></p:sp>");

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:notes>");

    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::notes_body_text;

    #[test]
    fn test_escaped_text() {
        let xml = notes_slide_xml("Hello & welcome", 2);
        assert!(xml.contains("<a:t>Hello &amp; welcome</a:t>"));
        assert!(xml.contains(r#"name="Notes Placeholder 2""#));
        assert!(xml.contains(r#"<p:ph type="title"/>"#));
    }

    #[test]
    fn test_empty_narration_has_empty_body() {
        let xml = notes_slide_xml("", 1);
        assert!(!xml.contains("<a:t>"));
        assert_eq!(notes_body_text(&xml).unwrap(), "");
    }

    #[test]
    fn test_escaping_round_trip() {
        let narration = "Tom & Jerry <say> \"hi\" it's\u{0}\u{7}\u{1B}\u{7F} done";
        let xml = notes_slide_xml(narration, 1);

        assert!(!xml.contains('\u{0}'));
        assert!(!xml.contains('\u{7F}'));
        assert_eq!(
            notes_body_text(&xml).unwrap(),
            "Tom & Jerry <say> \"hi\" it's done"
        );
    }

    #[test]
    fn test_multiline_round_trip() {
        let xml = notes_slide_xml("First line\n\nThird line", 1);
        assert_eq!(xml.matches("<a:p>").count(), 4);
        assert_eq!(notes_body_text(&xml).unwrap(), "First line\n\nThird line");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(notes_slide_xml("same", 5), notes_slide_xml("same", 5));
    }
}
