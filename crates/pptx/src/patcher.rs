//! Speaker-notes embedding.
//!
//! Adds one notes slide part per narrated slide and wires it into the
//! package: a manifest override, a relationship from the presentation,
//! a relationship from the slide, and optionally a cross-reference on the
//! slide's entry in `presentation.xml`.
//!
//! Every relationship and manifest part is parsed once, extended in memory
//! across all slides, and written back once. Nothing is written to the
//! package until every slide has been processed, so a failure leaves it as
//! it was. Re-running on an already patched package adds nothing.

use crate::constants::content_type::{NOTES_SLIDE, RELATIONSHIPS};
use crate::constants::*;
use crate::content_types::ContentTypes;
use crate::notes::notes_slide_xml;
use crate::package::{Package, DEFAULT_COMPRESSION_LEVEL};
use crate::parser::slide_parts;
use crate::rels::{Relationship, Relationships};
use crate::xml::{attribute, local_name};
use deck_core::{Error, Result, Slide};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;

/// How notes slide parts are registered in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentTypePolicy {
    /// Add an override for a notes part only while the manifest declares the
    /// notes slide type nowhere. Once any part carries the type, later parts
    /// are skipped.
    #[default]
    AnyPresent,
    /// Add an override for every notes part that lacks one.
    PerPart,
}

/// Options for [`NotesPatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesOptions {
    /// Manifest registration policy.
    pub content_type_policy: ContentTypePolicy,
    /// Start of the ID band for relationships added to the presentation.
    pub root_id_base: u32,
    /// Start of the ID band for relationships added to slides.
    pub slide_id_base: u32,
    /// Add an `r:notes` cross-reference to slide entries in `presentation.xml`.
    pub link_presentation: bool,
    /// Deflate level for the re-encoded archive.
    pub compression_level: i32,
}

impl Default for NotesOptions {
    fn default() -> Self {
        Self {
            content_type_policy: ContentTypePolicy::default(),
            root_id_base: 1000,
            slide_id_base: 2000,
            link_presentation: false,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl NotesOptions {
    /// Create options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the manifest registration policy.
    pub fn with_content_type_policy(mut self, policy: ContentTypePolicy) -> Self {
        self.content_type_policy = policy;
        self
    }

    /// Set the ID band bases for presentation and slide relationships.
    pub fn with_id_bases(mut self, root: u32, slide: u32) -> Self {
        self.root_id_base = root;
        self.slide_id_base = slide;
        self
    }

    /// Enable or disable the `presentation.xml` cross-reference.
    pub fn with_link_presentation(mut self, link: bool) -> Self {
        self.link_presentation = link;
        self
    }

    /// Set the deflate level, clamped to 0..=9.
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level.clamp(0, 9);
        self
    }
}

/// What a patch run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Notes slide parts written.
    pub notes_parts: usize,
    /// Manifest overrides added.
    pub content_type_overrides: usize,
    /// Relationships added to the presentation.
    pub root_relationships: usize,
    /// Relationships added to slides.
    pub slide_relationships: usize,
    /// Slide relationship parts created from scratch.
    pub fabricated_slide_rels: usize,
    /// Slide entries in `presentation.xml` that gained a cross-reference.
    pub presentation_links: usize,
}

/// Embeds narration as speaker notes into a decoded package.
#[derive(Debug, Clone, Default)]
pub struct NotesPatcher {
    options: NotesOptions,
}

impl NotesPatcher {
    /// Create a patcher with the given options.
    pub fn new(options: NotesOptions) -> Self {
        Self { options }
    }

    /// Add notes parts for `slides` to `package`.
    ///
    /// Slide ordinal K names the K-th slide in display order. A slide that
    /// already links a notes part gets its narration written there; other
    /// slides get `notesSlideK.xml`, or the lowest free notes part number
    /// when that one belongs to another slide.
    ///
    /// Fails with [`Error::MissingPart`] before touching the package when it
    /// has no `presentation.xml` or manifest, and with
    /// [`Error::InvalidSlide`] when an ordinal is zero, repeated, or names a
    /// slide the package does not have.
    pub fn apply(&self, package: &mut Package, slides: &[Slide]) -> Result<PatchReport> {
        if !package.contains(PRESENTATION_PART) {
            return Err(Error::MissingPart(PRESENTATION_PART.to_string()));
        }
        let targets = notes_targets(package, slides)?;

        let mut content_types = ContentTypes::parse(&package.require_str(CONTENT_TYPES_PART)?)?;
        let mut root_rels = match package.read_str(PRESENTATION_RELS_PART)? {
            Some(xml) => Relationships::parse(&xml)?,
            None => Relationships::new(),
        };
        let mut presentation = if self.options.link_presentation {
            Some(package.require_str(PRESENTATION_PART)?)
        } else {
            None
        };
        let has_notes_master = package.contains(NOTES_MASTER_PART);

        let mut report = PatchReport::default();
        let mut writes: Vec<(String, String)> = Vec::new();
        let mut manifest_changed = content_types.add_default("rels", RELATIONSHIPS);

        for target in targets {
            let ordinal = target.slide.ordinal;
            let offset = u32::try_from(ordinal)
                .map_err(|_| Error::InvalidSlide(format!("ordinal {} out of range", ordinal)))?;
            let notes_part = target.notes_part.as_str();

            // Notes part and its link back to the slide
            if !target.linked || target.slide.has_narration() || !package.contains(notes_part) {
                writes.push((
                    notes_part.to_string(),
                    notes_slide_xml(target.slide.narration_text(), ordinal),
                ));
                report.notes_parts += 1;
            }
            let notes_rels_part = rels_part_for(notes_part);
            if !target.linked || !package.contains(&notes_rels_part) {
                let slide_target = relative_target(notes_part, &target.slide_part);
                writes.push((notes_rels_part, notes_back_rels(&slide_target, has_notes_master)?));
            }

            // Manifest
            let part_name = format!("/{}", notes_part);
            let register = match self.options.content_type_policy {
                ContentTypePolicy::AnyPresent => !content_types.declares_type(NOTES_SLIDE),
                ContentTypePolicy::PerPart => content_types.override_for(&part_name).is_none(),
            };
            if register && content_types.add_override(&part_name, NOTES_SLIDE) {
                log::debug!("Registered content type for {}", part_name);
                report.content_type_overrides += 1;
                manifest_changed = true;
            }

            // Presentation relationship
            let root_target = relative_target(PRESENTATION_PART, notes_part);
            let root_id = match root_rels.find(rel_type::NOTES_SLIDE, &root_target) {
                Some(rel) => rel.id.clone(),
                None => {
                    let id = root_rels.id_in_band(self.options.root_id_base, offset)?;
                    root_rels.push(Relationship::new(id.clone(), rel_type::NOTES_SLIDE, root_target))?;
                    log::debug!("Linked presentation to notes slide {} as {}", ordinal, id);
                    report.root_relationships += 1;
                    id
                }
            };

            // Slide relationship
            if !target.linked {
                let slide_rels_path = rels_part_for(&target.slide_part);
                let mut slide_rels = match target.slide_rels {
                    Some(rels) => rels,
                    None => {
                        log::warn!("{} missing, creating one with the default layout", slide_rels_path);
                        report.fabricated_slide_rels += 1;
                        fabricated_slide_rels()?
                    }
                };
                let id = slide_rels.id_in_band(self.options.slide_id_base, offset)?;
                let slide_target = relative_target(&target.slide_part, notes_part);
                slide_rels.push(Relationship::new(id, rel_type::NOTES_SLIDE, slide_target))?;
                report.slide_relationships += 1;
                writes.push((slide_rels_path, slide_rels.to_xml()));
            }

            // Presentation cross-reference
            if let (Some(xml), Some(slide_rel_id)) = (presentation.as_mut(), &target.slide_rel_id) {
                if let Some(updated) = link_notes(xml, slide_rel_id, &root_id)? {
                    *xml = updated;
                    report.presentation_links += 1;
                }
            }
        }

        if manifest_changed {
            writes.push((CONTENT_TYPES_PART.to_string(), content_types.to_xml()));
        }
        if report.root_relationships > 0 {
            writes.push((PRESENTATION_RELS_PART.to_string(), root_rels.to_xml()));
        }
        if let (Some(xml), true) = (presentation, report.presentation_links > 0) {
            writes.push((PRESENTATION_PART.to_string(), xml));
        }

        for (path, content) in writes {
            package.set(path, content);
        }

        log::info!(
            "Embedded {} notes slides ({} overrides, {} presentation and {} slide relationships)",
            report.notes_parts,
            report.content_type_overrides,
            report.root_relationships,
            report.slide_relationships
        );
        Ok(report)
    }
}

/// Decode `data`, embed notes for `slides`, and re-encode.
///
/// The input bytes are never modified; on error no archive is produced.
pub fn attach_notes(data: &[u8], slides: &[Slide], options: &NotesOptions) -> Result<Vec<u8>> {
    let mut package = Package::from_bytes(data)?;
    NotesPatcher::new(options.clone()).apply(&mut package, slides)?;
    package.to_bytes(options.compression_level)
}

/// Where the notes of one slide go.
struct NotesTarget<'a> {
    slide: &'a Slide,
    slide_part: String,
    /// Presentation relationship of the slide, when the package has one.
    slide_rel_id: Option<String>,
    /// Relationships of the slide part as found in the package.
    slide_rels: Option<Relationships>,
    notes_part: String,
    /// The slide already links `notes_part`.
    linked: bool,
}

/// Resolve every slide to its part and notes part, sorted by ordinal.
///
/// Checks that each ordinal is distinct and names an existing slide.
fn notes_targets<'a>(package: &Package, slides: &'a [Slide]) -> Result<Vec<NotesTarget<'a>>> {
    let mut ordered: Vec<&Slide> = slides.iter().collect();
    ordered.sort_by_key(|s| s.ordinal);

    // Decks without presentation relationships fall back to file numbering.
    let display_order = if package.contains(PRESENTATION_RELS_PART) {
        Some(slide_parts(package)?)
    } else {
        None
    };

    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(ordered.len());
    for slide in ordered {
        if slide.ordinal == 0 {
            return Err(Error::InvalidSlide("slide ordinals start at 1".to_string()));
        }
        if !seen.insert(slide.ordinal) {
            return Err(Error::InvalidSlide(format!("slide {} given twice", slide.ordinal)));
        }
        let (slide_part, slide_rel_id) = match &display_order {
            Some(parts) => match parts.get(slide.ordinal - 1) {
                Some(part) => (part.path.clone(), Some(part.rel_id.clone())),
                None => {
                    return Err(Error::InvalidSlide(format!(
                        "slide {} is beyond the {} slides of the deck",
                        slide.ordinal,
                        parts.len()
                    )))
                }
            },
            None => (slide_part(slide.ordinal), None),
        };
        if !package.contains(&slide_part) {
            return Err(Error::InvalidSlide(format!(
                "slide {} has no part {}",
                slide.ordinal, slide_part
            )));
        }

        let slide_rels = match package.read_str(&rels_part_for(&slide_part))? {
            Some(xml) => Some(Relationships::parse(&xml)?),
            None => None,
        };
        let existing = slide_rels
            .as_ref()
            .and_then(|rels| rels.first_of_type(rel_type::NOTES_SLIDE))
            .map(|rel| resolve_target(&slide_part, &rel.target));

        targets.push(NotesTarget {
            slide,
            slide_part,
            slide_rel_id,
            slide_rels,
            linked: existing.is_some(),
            notes_part: existing.unwrap_or_default(),
        });
    }

    // New notes parts must not land on a part another slide owns.
    let mut claimed: HashSet<String> = package
        .part_names()
        .filter(|name| name.starts_with("ppt/notesSlides/") && name.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    claimed.extend(targets.iter().filter(|t| t.linked).map(|t| t.notes_part.clone()));

    for target in targets.iter_mut().filter(|t| !t.linked) {
        let mut notes_part = notes_slide_part(target.slide.ordinal);
        let mut n = 1;
        while claimed.contains(&notes_part) {
            notes_part = notes_slide_part(n);
            n += 1;
        }
        if notes_part != notes_slide_part(target.slide.ordinal) {
            log::debug!("Slide {} notes go to {} instead", target.slide.ordinal, notes_part);
        }
        claimed.insert(notes_part.clone());
        target.notes_part = notes_part;
    }

    Ok(targets)
}

/// Minimal slide relationship part: the slide's layout only.
fn fabricated_slide_rels() -> Result<Relationships> {
    let mut rels = Relationships::new();
    rels.push(Relationship::new("rId1", rel_type::SLIDE_LAYOUT, DEFAULT_LAYOUT_TARGET))?;
    Ok(rels)
}

/// Relationship part of a notes slide: its slide, and the notes master when
/// the package has one.
fn notes_back_rels(slide_target: &str, has_notes_master: bool) -> Result<String> {
    let mut rels = Relationships::new();
    if has_notes_master {
        rels.push(Relationship::new(
            "rId1",
            rel_type::NOTES_MASTER,
            "../notesMasters/notesMaster1.xml",
        ))?;
    }
    rels.push(Relationship::new("rId2", rel_type::SLIDE, slide_target))?;
    Ok(rels.to_xml())
}

/// Add `r:notes="{notes_rel_id}"` to the `p:sldId` whose `r:id` is
/// `slide_rel_id`, unless it already has one.
///
/// Returns `None` when no entry was changed.
fn link_notes(xml: &str, slide_rel_id: &str, notes_rel_id: &str) -> Result<Option<String>> {
    let needs_link = |e: &BytesStart<'_>| {
        local_name(e.name().as_ref()) == b"sldId"
            && attribute(e, b"r:id").as_deref() == Some(slide_rel_id)
            && attribute(e, b"r:notes").is_none()
    };

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 32));
    let mut linked = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::XmlError(format!("Error parsing presentation: {}", e)))?;
        let written = match event {
            Event::Eof => break,
            Event::Empty(e) if !linked && needs_link(&e) => {
                let mut e = e.into_owned();
                e.push_attribute(("r:notes", notes_rel_id));
                linked = true;
                writer.write_event(Event::Empty(e))
            }
            Event::Start(e) if !linked && needs_link(&e) => {
                let mut e = e.into_owned();
                e.push_attribute(("r:notes", notes_rel_id));
                linked = true;
                writer.write_event(Event::Start(e))
            }
            other => writer.write_event(other),
        };
        written.map_err(|e| Error::XmlError(format!("Error writing presentation: {}", e)))?;
    }

    if !linked {
        return Ok(None);
    }
    String::from_utf8(writer.into_inner())
        .map(Some)
        .map_err(|e| Error::XmlError(format!("Presentation is not UTF-8: {}", e)))
}
