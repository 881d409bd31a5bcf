//! Relationship parts (`*.rels`).
//!
//! A relationship file is parsed into an ordered list of records, checked
//! and extended in memory, then written back once.

use crate::constants::RELATIONSHIPS_NS;
use crate::xml::{attribute, local_name};
use deck_core::{escape_xml, Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashSet;

/// A single relationship from the owning part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1"), unique within its file.
    pub id: String,
    /// Relationship type URI.
    pub rel_type: String,
    /// Target reference, relative to the owning part's directory.
    pub target: String,
    /// `TargetMode` attribute, `External` for hyperlinks and the like.
    pub target_mode: Option<String>,
}

impl Relationship {
    /// Create an internal relationship.
    pub fn new(id: impl Into<String>, rel_type: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.into(),
            target: target.into(),
            target_mode: None,
        }
    }
}

/// Ordered collection of relationships owned by one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the XML of a `.rels` part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut rels = Self::new();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"Relationship" =>
                {
                    let id = attribute(e, b"Id").ok_or_else(|| {
                        Error::XmlError("Relationship without an Id attribute".to_string())
                    })?;
                    rels.rels.push(Relationship {
                        id,
                        rel_type: attribute(e, b"Type").unwrap_or_default(),
                        target: attribute(e, b"Target").unwrap_or_default(),
                        target_mode: attribute(e, b"TargetMode"),
                    });
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(rels)
    }

    /// Iterate relationships in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Look up a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.id == id)
    }

    /// First relationship of `rel_type` pointing at `target`.
    pub fn find(&self, rel_type: &str, target: &str) -> Option<&Relationship> {
        self.rels
            .iter()
            .find(|r| r.rel_type == rel_type && r.target == target)
    }

    /// First relationship of `rel_type`.
    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.rel_type == rel_type)
    }

    /// Append a relationship. Fails if its ID is already taken.
    pub fn push(&mut self, rel: Relationship) -> Result<()> {
        if self.get(&rel.id).is_some() {
            return Err(Error::XmlError(format!(
                "Duplicate relationship id '{}'",
                rel.id
            )));
        }
        self.rels.push(rel);
        Ok(())
    }

    /// Pick an unused ID from the band starting at `base`.
    ///
    /// `rId{base + offset}` is preferred so IDs stay predictable. If that one
    /// is taken, the first free `rId{n}` with `n > base` is used instead.
    /// Fails when the band runs past `u32::MAX`.
    pub fn id_in_band(&self, base: u32, offset: u32) -> Result<String> {
        let used: HashSet<u32> = self
            .rels
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse().ok()))
            .collect();
        let exhausted = || Error::XmlError(format!("No free relationship id above rId{}", base));

        if let Some(preferred) = base.checked_add(offset) {
            if !used.contains(&preferred) {
                return Ok(format!("rId{}", preferred));
            }
        }

        let mut candidate = base.checked_add(1).ok_or_else(exhausted)?;
        while used.contains(&candidate) {
            candidate = candidate.checked_add(1).ok_or_else(exhausted)?;
        }
        Ok(format!("rId{}", candidate))
    }

    /// Serialize to the XML of a `.rels` part, in collection order.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, RELATIONSHIPS_NS));

        for rel in &self.rels {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape_xml(&rel.id),
                escape_xml(&rel.rel_type),
                escape_xml(&rel.target),
            ));
            if let Some(mode) = &rel.target_mode {
                xml.push_str(&format!(r#" TargetMode="{}""#, escape_xml(mode)));
            }
            xml.push_str("/>");
        }

        xml.push_str("</Relationships>");
        xml
    }
}
