//! In-memory view of a PPTX package.
//!
//! The ZIP container is decoded into an ordered map from part path to bytes,
//! mutated in place, and re-encoded with deflate compression.

use deck_core::{Error, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Deflate level used when none is configured.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 6;

/// A decoded package: part paths (case-sensitive, no leading `/`) mapped to
/// their bytes. Entry order from the source archive is kept on re-encoding;
/// new parts are appended.
#[derive(Debug, Clone, Default)]
pub struct Package {
    names: Vec<String>,
    parts: HashMap<String, Vec<u8>>,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a package from its archive bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(data))
    }

    /// Decode a package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut package = Self::new();
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            package.set(name, content);
        }

        log::debug!("Decoded package with {} parts", package.len());
        Ok(package)
    }

    /// Whether a part exists.
    pub fn contains(&self, path: &str) -> bool {
        self.parts.contains_key(path)
    }

    /// Raw bytes of a part.
    pub fn part(&self, path: &str) -> Option<&[u8]> {
        self.parts.get(path).map(Vec::as_slice)
    }

    /// Read a part as UTF-8 text, or `None` when it does not exist.
    /// A leading byte-order mark is dropped.
    pub fn read_str(&self, path: &str) -> Result<Option<String>> {
        match self.parts.get(path) {
            Some(bytes) => String::from_utf8(bytes.clone())
                .map(|s| match s.strip_prefix('\u{feff}') {
                    Some(stripped) => Some(stripped.to_string()),
                    None => Some(s),
                })
                .map_err(|e| Error::PptxParseError(format!("Part '{}' is not UTF-8: {}", path, e))),
            None => Ok(None),
        }
    }

    /// Read a part as UTF-8 text, failing when it does not exist.
    pub fn require_str(&self, path: &str) -> Result<String> {
        self.read_str(path)?
            .ok_or_else(|| Error::MissingPart(path.to_string()))
    }

    /// Add or replace a part.
    pub fn set(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        let path = path.into();
        if !self.parts.contains_key(&path) {
            self.names.push(path.clone());
        }
        self.parts.insert(path, content.into());
    }

    /// Part paths in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the package has no parts.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Encode the package as a deflate-compressed archive.
    ///
    /// Entry timestamps are fixed so equal packages encode to equal bytes.
    pub fn to_bytes(&self, compression_level: i32) -> Result<Vec<u8>> {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level))
            .last_modified_time(zip::DateTime::default());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for name in &self.names {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", name, e)))?;
            writer
                .write_all(&self.parts[name])
                .map_err(|e| Error::ZipError(format!("Failed to write '{}': {}", name, e)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;
        Ok(cursor.into_inner())
    }
}
