//! DWG reading pipeline.
//!
//! [`DwgReader`] drives the decode: parse the file header, assemble the
//! needed sections, build the object map, then walk every slot through
//! the object reader into a frozen [`Document`].

mod common;
mod entities;
mod object_reader;
mod tables;

pub use object_reader::{DecodedObject, ObjectReader, ObjectStreams};

use std::fs;
use std::path::Path;

use crate::document::Document;
use crate::error::{DwgError, Result};
use crate::io::dwg::classes::{self, ClassMap};
use crate::io::dwg::constants::section_names;
use crate::io::dwg::file_header::{self, FileHeaderData};
use crate::io::dwg::object_map;
use crate::io::dwg::sections::SectionStore;
use crate::notification::NotificationType;
use crate::types::DwgVersion;

/// Pre-computed version gates threaded through the parsers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VersionFlags {
    pub r2004_plus: bool,
    pub r2007_plus: bool,
    pub r2010_plus: bool,
    pub r2013_plus: bool,
}

impl VersionFlags {
    pub fn new(version: DwgVersion) -> Self {
        Self {
            r2004_plus: version >= DwgVersion::Ac1018,
            r2007_plus: version >= DwgVersion::Ac1021,
            r2010_plus: version >= DwgVersion::Ac1024,
            r2013_plus: version >= DwgVersion::Ac1027,
        }
    }
}

/// Reads a DWG byte stream into a [`Document`].
pub struct DwgReader {
    bytes: Vec<u8>,
}

impl DwgReader {
    /// Open a DWG file by path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            bytes: fs::read(path)?,
        })
    }

    /// Wrap an in-memory byte stream.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Decode the whole stream.
    ///
    /// Structural failures (unsupported version, truncation, section or
    /// handle-map corruption) abort the decode; no partial document is
    /// returned. Failures inside a single object skip that object with a
    /// notification.
    pub fn read(self) -> Result<Document> {
        let header = file_header::parse(&self.bytes)?;
        let version = header.version;
        let store = SectionStore::new(&self.bytes, &header);

        // Classes feed diagnostics only; a missing or malformed section
        // degrades to an empty map.
        let classes: ClassMap = match store.try_load(section_names::CLASSES)? {
            Some(data) => classes::parse(&data, version).unwrap_or_default(),
            None => ClassMap::default(),
        };

        let handles_data = store.load(section_names::HANDLES)?;
        let map = object_map::parse(&handles_data).map_err(|e| match e {
            DwgError::Truncated { .. } => DwgError::CorruptHandles("section truncated".into()),
            other => other,
        })?;

        // AC1015 stores objects at absolute file offsets; AC1018+ in the
        // assembled AcDb:AcDbObjects stream.
        let assembled;
        let objects_data: &[u8] = match &header.data {
            FileHeaderData::Ac15(_) => &self.bytes,
            FileHeaderData::Paged(_) => {
                assembled = store.load(section_names::ACDB_OBJECTS)?;
                &assembled
            }
        };

        let mut object_reader = ObjectReader::new(version, objects_data, &classes);
        let mut document = Document::new(version, version);

        for (handle, offset) in map.iter() {
            match object_reader.read_object(handle, offset) {
                Ok(DecodedObject::Entity(record)) => document.insert_entity(record),
                Ok(DecodedObject::Layer(layer)) => document.insert_layer(layer),
                Ok(DecodedObject::Skipped) => {}
                Err(error) => {
                    object_reader.notify(
                        NotificationType::Error,
                        format!("object {handle} skipped: {error}"),
                    );
                }
            }
        }

        document.notifications = object_reader.notifications;
        Ok(document)
    }
}
