//! Object dispatching.
//!
//! Given a slot from the object map, reads the object's size prefix and
//! type code, sets up the object/handle/text sub-streams, routes to the
//! matching parser, then checks the parser stayed inside its bounds and
//! that the trailing CRC matches.

use super::VersionFlags;
use crate::entities::{EntityRecord, Unsupported};
use crate::error::{DwgError, Result};
use crate::document::LayerRecord;
use crate::io::dwg::bit_reader::BitReader;
use crate::io::dwg::classes::ClassMap;
use crate::io::dwg::constants::CRC16_SEED;
use crate::io::dwg::crc::crc16;
use crate::io::dwg::object_type::{self, ObjectClass};
use crate::notification::{Notification, NotificationType};
use crate::types::{DwgVersion, Handle};

/// What one object map slot decoded to.
#[derive(Debug)]
pub enum DecodedObject {
    Entity(EntityRecord),
    Layer(LayerRecord),
    /// A non-graphical object the document model does not keep
    Skipped,
}

/// The object/handle/text sub-streams for one object parse.
///
/// The three readers share the objects buffer but hold independent
/// cursors: type-specific fields come from `object`, cross-references
/// from `handles`, and (AC1021+) strings from `text`.
pub struct ObjectStreams<'a> {
    pub object: BitReader<'a>,
    pub handles: BitReader<'a>,
    pub text: BitReader<'a>,
    /// Whether strings live in a separate stream (AC1021+)
    pub separate_text: bool,
    /// Handle of the object being read; base for relative references
    pub current_handle: u64,
    /// Bit position where object data starts (after the size prefix)
    pub body_start_bits: u64,
    /// Bit position just past the object data (before the CRC)
    pub data_end_bits: u64,
    /// Start of the trailing handle stream, once known
    pub handle_stream_start: Option<u64>,
}

impl ObjectStreams<'_> {
    /// Read a resolved handle reference from the handle stream.
    pub fn handle_ref(&mut self) -> Result<u64> {
        self.handles.handle_reference(self.current_handle)
    }

    /// Read variable text from the appropriate stream.
    pub fn read_text(&mut self) -> Result<String> {
        if self.separate_text {
            self.text.read_variable_text()
        } else {
            self.object.read_variable_text()
        }
    }
}

/// Reads objects out of the assembled AcDb:AcDbObjects stream.
pub struct ObjectReader<'a> {
    pub(super) version: DwgVersion,
    pub(super) flags: VersionFlags,
    data: &'a [u8],
    classes: &'a ClassMap,
    /// Diagnostics accumulated across the read
    pub notifications: Vec<Notification>,
}

impl<'a> ObjectReader<'a> {
    pub fn new(version: DwgVersion, data: &'a [u8], classes: &'a ClassMap) -> Self {
        Self {
            version,
            flags: VersionFlags::new(version),
            data,
            classes,
            notifications: Vec::new(),
        }
    }

    pub(super) fn notify(&mut self, kind: NotificationType, message: impl Into<String>) {
        self.notifications.push(Notification::new(kind, message));
    }

    /// Decode the object at `offset` for `handle`.
    ///
    /// Parse errors fail this object only; the caller skips it and keeps
    /// iterating the map.
    pub fn read_object(&mut self, handle: Handle, offset: u64) -> Result<DecodedObject> {
        let (raw_type, mut streams) = self.open_object(handle, offset)?;

        let decoded = match object_type::classify(raw_type) {
            ObjectClass::Supported(kind) => {
                let record = self.read_entity(kind, &mut streams)?;
                self.check_overrun(handle, &streams)?;
                DecodedObject::Entity(record)
            }
            ObjectClass::UnsupportedEntity => {
                // Best-effort common header: the mode bits place the
                // placeholder into a layout.
                let entity_mode = self
                    .read_common_entity_data(&mut streams)
                    .ok()
                    .map(|c| c.entity_mode);
                DecodedObject::Entity(EntityRecord::Unsupported(Unsupported {
                    handle,
                    raw_type,
                    dxf_name: object_type::fixed_code_name(raw_type).map(String::from),
                    entity_mode,
                }))
            }
            ObjectClass::ClassBased => {
                let class = self.classes.get(raw_type);
                let dxf_name = class.map(|c| c.dxf_name.clone());
                let is_entity = class.map(|c| c.item_class_id == 0x1F2).unwrap_or(false);
                if class.is_none() {
                    self.notify(
                        NotificationType::Warning,
                        format!("object {handle}: unknown class number {raw_type}"),
                    );
                }
                if is_entity {
                    let entity_mode = self
                        .read_common_entity_data(&mut streams)
                        .ok()
                        .map(|c| c.entity_mode);
                    DecodedObject::Entity(EntityRecord::Unsupported(Unsupported {
                        handle,
                        raw_type,
                        dxf_name,
                        entity_mode,
                    }))
                } else {
                    DecodedObject::Skipped
                }
            }
            ObjectClass::Layer => DecodedObject::Layer(self.read_layer(handle, &mut streams)?),
            ObjectClass::NonGraphical => DecodedObject::Skipped,
        };

        self.verify_object_crc(handle, offset, streams.data_end_bits);
        Ok(decoded)
    }

    /// Read the size prefix and type code, and set up sub-streams.
    fn open_object(&mut self, handle: Handle, offset: u64) -> Result<(i16, ObjectStreams<'a>)> {
        if offset as usize >= self.data.len() {
            return Err(DwgError::Truncated { offset });
        }

        let mut object = BitReader::new(self.data, self.version);
        object.set_position_in_bits(offset * 8);

        // MS: size of the object data in bytes, excluding this prefix and
        // the trailing CRC.
        let size = object.read_modular_short()? as u64;
        if size == 0 {
            return Err(DwgError::Parse(format!(
                "object {handle} has zero size"
            )));
        }

        let body_start_bits = object.position_in_bits();
        let data_end_bits = body_start_bits + size * 8;
        // The trailing CRC must also fit.
        if data_end_bits + 16 > object.len_bits() {
            return Err(DwgError::Truncated { offset });
        }

        let mut handle_stream_start = None;
        let mut handles = BitReader::new(self.data, self.version);
        let mut text = BitReader::new(self.data, self.version);
        let mut separate_text = false;

        if self.flags.r2010_plus {
            // MC: handle stream size in bits, counted back from the end
            // of the object data.
            let handle_bits = object.read_modular_char()?;
            if handle_bits > size * 8 {
                return Err(DwgError::Parse(format!(
                    "object {handle}: handle stream of {handle_bits} bits exceeds object data"
                )));
            }
            let start = data_end_bits - handle_bits;
            handles.set_position_in_bits(start);
            text.set_position_by_flag(start - 1)?;
            separate_text = true;
            handle_stream_start = Some(start);
        }

        let raw_type = object.read_object_type()?;

        Ok((
            raw_type,
            ObjectStreams {
                object,
                handles,
                text,
                separate_text,
                current_handle: handle.value(),
                body_start_bits,
                data_end_bits,
                handle_stream_start,
            },
        ))
    }

    /// Fail when a parser consumed past its boundary.
    ///
    /// The boundary is the handle stream when one exists, the CRC
    /// otherwise. Underconsumption is tolerated (reserved trailing
    /// fields).
    fn check_overrun(&self, handle: Handle, streams: &ObjectStreams<'_>) -> Result<()> {
        let boundary = streams
            .handle_stream_start
            .unwrap_or(streams.data_end_bits);
        let consumed = streams.object.position_in_bits();
        if consumed > boundary {
            return Err(DwgError::ParserOverrun {
                handle: handle.value(),
                consumed_bits: consumed - streams.body_start_bits,
                available_bits: boundary - streams.body_start_bits,
            });
        }
        Ok(())
    }

    /// Compare the trailing CRC-16 of the object record against the
    /// stored value. A mismatch on an otherwise parsed object is a
    /// warning, not a failure.
    fn verify_object_crc(&mut self, handle: Handle, offset: u64, data_end_bits: u64) {
        let record_start = offset as usize;
        let data_end = (data_end_bits / 8) as usize;
        if data_end + 2 > self.data.len() {
            return;
        }
        let stored = u16::from_le_bytes([self.data[data_end], self.data[data_end + 1]]);
        let computed = crc16(CRC16_SEED, &self.data[record_start..data_end]);
        if stored != computed {
            self.notify(
                NotificationType::Warning,
                format!(
                    "object {handle}: CRC mismatch (stored {stored:#06X}, computed {computed:#06X})"
                ),
            );
        }
    }
}
