//! Object map: handle → offset index.
//!
//! The AcDb:Handles section encodes (handle, offset) pairs as a sequence
//! of subsections. Each subsection opens with a big-endian 16-bit size,
//! holds pairs delta-encoded against the running values (`Δhandle` as an
//! unsigned modular char, `Δoffset` as a signed one), and closes with a
//! big-endian CRC-16 over the subsection including its size prefix. A
//! subsection of size 2 terminates the map.

use std::collections::HashMap;

use super::constants::{handle_section, CRC16_SEED};
use super::crc::crc16;
use crate::error::{DwgError, Result};
use crate::io::byte_reader::ByteReader;
use crate::types::Handle;

/// The decoded handle → offset index, preserving on-disk order.
#[derive(Debug, Clone, Default)]
pub struct ObjectMap {
    entries: Vec<(Handle, u64)>,
    by_handle: HashMap<u64, u64>,
}

impl ObjectMap {
    /// Offset of the object with the given handle, if mapped.
    pub fn lookup(&self, handle: Handle) -> Option<u64> {
        self.by_handle.get(&handle.value()).copied()
    }

    /// All (handle, offset) pairs in the order they were encountered.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, u64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest and largest mapped handle, when any exist.
    pub fn handle_range(&self) -> Option<(Handle, Handle)> {
        let min = self.entries.iter().map(|(h, _)| *h).min()?;
        let max = self.entries.iter().map(|(h, _)| *h).max()?;
        Some((min, max))
    }
}

/// Parse the handles section into an [`ObjectMap`].
pub fn parse(data: &[u8]) -> Result<ObjectMap> {
    let mut reader = ByteReader::new(data);
    let mut entries: Vec<(Handle, u64)> = Vec::new();

    loop {
        if reader.remaining() < 2 {
            break;
        }
        let section_start = reader.tell() as usize;
        let size = read_u16_be(&mut reader)? as i32;
        if size == 2 {
            break;
        }
        if size < 2 {
            return Err(DwgError::CorruptHandles(format!(
                "invalid subsection size {size}"
            )));
        }
        if reader.remaining() < (size - 2) as usize + 2 {
            return Err(DwgError::CorruptHandles(
                "subsection exceeds remaining data".into(),
            ));
        }

        let payload = (size - 2).min(handle_section::MAX_CHUNK_SIZE) as u64;
        let payload_start = reader.tell();
        let payload_end = payload_start + payload;

        let mut last_handle: u64 = 0;
        let mut last_offset: i64 = 0;

        while reader.tell() < payload_end {
            let delta_handle = read_unsigned_mc(&mut reader)?;
            let delta_offset = read_signed_mc(&mut reader)?;

            last_handle = last_handle.wrapping_add(delta_handle);
            last_offset += delta_offset;

            if last_offset < 0 {
                return Err(DwgError::CorruptHandles(format!(
                    "negative offset for handle {last_handle:#X}"
                )));
            }
            // A zero handle delta marks a dead reference; skip it.
            if delta_handle > 0 {
                entries.push((Handle::new(last_handle), last_offset as u64));
            }
        }

        let crc_pos = reader.tell() as usize;
        let stored = read_u16_be(&mut reader)?;
        let computed = crc16(CRC16_SEED, &data[section_start..crc_pos]);
        if stored != computed {
            return Err(DwgError::CorruptHandles(format!(
                "subsection CRC mismatch: stored {stored:#06X}, computed {computed:#06X}"
            )));
        }
    }

    let mut by_handle = HashMap::with_capacity(entries.len());
    for (handle, offset) in &entries {
        by_handle.insert(handle.value(), *offset);
    }

    Ok(ObjectMap { entries, by_handle })
}

fn read_u16_be(reader: &mut ByteReader<'_>) -> Result<u16> {
    let hi = reader.read_u8()? as u16;
    let lo = reader.read_u8()? as u16;
    Ok((hi << 8) | lo)
}

/// Unsigned modular char: 7-bit groups, high bit continues.
fn read_unsigned_mc(reader: &mut ByteReader<'_>) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = reader.read_u8()?;
        value |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift > 63 {
            return Err(DwgError::CorruptHandles(
                "handle delta does not terminate".into(),
            ));
        }
    }
}

/// Signed modular char: the terminator carries the sign in bit 6.
fn read_signed_mc(reader: &mut ByteReader<'_>) -> Result<i64> {
    let mut value = 0i64;
    let mut shift = 0u32;
    loop {
        let byte = reader.read_u8()?;
        if byte & 0x80 == 0 {
            value |= ((byte & 0x3F) as i64) << shift;
            if byte & 0x40 != 0 {
                value = -value;
            }
            return Ok(value);
        }
        value |= ((byte & 0x7F) as i64) << shift;
        shift += 7;
        if shift > 62 {
            return Err(DwgError::CorruptHandles(
                "offset delta does not terminate".into(),
            ));
        }
    }
}
