//! File header parsing.
//!
//! Reads the 6-byte version magic, then dispatches on the layout family:
//!
//! - **AC1015** stores a fixed section locator table directly after the
//!   header fields, closed by a CRC and a 16-byte sentinel.
//! - **AC1018 / AC1024 / AC1027** store an LCG-XOR-encrypted metadata
//!   block at 0x80 pointing at a page map, which in turn locates a
//!   section map describing each logical section as a run of pages.
//! - **AC1021** Reed-Solomon-codes its header block and its pages, and
//!   uses 64-bit page/section map records with UTF-16 section names.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::compression::{lz77_ac18, lz77_ac21};
use super::constants::{ac18, ac21, sentinels};
use super::encryption;
use super::reed_solomon;
use crate::error::{DwgError, Result};
use crate::io::byte_reader::ByteReader;
use crate::types::DwgVersion;

/// One AC1015 section locator record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLocatorRecord {
    pub number: i32,
    pub seeker: i64,
    pub size: i64,
}

/// One page map entry of a paged (AC1018+) file.
#[derive(Debug, Clone, Copy)]
pub struct PageMapEntry {
    /// Page id; negative ids mark gaps
    pub id: i64,
    /// On-disk page size in bytes
    pub size: u64,
    /// Absolute file address of the page
    pub address: u64,
}

/// One page belonging to a logical section.
#[derive(Debug, Clone, Copy)]
pub struct SectionPage {
    /// Page id, resolved through the page map
    pub id: u64,
    /// Offset of this page's data within the assembled section
    pub start_offset: u64,
    /// Compressed payload size
    pub compressed_size: u64,
    /// Decompressed size this page contributes
    pub uncompressed_size: u64,
}

/// Descriptor of one logical section of a paged file.
#[derive(Debug, Clone)]
pub struct SectionDescriptor {
    pub name: String,
    /// Total decompressed size of the assembled section
    pub total_size: u64,
    /// Compression code: 1 = stored raw, 2 = LZ77
    pub compression: u64,
    /// AC1021 page encoding: 4 = Reed-Solomon interleaved, 1 = plain
    pub encoding: u64,
    pub section_id: u64,
    pub pages: Vec<SectionPage>,
}

/// AC1015 header contents.
#[derive(Debug, Clone)]
pub struct Ac15Header {
    pub maintenance_version: u8,
    pub preview_address: i64,
    pub code_page: u16,
    /// Locator records keyed by record number
    pub records: HashMap<usize, SectionLocatorRecord>,
}

/// AC1018+ header contents.
#[derive(Debug, Clone)]
pub struct PagedHeader {
    pub page_map: Vec<PageMapEntry>,
    pub descriptors: Vec<SectionDescriptor>,
}

/// Parsed file header, version plus the layout-specific section index.
#[derive(Debug, Clone)]
pub struct FileHeader {
    pub version: DwgVersion,
    pub data: FileHeaderData,
}

/// Layout-specific header payload.
#[derive(Debug, Clone)]
pub enum FileHeaderData {
    Ac15(Ac15Header),
    Paged(PagedHeader),
}

impl FileHeader {
    /// Find a section descriptor by name (paged layouts only).
    pub fn descriptor(&self, name: &str) -> Option<&SectionDescriptor> {
        match &self.data {
            FileHeaderData::Paged(paged) => {
                paged.descriptors.iter().find(|d| d.name == name)
            }
            FileHeaderData::Ac15(_) => None,
        }
    }

    /// Look up a page map entry by id (paged layouts only).
    pub fn page(&self, id: u64) -> Option<&PageMapEntry> {
        match &self.data {
            FileHeaderData::Paged(paged) => {
                paged.page_map.iter().find(|p| p.id == id as i64)
            }
            FileHeaderData::Ac15(_) => None,
        }
    }
}

/// Parse the file header of `bytes`, dispatching on the version magic.
pub fn parse(bytes: &[u8]) -> Result<FileHeader> {
    let version = DwgVersion::detect(bytes)?;
    let data = match version {
        DwgVersion::Ac1015 => FileHeaderData::Ac15(parse_ac15(bytes)?),
        DwgVersion::Ac1018 | DwgVersion::Ac1024 | DwgVersion::Ac1027 => {
            FileHeaderData::Paged(parse_ac18(bytes)?)
        }
        DwgVersion::Ac1021 => FileHeaderData::Paged(parse_ac21(bytes)?),
    };
    Ok(FileHeader { version, data })
}

// ---------------------------------------------------------------------------
// AC1015
// ---------------------------------------------------------------------------

/// Parse the AC1015 fixed header and section locator table.
///
/// Layout after the 6-byte magic: 7 bytes of padding (maintenance version
/// at its fifth byte), preview address, 2 undocumented bytes, code page,
/// locator record count, the records themselves (number, seeker, size),
/// a CRC, and the 16-byte end sentinel.
fn parse_ac15(bytes: &[u8]) -> Result<Ac15Header> {
    let mut cursor = Cursor::new(bytes);
    cursor.set_position(6);

    let mut padding = [0u8; 7];
    cursor
        .read_exact(&mut padding)
        .map_err(|_| DwgError::Truncated { offset: 6 })?;
    let maintenance_version = padding[5];

    let read_err = |cursor: &Cursor<&[u8]>| DwgError::Truncated {
        offset: cursor.position(),
    };

    let preview_address =
        cursor.read_i32::<LittleEndian>().map_err(|_| read_err(&cursor))? as i64;

    let mut undocumented = [0u8; 2];
    cursor
        .read_exact(&mut undocumented)
        .map_err(|_| read_err(&cursor))?;

    let code_page = cursor.read_u16::<LittleEndian>().map_err(|_| read_err(&cursor))?;

    let record_count =
        cursor.read_i32::<LittleEndian>().map_err(|_| read_err(&cursor))? as usize;
    if record_count > 32 {
        return Err(DwgError::Parse(format!(
            "implausible section locator count {record_count}"
        )));
    }

    let mut records = HashMap::with_capacity(record_count);
    for _ in 0..record_count {
        let number = cursor.read_u8().map_err(|_| read_err(&cursor))? as i32;
        let seeker = cursor.read_i32::<LittleEndian>().map_err(|_| read_err(&cursor))? as i64;
        let size = cursor.read_i32::<LittleEndian>().map_err(|_| read_err(&cursor))? as i64;
        records.insert(
            number as usize,
            SectionLocatorRecord {
                number,
                seeker,
                size,
            },
        );
    }

    let _crc = cursor.read_u16::<LittleEndian>().map_err(|_| read_err(&cursor))?;

    let mut sentinel = [0u8; 16];
    cursor
        .read_exact(&mut sentinel)
        .map_err(|_| read_err(&cursor))?;
    if sentinel != sentinels::FILE_HEADER_END_AC15 {
        return Err(DwgError::Parse(
            "AC1015 file header end sentinel mismatch".into(),
        ));
    }

    Ok(Ac15Header {
        maintenance_version,
        preview_address,
        code_page,
        records,
    })
}

// ---------------------------------------------------------------------------
// AC1018 family
// ---------------------------------------------------------------------------

/// Metadata decrypted from the block at 0x80.
struct Ac18Metadata {
    page_map_address: u64,
    section_map_id: u32,
}

fn parse_ac18_metadata(bytes: &[u8]) -> Result<Ac18Metadata> {
    const METADATA_OFFSET: usize = 0x80;
    if bytes.len() < METADATA_OFFSET + ac18::ENCRYPTED_HEADER_SIZE {
        return Err(DwgError::Truncated {
            offset: bytes.len() as u64,
        });
    }
    let decrypted = encryption::decrypt_metadata_block(
        &bytes[METADATA_OFFSET..METADATA_OFFSET + ac18::ENCRYPTED_HEADER_SIZE],
    );

    let mut reader = ByteReader::new(&decrypted);
    reader.seek(0x50)?;
    let _page_map_id = reader.read_u32_le()?;
    let page_map_address = reader
        .read_u64_le()?
        .checked_add(ac18::FIRST_PAGE_ADDRESS)
        .ok_or_else(|| DwgError::Parse("page map address overflow".into()))?;
    let section_map_id = reader.read_u32_le()?;
    let _section_array_page_size = reader.read_u32_le()?;
    let _gap_array_size = reader.read_u32_le()?;

    Ok(Ac18Metadata {
        page_map_address,
        section_map_id,
    })
}

/// Read and decompress an AC1018 system section (page map or section map).
fn read_system_section(bytes: &[u8], address: u64, expected_magic: u32) -> Result<Vec<u8>> {
    let offset = usize::try_from(address)
        .ok()
        .filter(|o| o.checked_add(0x14).is_some_and(|end| end <= bytes.len()))
        .ok_or(DwgError::Truncated { offset: address })?;
    let mut reader = ByteReader::new(&bytes[offset..]);
    let magic = reader.read_u32_le()?;
    let decompressed_size = reader.read_u32_le()? as usize;
    let compressed_size = reader.read_u32_le()? as usize;
    let compression_type = reader.read_u32_le()?;
    let _checksum = reader.read_u32_le()?;

    if magic != expected_magic {
        return Err(DwgError::Parse(format!(
            "unexpected system section magic {magic:#X} at {address:#X}"
        )));
    }

    let data_offset = offset + 0x14;
    let data_end = data_offset
        .checked_add(compressed_size)
        .ok_or_else(|| DwgError::Parse("system section size overflow".into()))?;
    if data_end > bytes.len() {
        return Err(DwgError::Truncated {
            offset: data_offset as u64,
        });
    }
    if compressed_size == 0 {
        return Ok(Vec::new());
    }

    match compression_type {
        2 => lz77_ac18::decompress(&bytes[data_offset..data_end], decompressed_size),
        1 => Ok(bytes[data_offset..data_end].to_vec()),
        other => Err(DwgError::Parse(format!(
            "unsupported system section compression type {other}"
        ))),
    }
}

fn parse_ac18(bytes: &[u8]) -> Result<PagedHeader> {
    let metadata = parse_ac18_metadata(bytes)?;
    let page_map = read_page_map_ac18(bytes, &metadata)?;
    let descriptors = read_section_map_ac18(bytes, &metadata, &page_map)?;
    Ok(PagedHeader {
        page_map,
        descriptors,
    })
}

/// Parse the page map: (id, size) pairs, addresses running from 0x100.
/// Negative ids are gaps and carry four extra words.
fn read_page_map_ac18(bytes: &[u8], metadata: &Ac18Metadata) -> Result<Vec<PageMapEntry>> {
    let data = read_system_section(bytes, metadata.page_map_address, ac18::PAGE_TYPE_PAGE_MAP)?;
    let mut reader = ByteReader::new(&data);
    let mut address = ac18::FIRST_PAGE_ADDRESS;
    let mut entries = Vec::new();

    while reader.remaining() >= 8 {
        let id = reader.read_i32_le()? as i64;
        let size = reader.read_u32_le()? as u64;
        entries.push(PageMapEntry { id, size, address });
        address = address
            .checked_add(size)
            .ok_or_else(|| DwgError::Parse("page map address overflow".into()))?;
        if id < 0 {
            if reader.remaining() < 16 {
                return Err(DwgError::Parse("page map gap entry truncated".into()));
            }
            reader.skip(16)?;
        }
    }

    Ok(entries)
}

/// Parse the section map into descriptors with resolved page lists.
fn read_section_map_ac18(
    bytes: &[u8],
    metadata: &Ac18Metadata,
    page_map: &[PageMapEntry],
) -> Result<Vec<SectionDescriptor>> {
    let map_page = page_map
        .iter()
        .find(|entry| entry.id == metadata.section_map_id as i64)
        .ok_or_else(|| {
            DwgError::Parse(format!(
                "section map page {} not found in page map",
                metadata.section_map_id
            ))
        })?;

    let data = read_system_section(bytes, map_page.address, ac18::PAGE_TYPE_SECTION_MAP)?;
    let mut reader = ByteReader::new(&data);

    let descriptor_count = reader.read_u32_le()?;
    let _x02 = reader.read_u32_le()?;
    let _max_page = reader.read_u32_le()?;
    let _x00 = reader.read_u32_le()?;
    let _count_copy = reader.read_u32_le()?;

    let mut descriptors = Vec::with_capacity(descriptor_count as usize);
    for _ in 0..descriptor_count {
        if reader.remaining() < 96 {
            return Err(DwgError::Parse("section map entry truncated".into()));
        }
        let total_size = reader.read_u64_le()?;
        let page_count = reader.read_u32_le()?;
        let max_decompressed_size = reader.read_u32_le()? as u64;
        let _unknown = reader.read_u32_le()?;
        let compression = reader.read_u32_le()? as u64;
        let section_id = reader.read_u32_le()? as u64;
        let _encrypted = reader.read_u32_le()?;
        let name_bytes = reader.read_bytes(64)?;
        let name = cstring(name_bytes);

        let mut pages = Vec::with_capacity(page_count as usize);
        for _ in 0..page_count {
            if reader.remaining() < 16 {
                return Err(DwgError::Parse("section page info truncated".into()));
            }
            let page_id = reader.read_u32_le()? as u64;
            let compressed_size = reader.read_u32_le()? as u64;
            let start_offset = reader.read_u64_le()?;
            pages.push(SectionPage {
                id: page_id,
                start_offset,
                compressed_size,
                uncompressed_size: max_decompressed_size,
            });
        }

        // The last page fills only the remainder of the section.
        if max_decompressed_size > 0 && total_size % max_decompressed_size > 0 {
            if let Some(last) = pages.last_mut() {
                last.uncompressed_size = total_size % max_decompressed_size;
            }
        }

        if name.is_empty() {
            continue;
        }

        descriptors.push(SectionDescriptor {
            name,
            total_size,
            compression,
            encoding: 0,
            section_id,
            pages,
        });
    }

    Ok(descriptors)
}

// ---------------------------------------------------------------------------
// AC1021
// ---------------------------------------------------------------------------

/// Header metadata recovered from the Reed-Solomon coded block at 0x80.
struct Ac21Metadata {
    pages_map_offset: u64,
    pages_map_size_compressed: u64,
    pages_map_size_uncompressed: u64,
    pages_map_correction: u64,
    sections_map_id: u64,
    sections_map_size_compressed: u64,
    sections_map_size_uncompressed: u64,
    sections_map_correction: u64,
    sections_amount: u64,
}

/// Pages of AC1021 files start after a 0x480-byte header area.
const AC21_STREAM_BASE: u64 = 0x480;
const AC21_HEADER_RS_SIZE: usize = 0x3D8;
const AC21_HEADER_PAYLOAD_OFFSET: usize = 0x20;

fn parse_ac21_metadata(bytes: &[u8]) -> Result<Ac21Metadata> {
    const HEADER_OFFSET: usize = 0x80;
    if bytes.len() < HEADER_OFFSET + AC21_HEADER_RS_SIZE {
        return Err(DwgError::Truncated {
            offset: bytes.len() as u64,
        });
    }

    let decoded = reed_solomon::decode(
        &bytes[HEADER_OFFSET..HEADER_OFFSET + AC21_HEADER_RS_SIZE],
        3 * ac21::RS_HEADER_BLOCK_SIZE,
        3,
        ac21::RS_HEADER_BLOCK_SIZE,
    );

    let mut reader = ByteReader::new(&decoded);
    let _crc = reader.read_u64_le()?;
    let _key = reader.read_u64_le()?;
    let _compressed_crc = reader.read_u64_le()?;
    let compressed_size = reader.read_i32_le()?;
    let _length2 = reader.read_i32_le()?;

    let body = if compressed_size < 0 {
        let size = compressed_size.unsigned_abs() as usize;
        let end = AC21_HEADER_PAYLOAD_OFFSET + size;
        if end > decoded.len() {
            return Err(DwgError::Parse("AC21 header body out of range".into()));
        }
        decoded[AC21_HEADER_PAYLOAD_OFFSET..end].to_vec()
    } else if compressed_size > 0 {
        let end = AC21_HEADER_PAYLOAD_OFFSET + compressed_size as usize;
        if end > decoded.len() {
            return Err(DwgError::Parse("AC21 header body out of range".into()));
        }
        lz77_ac21::decompress(
            &decoded[AC21_HEADER_PAYLOAD_OFFSET..end],
            ac21::DECOMPRESSED_HEADER_SIZE,
        )?
    } else {
        return Err(DwgError::Parse("AC21 header compressed size is zero".into()));
    };

    if body.len() < ac21::DECOMPRESSED_HEADER_SIZE {
        return Err(DwgError::Parse("AC21 header body truncated".into()));
    }

    let mut fields = [0u64; 34];
    let mut body_reader = ByteReader::new(&body[..ac21::DECOMPRESSED_HEADER_SIZE]);
    for field in fields.iter_mut() {
        *field = body_reader.read_u64_le()?;
    }

    Ok(Ac21Metadata {
        pages_map_offset: fields[7],
        pages_map_size_compressed: fields[10],
        pages_map_size_uncompressed: fields[11],
        pages_map_correction: fields[3],
        sections_map_id: fields[24],
        sections_map_size_compressed: fields[22],
        sections_map_size_uncompressed: fields[25],
        sections_map_correction: fields[27],
        sections_amount: fields[20],
    })
}

/// Read and decode an AC1021 system page (page map or section map).
fn read_ac21_system_page(
    bytes: &[u8],
    address: u64,
    size_compressed: u64,
    size_uncompressed: u64,
    correction: u64,
) -> Result<Vec<u8>> {
    const RS_DATA_SIZE: u64 = 239;
    const RS_CODEWORD_SIZE: u64 = 255;

    let padded = (size_compressed + 7) & !7u64;
    let pre_encoded = padded
        .checked_mul(correction.max(1))
        .ok_or_else(|| DwgError::Parse("AC21 system page size overflow".into()))?;
    let block_count = pre_encoded.div_ceil(RS_DATA_SIZE);
    let page_size = (block_count * RS_CODEWORD_SIZE + 0x1F) & !0x1Fu64;

    let start = address as usize;
    let end = start
        .checked_add(page_size as usize)
        .ok_or_else(|| DwgError::Parse("AC21 system page range overflow".into()))?;
    if end > bytes.len() {
        return Err(DwgError::Truncated { offset: address });
    }

    let decoded = reed_solomon::decode(
        &bytes[start..end],
        (block_count * RS_DATA_SIZE) as usize,
        block_count as usize,
        RS_DATA_SIZE as usize,
    );

    if size_compressed < size_uncompressed {
        lz77_ac21::decompress(
            &decoded[..size_compressed as usize],
            size_uncompressed as usize,
        )
    } else {
        let size = size_uncompressed as usize;
        if size > decoded.len() {
            return Err(DwgError::Parse("AC21 system page data out of range".into()));
        }
        Ok(decoded[..size].to_vec())
    }
}

fn parse_ac21(bytes: &[u8]) -> Result<PagedHeader> {
    let metadata = parse_ac21_metadata(bytes)?;

    // Page map: (size, id) u64 pairs, addresses running from 0x480.
    let map_address = AC21_STREAM_BASE
        .checked_add(metadata.pages_map_offset)
        .ok_or_else(|| DwgError::Parse("AC21 page map address overflow".into()))?;
    let data = read_ac21_system_page(
        bytes,
        map_address,
        metadata.pages_map_size_compressed,
        metadata.pages_map_size_uncompressed,
        metadata.pages_map_correction,
    )?;

    let mut reader = ByteReader::new(&data);
    let mut page_map = Vec::new();
    let mut address = AC21_STREAM_BASE;
    while reader.remaining() >= 16 {
        let size = reader.read_u64_le()? as i64;
        let id = reader.read_u64_le()? as i64;
        if size == 0 && id == 0 {
            break;
        }
        if size <= 0 {
            return Err(DwgError::Parse("AC21 page map entry has invalid size".into()));
        }
        page_map.push(PageMapEntry {
            id,
            size: size as u64,
            address,
        });
        address = address
            .checked_add(size as u64)
            .ok_or_else(|| DwgError::Parse("AC21 page map address overflow".into()))?;
    }

    // Section map: 64-bit records with UTF-16LE names.
    let map_page = page_map
        .iter()
        .find(|entry| entry.id == metadata.sections_map_id as i64)
        .ok_or_else(|| DwgError::Parse("AC21 section map page not found".into()))?;
    let data = read_ac21_system_page(
        bytes,
        map_page.address,
        metadata.sections_map_size_compressed,
        metadata.sections_map_size_uncompressed,
        metadata.sections_map_correction,
    )?;

    let mut reader = ByteReader::new(&data);
    let mut descriptors = Vec::new();
    let max_sections = if metadata.sections_amount > 0 {
        metadata.sections_amount.saturating_sub(1) as usize
    } else {
        usize::MAX
    };

    while reader.remaining() >= 64 && descriptors.len() < max_sections {
        let total_size = reader.read_u64_le()?;
        let _max_size = reader.read_u64_le()?;
        let encrypted = reader.read_u64_le()?;
        let _hash_code = reader.read_u64_le()?;
        let name_length = reader.read_u64_le()? as usize;
        let _unknown = reader.read_u64_le()?;
        let encoding = reader.read_u64_le()?;
        let page_count = reader.read_u64_le()? as usize;

        if total_size == 0 && page_count == 0 && name_length == 0 {
            break;
        }
        if encrypted == 1 {
            return Err(DwgError::Parse(
                "encrypted AC21 sections are not supported".into(),
            ));
        }

        if reader.remaining() < name_length {
            return Err(DwgError::Parse("AC21 section name truncated".into()));
        }
        let name = utf16_cstring(reader.read_bytes(name_length)?);

        let mut pages = Vec::with_capacity(page_count);
        for _ in 0..page_count {
            if reader.remaining() < 56 {
                return Err(DwgError::Parse("AC21 section page info truncated".into()));
            }
            let start_offset = reader.read_u64_le()?;
            let _size = reader.read_u64_le()?;
            let id = reader.read_u64_le()?;
            let uncompressed_size = reader.read_u64_le()?;
            let compressed_size = reader.read_u64_le()?;
            let _checksum = reader.read_u64_le()?;
            let _crc = reader.read_u64_le()?;
            pages.push(SectionPage {
                id,
                start_offset,
                compressed_size,
                uncompressed_size,
            });
        }

        descriptors.push(SectionDescriptor {
            name,
            total_size,
            compression: 0,
            encoding,
            section_id: 0,
            pages,
        });
    }

    Ok(PagedHeader {
        page_map,
        descriptors,
    })
}

fn cstring(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn utf16_cstring(bytes: &[u8]) -> String {
    let (decoded, _, _) = encoding_rs::UTF_16LE.decode(bytes);
    decoded.trim_end_matches('\0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_magic() {
        let err = parse(b"AC1009xxxxxxxxxxxxxxxxxx").unwrap_err();
        assert!(matches!(err, DwgError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_truncated_ac15_header() {
        let err = parse(b"AC1015\x00\x00").unwrap_err();
        assert!(matches!(err, DwgError::Truncated { .. }));
    }

    #[test]
    fn test_cstring_stops_at_nul() {
        assert_eq!(cstring(b"AcDb:Handles\0\0\0"), "AcDb:Handles");
        assert_eq!(cstring(b"abc"), "abc");
    }

    #[test]
    fn test_utf16_cstring() {
        let bytes: Vec<u8> = "AcDb:Header\0"
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        assert_eq!(utf16_cstring(&bytes), "AcDb:Header");
    }
}
