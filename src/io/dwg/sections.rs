//! Logical section assembly.
//!
//! AC1015 sections are contiguous ranges named by the locator table.
//! AC1018+ sections are runs of pages: each page carries an encrypted
//! 32-byte header, a checksum over its compressed payload, and LZ77
//! compression; AC1021 pages are additionally Reed-Solomon interleaved.
//! This module turns a section name into one contiguous decompressed
//! byte buffer.

use super::compression::{lz77_ac18, lz77_ac21};
use super::constants::{ac18, ac21, section_names};
use super::crc::section_page_checksum;
use super::encryption;
use super::file_header::{FileHeader, FileHeaderData, SectionDescriptor, SectionPage};
use super::reed_solomon;
use crate::error::{DwgError, Result};
use crate::types::DwgVersion;

/// Resolves section names to assembled byte buffers for one file.
pub struct SectionStore<'a> {
    bytes: &'a [u8],
    header: &'a FileHeader,
}

impl<'a> SectionStore<'a> {
    pub fn new(bytes: &'a [u8], header: &'a FileHeader) -> Self {
        Self { bytes, header }
    }

    /// Assemble a section, failing when it is absent.
    pub fn load(&self, name: &str) -> Result<Vec<u8>> {
        self.try_load(name)?.ok_or_else(|| DwgError::CorruptSection {
            section: name.to_string(),
            detail: "section not present".into(),
        })
    }

    /// Assemble a section, `None` when the file does not carry it.
    pub fn try_load(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match &self.header.data {
            FileHeaderData::Ac15(ac15) => {
                let Some(index) = section_names::locator_index(name) else {
                    return Ok(None);
                };
                let Some(record) = ac15.records.get(&index) else {
                    return Ok(None);
                };
                if record.seeker < 0 || record.size <= 0 {
                    return Ok(None);
                }
                let start = record.seeker as usize;
                let end = start
                    .checked_add(record.size as usize)
                    .ok_or_else(|| DwgError::Parse("locator range overflow".into()))?;
                if end > self.bytes.len() {
                    return Err(DwgError::Truncated {
                        offset: start as u64,
                    });
                }
                Ok(Some(self.bytes[start..end].to_vec()))
            }
            FileHeaderData::Paged(_) => {
                let Some(descriptor) = self.header.descriptor(name) else {
                    return Ok(None);
                };
                let data = if self.header.version == DwgVersion::Ac1021 {
                    self.assemble_ac21(descriptor)?
                } else {
                    self.assemble_ac18(descriptor)?
                };
                Ok(Some(data))
            }
        }
    }

    /// Assemble an AC1018-family section from its pages.
    fn assemble_ac18(&self, descriptor: &SectionDescriptor) -> Result<Vec<u8>> {
        let total = usize::try_from(descriptor.total_size)
            .map_err(|_| self.corrupt(descriptor, "section size exceeds address space"))?;
        let mut output = vec![0u8; total];

        for page in &descriptor.pages {
            let entry = self.header.page(page.id).ok_or_else(|| {
                self.corrupt(descriptor, format!("page {} not in page map", page.id))
            })?;

            let start = entry.address as usize;
            if start + 32 > self.bytes.len() {
                return Err(DwgError::Truncated {
                    offset: entry.address,
                });
            }
            let mut raw_header = [0u8; 32];
            raw_header.copy_from_slice(&self.bytes[start..start + 32]);
            let page_header = encryption::decrypt_page_header(&raw_header, entry.address);

            if page_header.page_type != ac18::PAGE_TYPE_DATA {
                return Err(self.corrupt(
                    descriptor,
                    format!(
                        "page {} has invalid type {:#X}",
                        page.id, page_header.page_type
                    ),
                ));
            }

            if page.uncompressed_size as usize > ac18::MAX_PAGE_SIZE {
                return Err(self.corrupt(
                    descriptor,
                    format!(
                        "page {} declares {} decompressed bytes",
                        page.id, page.uncompressed_size
                    ),
                ));
            }

            let compressed_size = page_header.compressed_size as usize;
            let data_start = start + 32;
            let data_end = data_start
                .checked_add(compressed_size)
                .ok_or_else(|| self.corrupt(descriptor, "page data size overflow"))?;
            if data_end > self.bytes.len() {
                return Err(DwgError::Truncated {
                    offset: data_start as u64,
                });
            }
            let compressed = &self.bytes[data_start..data_end];

            if page_header.data_checksum != 0 {
                let computed = section_page_checksum(0, compressed);
                if computed != page_header.data_checksum {
                    return Err(self.corrupt(
                        descriptor,
                        format!(
                            "page {} checksum mismatch: stored {:#X}, computed {computed:#X}",
                            page.id, page_header.data_checksum
                        ),
                    ));
                }
            }

            let decompressed = if descriptor.compression == 2 {
                lz77_ac18::decompress(compressed, page.uncompressed_size as usize)?
            } else {
                compressed.to_vec()
            };

            self.place(descriptor, &mut output, page, &decompressed)?;
        }

        Ok(output)
    }

    /// Assemble an AC1021 section from Reed-Solomon coded pages.
    fn assemble_ac21(&self, descriptor: &SectionDescriptor) -> Result<Vec<u8>> {
        const RS_DATA_SIZE: u64 = ac21::RS_PAGE_BLOCK_SIZE as u64;

        let total = usize::try_from(descriptor.total_size)
            .map_err(|_| self.corrupt(descriptor, "section size exceeds address space"))?;
        let mut output = vec![0u8; total];

        for page in &descriptor.pages {
            let entry = self.header.page(page.id).ok_or_else(|| {
                self.corrupt(descriptor, format!("page {} not in page map", page.id))
            })?;

            let block_count = page.compressed_size.div_ceil(RS_DATA_SIZE);
            let min_size = RS_DATA_SIZE * block_count;
            let read_size = entry.size.max(min_size) as usize;

            let start = entry.address as usize;
            let end = start
                .checked_add(read_size)
                .ok_or_else(|| self.corrupt(descriptor, "page range overflow"))?;
            if end > self.bytes.len() {
                return Err(DwgError::Truncated {
                    offset: entry.address,
                });
            }

            let decoded = match descriptor.encoding {
                4 => reed_solomon::decode(
                    &self.bytes[start..end],
                    (RS_DATA_SIZE * block_count) as usize,
                    block_count as usize,
                    RS_DATA_SIZE as usize,
                ),
                0 | 1 => self.bytes[start..end].to_vec(),
                other => {
                    return Err(self.corrupt(
                        descriptor,
                        format!("unsupported page encoding {other}"),
                    ))
                }
            };

            let decompressed = if page.compressed_size < page.uncompressed_size {
                let compressed = decoded
                    .get(..page.compressed_size as usize)
                    .ok_or_else(|| self.corrupt(descriptor, "page data out of range"))?;
                lz77_ac21::decompress(compressed, page.uncompressed_size as usize)?
            } else {
                let size = page.uncompressed_size as usize;
                if size > decoded.len() {
                    return Err(self.corrupt(descriptor, "page data out of range"));
                }
                decoded[..size].to_vec()
            };

            self.place(descriptor, &mut output, page, &decompressed)?;
        }

        Ok(output)
    }

    /// Copy one decompressed page into the assembled section at its
    /// declared offset.
    fn place(
        &self,
        descriptor: &SectionDescriptor,
        output: &mut [u8],
        page: &SectionPage,
        data: &[u8],
    ) -> Result<()> {
        let start = page.start_offset as usize;
        if start > output.len() {
            return Err(DwgError::CorruptStream(format!(
                "page offset {start} outside section {} of {} bytes",
                descriptor.name,
                output.len()
            )));
        }
        let end = (start + data.len()).min(output.len());
        output[start..end].copy_from_slice(&data[..end - start]);
        Ok(())
    }

    fn corrupt(&self, descriptor: &SectionDescriptor, detail: impl Into<String>) -> DwgError {
        DwgError::CorruptSection {
            section: descriptor.name.clone(),
            detail: detail.into(),
        }
    }
}
