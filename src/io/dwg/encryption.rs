//! Decryption routines for the AC1018+ file layout.
//!
//! Two masks cover everything the reader needs:
//!
//! 1. An LCG-generated XOR sequence over the 0x6C-byte metadata block at
//!    file offset 0x80.
//! 2. A position-based XOR mask (`0x4164536B ^ page_offset`) over each
//!    32-byte data page header.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use super::constants::ac18;

/// Generate the XOR sequence that encrypts the 0x6C metadata block.
///
/// A linear congruential generator (`seed * 0x343FD + 0x269EC3`), taking
/// the high byte of each state.
pub fn header_xor_sequence() -> [u8; ac18::ENCRYPTED_HEADER_SIZE] {
    let mut seq = [0u8; ac18::ENCRYPTED_HEADER_SIZE];
    let mut state: u32 = 1;
    for byte in seq.iter_mut() {
        state = state.wrapping_mul(0x343FD).wrapping_add(0x269EC3);
        *byte = (state >> 16) as u8;
    }
    seq
}

/// Decrypt the 0x6C-byte metadata block in place-copy fashion.
pub fn decrypt_metadata_block(encrypted: &[u8]) -> Vec<u8> {
    let mask = header_xor_sequence();
    encrypted
        .iter()
        .zip(mask.iter().cycle())
        .map(|(b, m)| b ^ m)
        .collect()
}

/// Decrypted AC1018+ data page header fields.
///
/// Each data page starts with this 32-byte encrypted header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Section page type; 0x4163043B for data pages
    pub page_type: u32,
    /// Section number within the descriptor
    pub section_number: i32,
    /// Compressed payload size in bytes
    pub compressed_size: u32,
    /// Decompressed (page) size in bytes
    pub page_size: u32,
    /// Start offset of this page in the assembled section
    pub start_offset: u64,
    /// Header checksum, seeded with the data checksum
    pub header_checksum: u32,
    /// Data checksum over the compressed payload, seed 0
    pub data_checksum: u32,
}

/// Decrypt a 32-byte data page header read at `page_offset`.
///
/// Each 32-bit word is XORed with `0x4164536B ^ page_offset`.
pub fn decrypt_page_header(data: &[u8; 32], page_offset: u64) -> PageHeader {
    let mask = ac18::DECRYPTION_MASK ^ (page_offset as u32);

    let mut words = [0u32; 8];
    let mut cursor = Cursor::new(&data[..]);
    for word in words.iter_mut() {
        // The slice is exactly 32 bytes; these reads cannot fail.
        *word = cursor.read_u32::<LittleEndian>().unwrap() ^ mask;
    }

    PageHeader {
        page_type: words[0],
        section_number: words[1] as i32,
        compressed_size: words[2],
        page_size: words[3],
        start_offset: ((words[5] as u64) << 32) | words[4] as u64,
        header_checksum: words[6],
        data_checksum: words[7],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of [`decrypt_page_header`], for round-trip testing.
    fn encrypt_page_header(header: &PageHeader, page_offset: u64) -> [u8; 32] {
        let mask = ac18::DECRYPTION_MASK ^ (page_offset as u32);
        let words = [
            header.page_type,
            header.section_number as u32,
            header.compressed_size,
            header.page_size,
            header.start_offset as u32,
            (header.start_offset >> 32) as u32,
            header.header_checksum,
            header.data_checksum,
        ];
        let mut out = [0u8; 32];
        for (i, word) in words.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&(word ^ mask).to_le_bytes());
        }
        out
    }

    #[test]
    fn test_header_xor_sequence_is_stable() {
        let a = header_xor_sequence();
        let b = header_xor_sequence();
        assert_eq!(a, b);
        // First LCG step: 1 * 0x343FD + 0x269EC3 = 0x2AE2C0 → high byte 0x2A
        assert_eq!(a[0], 0x2A);
    }

    #[test]
    fn test_metadata_block_roundtrip() {
        let plain: Vec<u8> = (0..ac18::ENCRYPTED_HEADER_SIZE as u8).collect();
        let encrypted = decrypt_metadata_block(&plain);
        let decrypted = decrypt_metadata_block(&encrypted);
        assert_eq!(decrypted, plain);
    }

    #[test]
    fn test_page_header_roundtrip() {
        let header = PageHeader {
            page_type: ac18::PAGE_TYPE_DATA,
            section_number: 1,
            compressed_size: 0x7000,
            page_size: 0x7400,
            start_offset: 0,
            header_checksum: 0x12345678,
            data_checksum: 0xABCDEF00,
        };
        let position = 0x100u64;
        let encrypted = encrypt_page_header(&header, position);
        assert_eq!(decrypt_page_header(&encrypted, position), header);
    }

    #[test]
    fn test_page_header_position_dependence() {
        let header = PageHeader {
            page_type: ac18::PAGE_TYPE_DATA,
            section_number: 5,
            compressed_size: 1024,
            page_size: 2048,
            start_offset: 512,
            header_checksum: 0,
            data_checksum: 0,
        };
        let enc1 = encrypt_page_header(&header, 0x0);
        let enc2 = encrypt_page_header(&header, 0x100);
        assert_ne!(enc1, enc2);
        assert_eq!(decrypt_page_header(&enc1, 0x0), header);
        assert_eq!(decrypt_page_header(&enc2, 0x100), header);
    }
}
