//! Constants, sentinel bytes, and magic numbers for the DWG file format.

/// Logical section names.
pub mod section_names {
    /// All entities, table entries, and objects
    pub const ACDB_OBJECTS: &str = "AcDb:AcDbObjects";
    /// System variables (header variables)
    pub const HEADER: &str = "AcDb:Header";
    /// DXF class definitions
    pub const CLASSES: &str = "AcDb:Classes";
    /// Object map (handle → offset)
    pub const HANDLES: &str = "AcDb:Handles";
    /// Free space information
    pub const OBJ_FREE_SPACE: &str = "AcDb:ObjFreeSpace";
    /// Template metadata
    pub const TEMPLATE: &str = "AcDb:Template";
    /// Auxiliary header data
    pub const AUX_HEADER: &str = "AcDb:AuxHeader";

    /// AC1015 section locator index for a section name.
    ///
    /// Returns `None` for sections not present in the AC1015 locator table.
    pub fn locator_index(name: &str) -> Option<usize> {
        match name {
            HEADER => Some(0),
            CLASSES => Some(1),
            HANDLES => Some(2),
            OBJ_FREE_SPACE => Some(3),
            TEMPLATE => Some(4),
            AUX_HEADER => Some(5),
            _ => None,
        }
    }
}

/// 16-byte section boundary sentinels.
pub mod sentinels {
    /// AcDb:Classes section start sentinel
    pub const CLASSES_START: [u8; 16] = [
        0x8D, 0xA1, 0xC4, 0xB8, 0xC4, 0xA9, 0xF8, 0xC5, 0xC0, 0xDC, 0xF4, 0x5F, 0xE7, 0xCF,
        0xB6, 0x8A,
    ];
    /// AcDb:Classes section end sentinel
    pub const CLASSES_END: [u8; 16] = [
        0x72, 0x5E, 0x3B, 0x47, 0x3B, 0x56, 0x07, 0x3A, 0x3F, 0x23, 0x0B, 0xA0, 0x18, 0x30,
        0x49, 0x75,
    ];
    /// File header end sentinel (AC1015)
    pub const FILE_HEADER_END_AC15: [u8; 16] = [
        0x95, 0xA0, 0x4E, 0x28, 0x99, 0x82, 0x1A, 0xE5, 0x5E, 0x41, 0xE0, 0x5F, 0x9D, 0x3A,
        0x4D, 0x00,
    ];
}

/// AC1018+ paged-layout constants.
pub mod ac18 {
    /// Size of the encrypted metadata block at offset 0x80
    pub const ENCRYPTED_HEADER_SIZE: usize = 0x6C;
    /// XOR mask for data page header decryption
    pub const DECRYPTION_MASK: u32 = 0x4164536B;
    /// Maximum decompressed page payload size
    pub const MAX_PAGE_SIZE: usize = 0x7400;
    /// Data page type marker
    pub const PAGE_TYPE_DATA: u32 = 0x4163043B;
    /// Page map system page type marker
    pub const PAGE_TYPE_PAGE_MAP: u32 = 0x41630E3B;
    /// Section map system page type marker
    pub const PAGE_TYPE_SECTION_MAP: u32 = 0x4163003B;
    /// First page address: pages follow the 0x100-byte file header area
    pub const FIRST_PAGE_ADDRESS: u64 = 0x100;
}

/// AC1021 (R2007) constants.
pub mod ac21 {
    /// Decompressed size of the header metadata
    pub const DECOMPRESSED_HEADER_SIZE: usize = 0x110;
    /// Reed-Solomon block size for the file header
    pub const RS_HEADER_BLOCK_SIZE: usize = 239;
    /// Reed-Solomon data block size for section pages
    pub const RS_PAGE_BLOCK_SIZE: usize = 251;
}

/// Handle/object map constants.
pub mod handle_section {
    /// Maximum payload bytes per object-map subsection
    pub const MAX_CHUNK_SIZE: i32 = 2032;
}

/// Seed for the 16-bit CRC used by AC1015 headers, the object map, and
/// object records.
pub const CRC16_SEED: u16 = 0xC0C1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_index() {
        assert_eq!(section_names::locator_index(section_names::HEADER), Some(0));
        assert_eq!(section_names::locator_index(section_names::CLASSES), Some(1));
        assert_eq!(section_names::locator_index(section_names::HANDLES), Some(2));
        assert_eq!(section_names::locator_index(section_names::ACDB_OBJECTS), None);
    }
}
