//! Binary DWG decoding.
//!
//! The pipeline, leaves first: [`bit_reader`] unpacks typed values from
//! non-byte-aligned object data, [`file_header`] locates sections for the
//! detected version, [`sections`] reassembles the paged system sections of
//! AC1018+ files, [`object_map`] indexes handles to offsets, and
//! [`reader`] walks every slot through the per-entity parsers into a
//! document.

pub mod bit_reader;
pub mod classes;
pub mod compression;
pub mod constants;
pub mod crc;
pub mod encryption;
pub mod file_header;
pub mod object_map;
pub mod object_type;
pub mod reader;
pub mod reed_solomon;
pub mod sections;

pub use reader::DwgReader;
