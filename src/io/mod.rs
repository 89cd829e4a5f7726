//! I/O layer: byte-level reading and the DWG binary decoder.

pub mod byte_reader;
pub mod dwg;

pub use byte_reader::ByteReader;
pub use dwg::reader::DwgReader;
