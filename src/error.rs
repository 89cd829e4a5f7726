//! Error types for the dwgread library.

use std::io;
use thiserror::Error;

/// Main error type for DWG decoding operations.
#[derive(Debug, Error)]
pub enum DwgError {
    /// IO error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The 6-byte magic does not match a supported version code
    #[error("Unsupported DWG version: {0:?}")]
    UnsupportedVersion(String),

    /// A structural byte read went past the end of the input
    #[error("Truncated input: read past end at offset {offset}")]
    Truncated { offset: u64 },

    /// A bit-level read went past the end of the buffer
    #[error("Bit underflow at bit position {bit_position}")]
    BitUnderflow { bit_position: u64 },

    /// A section page failed checksum validation or could not be assembled
    #[error("Corrupt section {section}: {detail}")]
    CorruptSection { section: String, detail: String },

    /// The handle map (object map) failed CRC validation or is malformed
    #[error("Corrupt handle map: {0}")]
    CorruptHandles(String),

    /// Decompression produced or required data outside the declared bounds
    #[error("Corrupt stream: {0}")]
    CorruptStream(String),

    /// An entity parser consumed past its declared object bounds
    #[error(
        "Parser overrun in object {handle:#X}: consumed {consumed_bits} of {available_bits} bits"
    )]
    ParserOverrun {
        handle: u64,
        consumed_bits: u64,
        available_bits: u64,
    },

    /// The external downgrade converter did not produce usable output
    #[error("Conversion failed: {0}")]
    ConvertFailed(String),

    /// Generic structural parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Text decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type alias for dwgread operations.
pub type Result<T> = std::result::Result<T, DwgError>;
