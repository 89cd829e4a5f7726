//! # dwgread
//!
//! A read-only decoder for binary DWG files, versions AC1015 (R2000)
//! through AC1027 (R2013).
//!
//! The decoder transforms an on-disk byte stream into a queryable
//! document model: entities grouped by layout, with geometry normalized
//! to a uniform convention (angles in degrees, coordinates as 3D
//! doubles). A lower-level [`raw`] surface exposes per-entity decode
//! records for tooling and diagnostics.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! let doc = dwgread::read("drawing.dwg")?;
//! for entity in doc.modelspace().query("LINE ARC") {
//!     println!("{} {}", entity.dxftype(), entity.handle());
//!     if let Some((x, y, z)) = entity.dxf().get("start").and_then(|v| v.as_point()) {
//!         println!("  start = ({x}, {y}, {z})");
//!     }
//! }
//! # Ok::<(), dwgread::DwgError>(())
//! ```
//!
//! ## Pipeline
//!
//! Bytes → file header (version dispatch) → system section assembly
//! (AC1018+ pages: decrypt, checksum, decompress) → object map
//! (handle → offset) → per-object bitstream parsing (common entity
//! header + type-specific fields) → frozen [`Document`].
//!
//! ## AC1027 downgrade
//!
//! When the `DWGREAD_CONVERTER` environment variable names an external
//! converter executable, AC1027 inputs are pre-processed into AC1018 and
//! decoded from the converted stream; the document keeps the original
//! version tag.

pub mod convert;
pub mod document;
pub mod entities;
pub mod error;
pub mod io;
pub mod notification;
pub mod raw;
pub mod types;

use std::fs;
use std::path::Path;

pub use document::{Document, DxfAttributes, DxfValue, Entity, Layout};
pub use entities::EntityRecord;
pub use error::{DwgError, Result};
pub use io::dwg::DwgReader;
pub use types::{Color, DwgVersion, Handle, Vector2, Vector3};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Decode the DWG file at `path` into a [`Document`].
///
/// This is the main entry point. AC1027 inputs are routed through the
/// downgrade shim when a converter is configured (see [`convert`]);
/// everything else decodes natively.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let version = DwgVersion::detect(&bytes)?;

    if version == DwgVersion::Ac1027 && convert::converter_configured() {
        let converted = convert::convert_to_ac1018(path)?;
        let converted_bytes = fs::read(&converted)?;
        let mut document = DwgReader::from_bytes(converted_bytes).read()?;
        // The document reports the source file's version; decode_version
        // records what was actually parsed.
        document.version = version;
        return Ok(document);
    }

    DwgReader::from_bytes(bytes).read()
}
