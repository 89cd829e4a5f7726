//! Low-level per-entity decode surface.
//!
//! Each function runs the full decode pipeline on the file at `path` and
//! returns the raw records of one entity type, in on-disk order, with
//! angles in radians exactly as read. Intended for tooling and
//! diagnostics; the high-level surface is [`crate::read`].

use std::path::Path;

use crate::entities::{
    Arc, Circle, Dimension, Ellipse, EntityRecord, Insert, Line, LwPolyline, MText, Point, Text,
};
use crate::error::Result;
use crate::io::dwg::reader::DwgReader;
use crate::types::DwgVersion;

/// Detect the version magic of a file without decoding it.
pub fn detect_version<P: AsRef<Path>>(path: P) -> Result<DwgVersion> {
    let bytes = std::fs::read(path)?;
    DwgVersion::detect(&bytes)
}

fn decode_records<P: AsRef<Path>>(path: P) -> Result<Vec<EntityRecord>> {
    let document = DwgReader::from_file(path)?.read()?;
    Ok(document.entities_by_handle.into_values().collect())
}

macro_rules! raw_decoder {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $record:ty) => {
        $(#[$doc])*
        pub fn $name<P: AsRef<Path>>(path: P) -> Result<Vec<$record>> {
            Ok(decode_records(path)?
                .into_iter()
                .filter_map(|record| match record {
                    EntityRecord::$variant(e) => Some(e),
                    _ => None,
                })
                .collect())
        }
    };
}

raw_decoder!(
    /// Decode every LINE in the file.
    decode_line_entities,
    Line,
    Line
);
raw_decoder!(
    /// Decode every ARC; angles stay in radians.
    decode_arc_entities,
    Arc,
    Arc
);
raw_decoder!(
    /// Decode every CIRCLE.
    decode_circle_entities,
    Circle,
    Circle
);
raw_decoder!(
    /// Decode every POINT.
    decode_point_entities,
    Point,
    Point
);
raw_decoder!(
    /// Decode every ELLIPSE.
    decode_ellipse_entities,
    Ellipse,
    Ellipse
);
raw_decoder!(
    /// Decode every LWPOLYLINE.
    decode_lwpolyline_entities,
    LwPolyline,
    LwPolyline
);
raw_decoder!(
    /// Decode every TEXT; rotation and oblique stay in radians.
    decode_text_entities,
    Text,
    Text
);
raw_decoder!(
    /// Decode every MTEXT with its raw formatting codes.
    decode_mtext_entities,
    MText,
    MText
);
raw_decoder!(
    /// Decode every DIMENSION (linear, radius, diameter).
    decode_dimension_entities,
    Dimension,
    Dimension
);
raw_decoder!(
    /// Decode every INSERT.
    decode_insert_entities,
    Insert,
    Insert
);
