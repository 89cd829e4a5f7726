//! Normalized entity records.
//!
//! One module per supported entity type. Records hold values as decoded
//! from the bitstream: angles are radians, coordinates are 3D doubles.
//! Degree normalization happens at the document query surface.
//!
//! The supported set is closed; everything else decodes to an
//! [`Unsupported`] placeholder carrying its raw type code.

pub mod arc;
pub mod circle;
pub mod dimension;
pub mod ellipse;
pub mod insert;
pub mod line;
pub mod lwpolyline;
pub mod mtext;
pub mod point;
pub mod text;

pub use arc::Arc;
pub use circle::Circle;
pub use dimension::{Dimension, DimensionCommon, DimensionKind};
pub use ellipse::Ellipse;
pub use insert::Insert;
pub use line::Line;
pub use lwpolyline::{LwPolyline, LwPolylineFlags};
pub use mtext::MText;
pub use point::Point;
pub use text::Text;

use serde::{Deserialize, Serialize};

use crate::types::{Color, Handle};

/// Common fields shared by every decoded entity.
///
/// Populated from the version-gated common entity header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityCommon {
    /// The entity's own handle
    pub handle: Handle,
    /// Layer handle; zero when unresolved
    pub layer_handle: Handle,
    /// Entity color as decoded (CMC/ENC)
    pub color: Color,
    /// Entity mode bits: 2 = model space, 1 = paper space, 0 = block content
    pub entity_mode: u8,
    /// Linetype scale
    pub linetype_scale: f64,
    /// Invisibility flag (bit 0 of the invisibility word)
    pub invisible: bool,
    /// Lineweight byte (AC1018+; 0 otherwise)
    pub lineweight: i16,
}

/// A placeholder for an entity type outside the supported set.
///
/// Recorded so iteration order and handle coverage stay complete; decoding
/// continues past these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unsupported {
    /// Handle from the object map
    pub handle: Handle,
    /// Raw object type code from the wire
    pub raw_type: i16,
    /// DXF class name for class-based codes (≥ 500), when known
    pub dxf_name: Option<String>,
    /// Entity mode bits when the common header could be read
    pub entity_mode: Option<u8>,
}

/// Tagged union over the supported entity set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityRecord {
    Line(Line),
    Arc(Arc),
    Circle(Circle),
    Point(Point),
    Ellipse(Ellipse),
    LwPolyline(LwPolyline),
    Text(Text),
    MText(MText),
    Dimension(Dimension),
    Insert(Insert),
    Unsupported(Unsupported),
}

impl EntityRecord {
    /// The DXF type name used by the query filter.
    pub fn dxftype(&self) -> &'static str {
        match self {
            EntityRecord::Line(_) => "LINE",
            EntityRecord::Arc(_) => "ARC",
            EntityRecord::Circle(_) => "CIRCLE",
            EntityRecord::Point(_) => "POINT",
            EntityRecord::Ellipse(_) => "ELLIPSE",
            EntityRecord::LwPolyline(_) => "LWPOLYLINE",
            EntityRecord::Text(_) => "TEXT",
            EntityRecord::MText(_) => "MTEXT",
            EntityRecord::Dimension(_) => "DIMENSION",
            EntityRecord::Insert(_) => "INSERT",
            EntityRecord::Unsupported(_) => "UNSUPPORTED",
        }
    }

    /// The entity's handle.
    pub fn handle(&self) -> Handle {
        match self {
            EntityRecord::Line(e) => e.common.handle,
            EntityRecord::Arc(e) => e.common.handle,
            EntityRecord::Circle(e) => e.common.handle,
            EntityRecord::Point(e) => e.common.handle,
            EntityRecord::Ellipse(e) => e.common.handle,
            EntityRecord::LwPolyline(e) => e.common.handle,
            EntityRecord::Text(e) => e.common.handle,
            EntityRecord::MText(e) => e.common.handle,
            EntityRecord::Dimension(e) => e.common.handle,
            EntityRecord::Insert(e) => e.common.handle,
            EntityRecord::Unsupported(e) => e.handle,
        }
    }

    /// The shared common-header fields, absent for placeholders.
    pub fn common(&self) -> Option<&EntityCommon> {
        match self {
            EntityRecord::Line(e) => Some(&e.common),
            EntityRecord::Arc(e) => Some(&e.common),
            EntityRecord::Circle(e) => Some(&e.common),
            EntityRecord::Point(e) => Some(&e.common),
            EntityRecord::Ellipse(e) => Some(&e.common),
            EntityRecord::LwPolyline(e) => Some(&e.common),
            EntityRecord::Text(e) => Some(&e.common),
            EntityRecord::MText(e) => Some(&e.common),
            EntityRecord::Dimension(e) => Some(&e.common),
            EntityRecord::Insert(e) => Some(&e.common),
            EntityRecord::Unsupported(_) => None,
        }
    }

    /// Entity mode bits, when known.
    pub fn entity_mode(&self) -> Option<u8> {
        match self {
            EntityRecord::Unsupported(e) => e.entity_mode,
            other => other.common().map(|c| c.entity_mode),
        }
    }
}
