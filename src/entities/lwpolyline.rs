//! Lightweight polyline entity.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::EntityCommon;
use crate::types::{Vector2, Vector3};

bitflags! {
    /// Wire flag word of an LWPOLYLINE.
    ///
    /// The low bits gate which optional fields are present in the object
    /// data; CLOSED is a property of the polyline itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LwPolylineFlags: u16 {
        const HAS_EXTRUSION   = 0x0001;
        const HAS_THICKNESS   = 0x0002;
        const HAS_CONST_WIDTH = 0x0004;
        const HAS_ELEVATION   = 0x0008;
        const HAS_BULGES      = 0x0010;
        const HAS_WIDTHS      = 0x0020;
        const PLINEGEN        = 0x0080;
        const CLOSED          = 0x0200;
        const HAS_VERTEX_IDS  = 0x0400;
    }
}

/// A lightweight polyline: a flat 2D vertex list with optional bulges and
/// per-vertex widths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LwPolyline {
    /// Common entity data
    pub common: EntityCommon,
    /// Raw wire flag word
    pub flags: u16,
    /// Constant width, when `HAS_CONST_WIDTH`
    pub const_width: Option<f64>,
    /// Elevation, when `HAS_ELEVATION`
    pub elevation: Option<f64>,
    /// Thickness, when `HAS_THICKNESS`
    pub thickness: Option<f64>,
    /// Extrusion normal, when `HAS_EXTRUSION`
    pub normal: Option<Vector3>,
    /// Vertex locations; length equals the wire count field
    pub vertices: Vec<Vector2>,
    /// Bulge per vertex; either empty or the same length as `vertices`
    pub bulges: Vec<f64>,
    /// (start, end) width per vertex; either empty or the same length as
    /// `vertices`
    pub widths: Vec<(f64, f64)>,
}

impl LwPolyline {
    /// Typed view of the flag word.
    pub fn flag_bits(&self) -> LwPolylineFlags {
        LwPolylineFlags::from_bits_truncate(self.flags)
    }

    /// Whether the polyline is closed.
    pub fn is_closed(&self) -> bool {
        self.flag_bits().contains(LwPolylineFlags::CLOSED)
    }
}
