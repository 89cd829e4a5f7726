//! Dimension entities.
//!
//! All dimension subtypes share a common prologue on the wire; the
//! subtype-specific points live in [`DimensionKind`].

use serde::{Deserialize, Serialize};

use super::EntityCommon;
use crate::types::{Handle, Vector2, Vector3};

/// Fields shared by every dimension subtype.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionCommon {
    /// Extrusion normal
    pub normal: Vector3,
    /// Text middle point (2D, paired with `elevation`)
    pub text_midpoint: Vector2,
    /// Elevation applied to the 2D wire points
    pub elevation: f64,
    /// Dimension flags byte
    pub flags: u8,
    /// User-supplied dimension text; empty when the measurement is used
    pub text: String,
    /// Text rotation in radians
    pub text_rotation: f64,
    /// Horizontal direction in radians
    pub horizontal_direction: f64,
    /// Insert scale for the anonymous block
    pub insert_scale: Vector3,
    /// Insert rotation in radians
    pub insert_rotation: f64,
    /// Attachment point code
    pub attachment_point: u16,
    /// Line spacing style code
    pub line_spacing_style: u16,
    /// Line spacing factor
    pub line_spacing_factor: f64,
    /// Measured value as stored
    pub actual_measurement: f64,
    /// Insertion point (2D, paired with `elevation`)
    pub insertion: Vector2,
    /// Dimension style handle
    pub dimstyle_handle: Handle,
    /// Anonymous dimension block handle
    pub block_handle: Handle,
}

/// Subtype-specific dimension data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DimensionKind {
    /// Rotated linear dimension
    Linear {
        /// First extension line origin (point 13)
        first_point: Vector3,
        /// Second extension line origin (point 14)
        second_point: Vector3,
        /// Dimension line definition point (point 10)
        definition_point: Vector3,
        /// Dimension line rotation in radians
        rotation: f64,
        /// Extension line rotation in radians
        ext_line_rotation: f64,
    },
    /// Radius dimension
    Radius {
        /// Definition point on the curve (point 10)
        definition_point: Vector3,
        /// Point picked on the arc/circle (point 15)
        chord_point: Vector3,
        /// Leader length
        leader_length: f64,
    },
    /// Diameter dimension
    Diameter {
        /// Definition point on the curve (point 10)
        definition_point: Vector3,
        /// Opposite point on the arc/circle (point 15)
        chord_point: Vector3,
        /// Leader length
        leader_length: f64,
    },
}

impl DimensionKind {
    /// Subtype name used in the query surface.
    pub fn name(&self) -> &'static str {
        match self {
            DimensionKind::Linear { .. } => "LINEAR",
            DimensionKind::Radius { .. } => "RADIUS",
            DimensionKind::Diameter { .. } => "DIAMETER",
        }
    }
}

/// A dimension entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// Common entity data
    pub common: EntityCommon,
    /// Shared dimension prologue fields
    pub dim: DimensionCommon,
    /// Subtype payload
    pub kind: DimensionKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let kind = DimensionKind::Radius {
            definition_point: Vector3::ZERO,
            chord_point: Vector3::new(1.0, 0.0, 0.0),
            leader_length: 0.0,
        };
        assert_eq!(kind.name(), "RADIUS");
    }
}
