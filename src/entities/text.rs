//! Single-line text entity.

use serde::{Deserialize, Serialize};

use super::EntityCommon;
use crate::types::{Handle, Vector3};

/// A single-line TEXT entity.
///
/// Angles (rotation, oblique) are radians as read; the query surface
/// exposes degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// Common entity data
    pub common: EntityCommon,
    /// Text value
    pub value: String,
    /// Insertion point
    pub insertion: Vector3,
    /// Alignment point, when distinct from the insertion point
    pub alignment: Option<Vector3>,
    /// Extrusion normal
    pub normal: Vector3,
    /// Thickness
    pub thickness: f64,
    /// Oblique (slant) angle in radians
    pub oblique_angle: f64,
    /// Rotation angle in radians
    pub rotation: f64,
    /// Text height
    pub height: f64,
    /// Width scale factor
    pub width_factor: f64,
    /// Generation flags (2 = backward, 4 = upside down)
    pub generation: u16,
    /// Horizontal alignment code
    pub horizontal_alignment: u16,
    /// Vertical alignment code
    pub vertical_alignment: u16,
    /// Text style handle
    pub style_handle: Handle,
}
