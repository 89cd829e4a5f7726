//! Arc entity.

use serde::{Deserialize, Serialize};

use super::EntityCommon;
use crate::types::Vector3;

/// A circular arc.
///
/// Angles are stored as read from the bitstream, in radians,
/// counter-clockwise from the X axis. The query surface converts to
/// degrees normalized to [0, 360).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    /// Common entity data
    pub common: EntityCommon,
    /// Center point
    pub center: Vector3,
    /// Radius; non-negative for valid files
    pub radius: f64,
    /// Start angle in radians
    pub start_angle: f64,
    /// End angle in radians
    pub end_angle: f64,
    /// Thickness
    pub thickness: f64,
    /// Extrusion normal
    pub normal: Vector3,
}
