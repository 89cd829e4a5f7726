//! Point entity.

use serde::{Deserialize, Serialize};

use super::EntityCommon;
use crate::types::Vector3;

/// A single point marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Common entity data
    pub common: EntityCommon,
    /// Location
    pub location: Vector3,
    /// Thickness
    pub thickness: f64,
    /// Extrusion normal
    pub normal: Vector3,
    /// X axis angle in radians (used when PDMODE draws oriented markers)
    pub x_axis_angle: f64,
}
