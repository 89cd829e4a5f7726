//! Circle entity.

use serde::{Deserialize, Serialize};

use super::EntityCommon;
use crate::types::Vector3;

/// A full circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Common entity data
    pub common: EntityCommon,
    /// Center point
    pub center: Vector3,
    /// Radius; non-negative for valid files
    pub radius: f64,
    /// Thickness
    pub thickness: f64,
    /// Extrusion normal
    pub normal: Vector3,
}
