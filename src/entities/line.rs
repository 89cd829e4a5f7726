//! Line entity.

use serde::{Deserialize, Serialize};

use super::EntityCommon;
use crate::types::Vector3;

/// A line defined by two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Common entity data
    pub common: EntityCommon,
    /// Start point
    pub start: Vector3,
    /// End point
    pub end: Vector3,
    /// Thickness (extrusion in the normal direction)
    pub thickness: f64,
    /// Extrusion normal
    pub normal: Vector3,
}

impl Line {
    /// Length of the line.
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}
