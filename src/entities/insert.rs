//! Block insert entity.

use serde::{Deserialize, Serialize};

use super::EntityCommon;
use crate::types::{Handle, Vector3};

/// An INSERT: a placed reference to a block definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    /// Common entity data
    pub common: EntityCommon,
    /// Insertion point
    pub insertion: Vector3,
    /// X scale factor
    pub x_scale: f64,
    /// Y scale factor
    pub y_scale: f64,
    /// Z scale factor
    pub z_scale: f64,
    /// Rotation in radians
    pub rotation: f64,
    /// Extrusion normal
    pub normal: Vector3,
    /// Whether attribute entities follow the insert
    pub has_attributes: bool,
    /// Block header handle
    pub block_handle: Handle,
}
