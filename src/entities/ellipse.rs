//! Ellipse entity.

use serde::{Deserialize, Serialize};

use super::EntityCommon;
use crate::types::Vector3;

/// An ellipse or elliptical arc.
///
/// The major axis is an endpoint vector relative to the center; the minor
/// axis length is `major_axis.length() * minor_axis_ratio`. Parameters are
/// radians on the parametric curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    /// Common entity data
    pub common: EntityCommon,
    /// Center point
    pub center: Vector3,
    /// Major axis endpoint vector, relative to the center
    pub major_axis: Vector3,
    /// Minor/major axis ratio; in (0, 1] for valid files
    pub minor_axis_ratio: f64,
    /// Start parameter in radians (0 for a full ellipse)
    pub start_parameter: f64,
    /// End parameter in radians (2π for a full ellipse)
    pub end_parameter: f64,
    /// Extrusion normal
    pub normal: Vector3,
}

impl Ellipse {
    /// Whether this is a closed (full) ellipse rather than an arc segment.
    pub fn is_full(&self) -> bool {
        (self.end_parameter - self.start_parameter).abs() >= std::f64::consts::TAU - 1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_ellipse() {
        let e = Ellipse {
            common: EntityCommon::default(),
            center: Vector3::ZERO,
            major_axis: Vector3::new(10.0, 0.0, 0.0),
            minor_axis_ratio: 0.5,
            start_parameter: 0.0,
            end_parameter: std::f64::consts::TAU,
            normal: Vector3::UNIT_Z,
        };
        assert!(e.is_full());
    }
}
