//! Oriented box zones.
//!
//! A [`BoxZone`] is a rectangle in the horizontal plane, rotated by a heading
//! around the vertical axis, and extruded between two heights. Trunk sessions
//! use one to decide when the actor (or the vehicle) has wandered off.

use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// Rotated rectangle with a vertical extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxZone {
    /// Center of the rectangle.
    pub center: Vec3,
    /// Extent along the local Y (forward) axis.
    pub length: f32,
    /// Extent along the local X (right) axis.
    pub width: f32,
    /// Rotation around Z, in degrees.
    pub heading: f32,
    /// Lowest contained height.
    pub min_z: f32,
    /// Highest contained height.
    pub max_z: f32,
}

impl BoxZone {
    /// Build a zone.
    #[must_use]
    pub fn new(center: Vec3, length: f32, width: f32, heading: f32, min_z: f32, max_z: f32) -> Self {
        Self {
            center,
            length,
            width,
            heading,
            min_z,
            max_z,
        }
    }

    /// Zone around a vehicle, grown by `margin` on every side.
    ///
    /// `model_min`/`model_max` are the model-space bounding box corners.
    /// The center offset is applied unrotated, the way the engine's dimension
    /// natives are usually consumed; for the symmetric boxes of most vehicles
    /// the difference is negligible.
    #[must_use]
    pub fn around_vehicle(position: Vec3, heading: f32, model_min: Vec3, model_max: Vec3, margin: f32) -> Self {
        let center = Vec3::new(
            position.x + (model_max.x + model_min.x) / 2.0,
            position.y + (model_max.y + model_min.y) / 2.0,
            position.z + (model_max.z + model_min.z) / 2.0,
        );

        Self::new(
            center,
            model_max.y - model_min.y + margin,
            model_max.x - model_min.x + margin,
            heading,
            center.z + model_min.z - margin,
            center.z + model_max.z + margin,
        )
    }

    /// Whether `point` lies inside the zone (boundary inclusive).
    #[must_use]
    pub fn contains(&self, point: &Vec3) -> bool {
        if point.z < self.min_z || point.z > self.max_z {
            return false;
        }

        let (sin, cos) = self.heading.to_radians().sin_cos();
        let dx = point.x - self.center.x;
        let dy = point.y - self.center.y;

        // Rotate the offset by -heading into the zone's local frame.
        let local_x = dx * cos + dy * sin;
        let local_y = -dx * sin + dy * cos;

        local_x.abs() <= self.width / 2.0 && local_y.abs() <= self.length / 2.0
    }
}
