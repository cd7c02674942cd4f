//! Coordinate frames
//!
//! Three coordinate spaces are used by the planner:
//! - World: the simulator's global Cartesian frame.
//! - Local: a vehicle-local Cartesian frame, with its origin at a reference point on the path
//!   and its x axis along the vehicle heading at that point.
//! - Frenet: road-relative `(s, d)`, see [`super::Road`].
//!
//! Points in each space have their own type, so moving between spaces always goes through a
//! named conversion.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Isometry2, Point2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint(pub Point2<f64>);

/// A point in a vehicle-local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalPoint(pub Point2<f64>);

/// A road-relative position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrenetPoint {
    /// Distance along the road centerline from the first waypoint.
    ///
    /// Units: meters
    pub s_m: f64,

    /// Signed perpendicular offset from the centerline, positive away from the centerline
    /// towards the outer lanes.
    ///
    /// Units: meters
    pub d_m: f64,
}

/// A vehicle-local frame, placed at `origin` in the world and rotated by `heading_rad`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    iso: Isometry2<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WorldPoint {
    pub fn new(x_m: f64, y_m: f64) -> Self {
        Self(Point2::new(x_m, y_m))
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    /// Euclidian distance to another point.
    pub fn distance(&self, other: &WorldPoint) -> f64 {
        nalgebra::distance(&self.0, &other.0)
    }

    /// Heading of the direction from this point to `other`, in radians.
    pub fn heading_to(&self, other: &WorldPoint) -> f64 {
        let diff = other.0 - self.0;
        diff.y.atan2(diff.x)
    }

    /// Get the point `dist_m` away from this one along the given heading.
    pub fn offset(&self, heading_rad: f64, dist_m: f64) -> WorldPoint {
        WorldPoint(self.0 + dist_m * Vector2::new(heading_rad.cos(), heading_rad.sin()))
    }
}

impl LocalPoint {
    pub fn new(x_m: f64, y_m: f64) -> Self {
        Self(Point2::new(x_m, y_m))
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }
}

impl FrenetPoint {
    pub fn new(s_m: f64, d_m: f64) -> Self {
        Self { s_m, d_m }
    }
}

impl LocalFrame {
    /// Create a frame with its origin at `origin` and its x axis along `heading_rad`.
    pub fn new(origin: WorldPoint, heading_rad: f64) -> Self {
        Self {
            iso: Isometry2::new(origin.0.coords, heading_rad)
        }
    }

    /// Position of the frame's origin in the world.
    pub fn origin(&self) -> WorldPoint {
        WorldPoint(Point2::from(self.iso.translation.vector))
    }

    /// Heading of the frame's x axis in the world.
    pub fn heading_rad(&self) -> f64 {
        self.iso.rotation.angle()
    }

    /// Express a world point in this frame.
    pub fn to_local(&self, point: &WorldPoint) -> LocalPoint {
        LocalPoint(self.iso.inverse_transform_point(&point.0))
    }

    /// Express a point in this frame in the world.
    pub fn to_world(&self, point: &LocalPoint) -> WorldPoint {
        WorldPoint(self.iso.transform_point(&point.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_local_frame() {
        let frame = LocalFrame::new(WorldPoint::new(10.0, 5.0), FRAC_PI_2);

        // A point ahead of the origin lies on the local x axis
        let local = frame.to_local(&WorldPoint::new(10.0, 8.0));
        assert!((local.x() - 3.0).abs() < 1e-12);
        assert!(local.y().abs() < 1e-12);

        // A point to the left of the heading has positive local y
        let local = frame.to_local(&WorldPoint::new(8.0, 5.0));
        assert!(local.x().abs() < 1e-12);
        assert!((local.y() - 2.0).abs() < 1e-12);

        let world = frame.to_world(&LocalPoint::new(1.5, -0.5));
        let back = frame.to_local(&world);
        assert!((back.x() - 1.5).abs() < 1e-12);
        assert!((back.y() + 0.5).abs() < 1e-12);

        assert!((frame.heading_rad() - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(frame.origin(), WorldPoint::new(10.0, 5.0));
    }

    #[test]
    fn test_world_point_helpers() {
        let a = WorldPoint::new(0.0, 0.0);
        let b = WorldPoint::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert!((a.heading_to(&WorldPoint::new(0.0, 2.0)) - FRAC_PI_2).abs() < 1e-12);

        let c = a.offset(FRAC_PI_2, 2.0);
        assert!(c.x().abs() < 1e-12);
        assert!((c.y() - 2.0).abs() < 1e-12);
    }
}
