//! # Localisation module
//!
//! Localisation of the ego vehicle is provided by the simulator each cycle. This module turns the
//! raw telemetry into the typed pose and path tail used by the rest of the planner.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::sim::Telemetry;
use util::maths::deg_to_rad;

use crate::road::{FrenetPoint, WorldPoint};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose of the ego vehicle for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position in the world frame
    pub position: WorldPoint,

    /// Heading in the world frame, counter-clockwise from the x axis.
    ///
    /// Units: radians
    pub yaw_rad: f64,

    /// Units: miles per hour
    pub speed_mph: f64,

    /// Road-relative position as reported by the simulator
    pub frenet: FrenetPoint,
}

/// The part of the previous path which the vehicle has not yet driven.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathTail {
    /// Remaining world points, in driving order
    pub points: Vec<WorldPoint>,

    /// Road-relative position of the final point, or of the vehicle if there are no points.
    pub end: FrenetPoint,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn from_telemetry(tm: &Telemetry) -> Self {
        Self {
            position: WorldPoint::new(tm.x, tm.y),
            yaw_rad: deg_to_rad(tm.yaw),
            speed_mph: tm.speed,
            frenet: FrenetPoint::new(tm.s, tm.d),
        }
    }
}

impl PathTail {
    /// Extract the path tail from the telemetry.
    ///
    /// The simulator reports `end_path_s` as zero when the previous path has been fully consumed,
    /// so in that case the vehicle's own position is used as the end of the tail. Unpaired
    /// coordinates (`x` and `y` lists of different lengths) are dropped.
    pub fn from_telemetry(tm: &Telemetry) -> Self {
        let points: Vec<WorldPoint> = tm
            .previous_path_x
            .iter()
            .zip(tm.previous_path_y.iter())
            .map(|(&x, &y)| WorldPoint::new(x, y))
            .collect();

        let end = if points.is_empty() {
            FrenetPoint::new(tm.s, tm.d)
        }
        else {
            FrenetPoint::new(tm.end_path_s, tm.end_path_d)
        };

        Self { points, end }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_telemetry {
    use super::*;
    use comms_if::sim::SensorFusionEntry;

    /// Telemetry for a vehicle at rest with no previous path and no traffic.
    pub fn at_rest(x: f64, y: f64, s: f64, d: f64, yaw_deg: f64) -> Telemetry {
        Telemetry {
            x,
            y,
            s,
            d,
            yaw: yaw_deg,
            speed: 0.0,
            previous_path_x: vec![],
            previous_path_y: vec![],
            end_path_s: 0.0,
            end_path_d: 0.0,
            sensor_fusion: Vec::<SensorFusionEntry>::new(),
        }
    }
}
