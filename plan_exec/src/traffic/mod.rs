//! # Traffic module
//!
//! Analyses the other vehicles reported by the simulator's sensor fusion to find out whether the
//! current lane is blocked ahead and whether the neighbouring lanes are free to move into.
//!
//! Each detection is projected forward to the time at which the ego vehicle will have driven the
//! rest of its current path, since that is when the newly planned part of the path starts.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::sim::SensorFusionEntry;
use log::trace;
use serde::Serialize;
use util::maths::rem_euclid;

use crate::{
    loc::{PathTail, Pose},
    planner::Params,
    road::Lane,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Gap reported for a lane with no vehicle ahead.
pub const OPEN_LANE_GAP_M: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Another vehicle detected on the same side of the road.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub id: u32,

    /// Units: meters,
    /// Frame: World
    pub x_m: f64,
    pub y_m: f64,

    /// Units: meters/second,
    /// Frame: World
    pub vx_ms: f64,
    pub vy_ms: f64,

    /// Units: meters
    pub s_m: f64,
    pub d_m: f64,
}

/// Result of the traffic analysis for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrafficReport {
    /// True if a vehicle ahead in the current lane is within the safety zone.
    pub forward_hazard: bool,

    pub left_feasible: bool,
    pub right_feasible: bool,

    /// Smallest gap to a vehicle ahead in the lane to the left, or [`OPEN_LANE_GAP_M`].
    ///
    /// Units: meters
    pub left_gap_m: f64,

    /// Smallest gap to a vehicle ahead in the lane to the right, or [`OPEN_LANE_GAP_M`].
    ///
    /// Units: meters
    pub right_gap_m: f64,
}

/// Where a detection sits relative to the current lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Same,
    Left,
    Right,
    Other,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl From<&SensorFusionEntry> for Detection {
    fn from(entry: &SensorFusionEntry) -> Self {
        Self {
            id: entry.id(),
            x_m: entry.x(),
            y_m: entry.y(),
            vx_ms: entry.vx(),
            vy_ms: entry.vy(),
            s_m: entry.s(),
            d_m: entry.d(),
        }
    }
}

impl Detection {
    pub fn lane(&self) -> Lane {
        Lane::from_d(self.d_m)
    }

    /// Magnitude of the detection's velocity.
    pub fn speed_ms(&self) -> f64 {
        self.vx_ms.hypot(self.vy_ms)
    }

    /// Estimated `s` of the detection after `num_steps` more steps.
    pub fn projected_s_m(&self, num_steps: usize, step_period_s: f64) -> f64 {
        self.s_m + num_steps as f64 * self.speed_ms() * step_period_s
    }
}

impl TrafficReport {
    /// Report for an empty road with the vehicle in `lane`.
    pub fn clear(lane: Lane) -> Self {
        Self {
            forward_hazard: false,
            left_feasible: lane.left().is_some(),
            right_feasible: lane.right().is_some(),
            left_gap_m: OPEN_LANE_GAP_M,
            right_gap_m: OPEN_LANE_GAP_M,
        }
    }
}

impl Side {
    fn of(lane: Lane, current: Lane) -> Self {
        if lane == current {
            Side::Same
        }
        else if Some(lane) == current.left() {
            Side::Left
        }
        else if Some(lane) == current.right() {
            Side::Right
        }
        else {
            Side::Other
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Analyse the traffic around the ego vehicle.
///
/// The safety zone is taken at `ref_speed_mph`, gaps are measured from the end of the path tail
/// to the projected position of each detection.
///
/// All `s` values are unwrapped onto the lap of the loop nearest the ego vehicle, so vehicles
/// just past the end of the loop count as ahead of an ego just before it.
pub fn analyse(
    detections: &[Detection],
    pose: &Pose,
    tail: &PathTail,
    lane: Lane,
    ref_speed_mph: f64,
    track_length_m: f64,
    params: &Params,
) -> TrafficReport {
    let safety_zone_m = params.safety_zone_m(ref_speed_mph);
    let car_s_m = pose.frenet.s_m;
    let end_s_m = unwrap_s(tail.end.s_m, car_s_m, track_length_m);

    let mut report = TrafficReport::clear(lane);

    // A vehicle between the ego and the end of its path would be alongside during a manoeuvre
    let alongside = |s: f64| s > car_s_m && s < end_s_m;

    for det in detections {
        let side = Side::of(det.lane(), lane);
        if side == Side::Other {
            continue;
        }

        let det_s_m = unwrap_s(det.s_m, car_s_m, track_length_m);
        let projected_s_m =
            det.projected_s_m(tail.len(), params.step_period_s) + (det_s_m - det.s_m);
        let gap_m = projected_s_m - end_s_m;
        let ahead = det_s_m > car_s_m;
        let too_close = ahead && gap_m < safety_zone_m;
        let blocking = too_close || alongside(det_s_m) || alongside(projected_s_m);

        trace!(
            "Detection {}: {:?} lane, s = {:.2} m, gap = {:.2} m, blocking = {}",
            det.id, side, det.s_m, gap_m, blocking
        );

        match side {
            Side::Same => {
                if too_close {
                    report.forward_hazard = true;
                }
            },
            Side::Left => {
                if blocking {
                    report.left_feasible = false;
                }
                if ahead {
                    report.left_gap_m = report.left_gap_m.min(gap_m);
                }
            },
            Side::Right => {
                if blocking {
                    report.right_feasible = false;
                }
                if ahead {
                    report.right_gap_m = report.right_gap_m.min(gap_m);
                }
            },
            Side::Other => ()
        }
    }

    report
}

/// Move `s_m` by whole laps of the loop so that it is within half a lap of `ref_s_m`.
fn unwrap_s(s_m: f64, ref_s_m: f64, track_length_m: f64) -> f64 {
    let half_lap_m = 0.5 * track_length_m;
    ref_s_m + rem_euclid(s_m - ref_s_m + half_lap_m, track_length_m) - half_lap_m
}
