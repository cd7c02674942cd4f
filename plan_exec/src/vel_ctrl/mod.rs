//! # Velocity control module
//!
//! Fills the path up to the planning horizon with points sampled along the trajectory. The
//! spacing of the points sets the speed of the vehicle, since the simulator moves the vehicle to
//! the next point of the path every step. The reference speed is ramped by a fixed increment per
//! step, which bounds the acceleration and jerk of the vehicle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::Serialize;
use util::maths::{clamp, step_towards};

use crate::{loc::PathTail, planner::Params, road::WorldPoint, traj::Trajectory};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Input data to velocity control.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Whether a vehicle ahead requires slowing down
    pub forward_hazard: bool,

    /// Reference speed at the start of the cycle.
    ///
    /// Units: miles per hour
    pub ref_speed_mph: f64,

    /// Lookahead distance used to estimate the length of the trajectory.
    ///
    /// Units: meters
    pub lookahead_m: f64,
}

/// The filled path and the speeds reached at its end.
#[derive(Debug, Clone)]
pub struct OutputData {
    /// World points of the full path, starting with the kept tail
    pub path: Vec<WorldPoint>,

    /// Reference speed after the last new point.
    ///
    /// Units: miles per hour
    pub ref_speed_mph: f64,

    /// Target speed after the last new point.
    ///
    /// Units: miles per hour
    pub target_speed_mph: f64,

    /// Number of points added after the tail
    pub num_new_points: usize,
}

/// Speeds reached after a single step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedStep {
    pub target_speed_mph: f64,
    pub ref_speed_mph: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Advance the target and reference speeds by one step.
///
/// The target moves one increment down if there is a hazard ahead, otherwise one increment up.
/// The reference then moves towards the target by at most one increment. Both are kept between
/// zero and the speed limit.
pub fn speed_step(
    forward_hazard: bool,
    target_speed_mph: f64,
    ref_speed_mph: f64,
    params: &Params,
) -> SpeedStep {
    let inc = params.speed_increment_mph;
    let limit = params.speed_limit_mph;

    let target = if forward_hazard {
        target_speed_mph - inc
    }
    else {
        target_speed_mph + inc
    };
    let target = clamp(target, 0.0, limit);

    let reference = clamp(step_towards(ref_speed_mph, target, inc), 0.0, limit);

    SpeedStep {
        target_speed_mph: target,
        ref_speed_mph: reference,
    }
}

/// Build the full path for this cycle.
///
/// The tail is kept unchanged (up to the planning horizon) and new points are appended until the
/// horizon is reached.
pub fn fill_path(
    tail: &PathTail,
    traj: &Trajectory,
    input: &InputData,
    params: &Params,
) -> OutputData {
    let horizon = params.planning_horizon;

    let mut path: Vec<WorldPoint> = tail.points.iter().take(horizon).copied().collect();
    let num_new_points = horizon - path.len();

    // Estimate of how far along x one meter along the trajectory gets us
    let target_x_m = input.lookahead_m;
    let target_y_m = traj.local_point_at(target_x_m).y();
    let chord_m = target_x_m.hypot(target_y_m);
    let x_per_m = if chord_m > 0.0 { target_x_m / chord_m } else { 1.0 };

    let mut speeds = SpeedStep {
        target_speed_mph: input.ref_speed_mph,
        ref_speed_mph: input.ref_speed_mph,
    };
    let mut x_m = 0.0;

    for _ in 0..num_new_points {
        speeds = speed_step(
            input.forward_hazard,
            speeds.target_speed_mph,
            speeds.ref_speed_mph,
            params,
        );

        x_m += x_per_m * params.step_distance_m(speeds.ref_speed_mph);
        path.push(traj.world_point_at(x_m));
    }

    trace!(
        "Filled path with {} new points, ref speed {:.3} -> {:.3} mph",
        num_new_points, input.ref_speed_mph, speeds.ref_speed_mph
    );

    OutputData {
        path,
        ref_speed_mph: speeds.ref_speed_mph,
        target_speed_mph: speeds.target_speed_mph,
        num_new_points,
    }
}
