//! Parameters structure for the planner

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::road::{WorldPoint, DEFAULT_D_SIGN_REF};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the planner.
///
/// Any parameter missing from the parameter file takes its default value.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- SPEED ----

    /// Maximum reference speed.
    ///
    /// Units: miles per hour
    pub speed_limit_mph: f64,

    /// Change in speed allowed per step of the path.
    ///
    /// Units: miles per hour
    pub speed_increment_mph: f64,

    /// Conversion factor from meters per second to miles per hour.
    pub mph_per_mps: f64,

    // ---- PATH ----

    /// Number of points in every path sent to the simulator.
    pub planning_horizon: usize,

    /// Time between two consecutive points of the path.
    ///
    /// Units: seconds
    pub step_period_s: f64,

    /// Safety zone at zero speed. The safety zone grows by one meter for every two miles per
    /// hour of reference speed.
    ///
    /// Units: meters
    pub safety_zone_base_m: f64,

    /// Number of anchor points placed ahead of the end of the path tail, one safety zone apart.
    pub num_lookahead_anchors: usize,

    // ---- ROAD ----

    /// Point off the road used to choose the sign of `d`, must be inside the road loop.
    ///
    /// Units: meters,
    /// Frame: World
    pub d_sign_ref_point: [f64; 2],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            speed_limit_mph: 49.5,
            speed_increment_mph: 0.224,
            mph_per_mps: 2.24,
            planning_horizon: 30,
            step_period_s: 0.02,
            safety_zone_base_m: 5.0,
            num_lookahead_anchors: 3,
            d_sign_ref_point: [DEFAULT_D_SIGN_REF.0, DEFAULT_D_SIGN_REF.1],
        }
    }
}

impl Params {
    /// Distance to keep clear ahead of the vehicle at the given reference speed.
    pub fn safety_zone_m(&self, ref_speed_mph: f64) -> f64 {
        ref_speed_mph / 2.0 + self.safety_zone_base_m
    }

    /// Distance covered in one step at the given speed.
    pub fn step_distance_m(&self, speed_mph: f64) -> f64 {
        speed_mph / self.mph_per_mps * self.step_period_s
    }

    pub fn d_sign_ref(&self) -> WorldPoint {
        WorldPoint::new(self.d_sign_ref_point[0], self.d_sign_ref_point[1])
    }
}
