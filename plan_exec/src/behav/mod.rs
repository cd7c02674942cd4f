//! # Behaviour module
//!
//! Decides which lane to drive in. The decision is taken afresh every cycle from the traffic
//! report, there is no notion of a lane change in progress.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::{road::Lane, traffic::TrafficReport};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Lane decision for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LaneDecision {
    Hold,
    MoveLeft,
    MoveRight,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LaneDecision {
    /// The lane to drive in after applying this decision to `lane`.
    ///
    /// A move towards a lane which doesn't exist holds the current lane.
    pub fn apply(&self, lane: Lane) -> Lane {
        let target = match self {
            LaneDecision::Hold => None,
            LaneDecision::MoveLeft => lane.left(),
            LaneDecision::MoveRight => lane.right(),
        };

        target.unwrap_or(lane)
    }
}

impl Default for LaneDecision {
    fn default() -> Self {
        LaneDecision::Hold
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Decide whether to change lanes.
///
/// Lanes are only changed to get around a vehicle ahead. If both neighbouring lanes are free the
/// one with the most room is taken, with ties going left.
pub fn decide(traffic: &TrafficReport) -> LaneDecision {
    if !traffic.forward_hazard {
        return LaneDecision::Hold;
    }

    match (traffic.left_feasible, traffic.right_feasible) {
        (true, true) if traffic.right_gap_m > traffic.left_gap_m => LaneDecision::MoveRight,
        (true, _) => LaneDecision::MoveLeft,
        (false, true) => LaneDecision::MoveRight,
        (false, false) => LaneDecision::Hold,
    }
}
