//! # Planner module
//!
//! Runs one full planning cycle: traffic analysis, lane decision, trajectory synthesis and
//! velocity control. The only state carried between cycles is the [`PlannerState`], which is
//! passed into [`plan_cycle`] and returned updated, and committed by the [`Planner`] once the
//! cycle has completed.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during a planning cycle.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("Could not synthesise the trajectory: {0}")]
    TrajError(#[from] crate::traj::TrajError),
}
