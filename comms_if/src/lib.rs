//! # Communications interface crate.
//!
//! Provides the communications interfaces between the planner and the driving simulator.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message definitions for the simulator event protocol (telemetry in, paths out)
pub mod sim;

/// Network module
pub mod net;
