//! # Planner library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the planner crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Behaviour module - decides which lane to drive in
pub mod behav;

/// Localisation module - typed pose and path tail from the simulator telemetry
pub mod loc;

/// Planner module - runs the full planning cycle and owns the state carried between cycles
pub mod planner;

/// Planner server - receives telemetry from and sends paths to the simulator
pub mod plan_server;

/// Parameters for the planner executable
pub mod params;

/// Road module - the road map and conversions between world and road coordinates
pub mod road;

/// Traffic module - analyses the other vehicles on the road
pub mod traffic;

/// Trajectory module - fits the curve the path is sampled from
pub mod traj;

/// Velocity control module - samples the path at the reference speed
pub mod vel_ctrl;
