//! # Planner Executable Parameters
//!
//! This module provides parameters for the planner executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::NetParams;
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PlanExecParams {

    /// Path to the road map, relative to the software root unless absolute
    pub map_file: String,

    /// Name of the planner parameter file in the params directory
    pub planner_params_file: String,

    /// Time to wait for a message from the simulator before checking again.
    ///
    /// Units: milliseconds
    pub recv_timeout_ms: i32,

    /// Network endpoints
    pub net: NetParams,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_params() {
        let params: PlanExecParams = util::params::from_str(
            "map_file = \"data/highway_map.csv\"\n\
             planner_params_file = \"planner.toml\"\n\
             recv_timeout_ms = 200\n\
             \n\
             [net]\n\
             plan_endpoint = \"tcp://*:4567\"\n"
        ).unwrap();

        assert_eq!(params.map_file, "data/highway_map.csv");
        assert_eq!(params.recv_timeout_ms, 200);
        assert_eq!(params.net.plan_endpoint, "tcp://*:4567");
    }
}
