//! # Simulator Message Module
//!
//! Messages exchanged with the driving simulator. The simulator wraps every message in an event
//! frame of the form `42["<event>", <data>]`, where `4` marks a message and `2` an event. Each
//! cycle the simulator sends a `telemetry` event and expects either a `control` event carrying
//! the next path, or a neutral `manual` event when there is nothing to plan.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Prefix which marks a message as an event frame.
pub const EVENT_FRAME_PREFIX: &str = "42";

/// Name of the inbound telemetry event.
pub const TELEMETRY_EVENT: &str = "telemetry";

/// Name of the outbound path event.
pub const CONTROL_EVENT: &str = "control";

/// Name of the neutral acknowledgement event.
pub const MANUAL_EVENT: &str = "manual";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry for the ego vehicle, sent by the simulator once per cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    /// World position of the vehicle, in meters
    pub x: f64,
    pub y: f64,

    /// Road-relative position of the vehicle, in meters
    pub s: f64,
    pub d: f64,

    /// Heading of the vehicle in degrees, counter-clockwise from the world x axis
    pub yaw: f64,

    /// Speed of the vehicle in miles per hour
    pub speed: f64,

    /// Points of the last path which the vehicle has not yet consumed
    pub previous_path_x: Vec<f64>,
    pub previous_path_y: Vec<f64>,

    /// Road-relative position of the last point of the previous path
    pub end_path_s: f64,
    pub end_path_d: f64,

    /// All other vehicles on the same side of the road
    pub sensor_fusion: Vec<SensorFusionEntry>,
}

/// A single detected vehicle, serialised as `[id, x, y, vx, vy, s, d]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SensorFusionEntry(
    pub u32,
    pub f64,
    pub f64,
    pub f64,
    pub f64,
    pub f64,
    pub f64,
);

/// The path demands sent back to the simulator, in world coordinates.
///
/// Both sequences always have the same length.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PathDems {
    pub next_x: Vec<f64>,
    pub next_y: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct Empty {}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An event received from the simulator.
#[derive(Debug, Clone)]
pub enum SimEvent {
    /// Telemetry which should be planned against.
    Telemetry(Box<Telemetry>),

    /// Anything which isn't telemetry (handshakes, manual driving, empty data). Answered with
    /// [`SimResponse::Manual`].
    Manual,
}

/// A response sent to the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum SimResponse {
    /// A new path for the vehicle to follow.
    Control(PathDems),

    /// Neutral acknowledgement carrying no path.
    Manual,
}

/// Errors which can occur while parsing an inbound message.
#[derive(Debug, thiserror::Error)]
pub enum SimParseError {
    #[error("The message is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("The telemetry event could not be deserialised: {0}")]
    InvalidTelemetry(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SensorFusionEntry {
    pub fn id(&self) -> u32 { self.0 }
    pub fn x(&self) -> f64 { self.1 }
    pub fn y(&self) -> f64 { self.2 }
    pub fn vx(&self) -> f64 { self.3 }
    pub fn vy(&self) -> f64 { self.4 }
    pub fn s(&self) -> f64 { self.5 }
    pub fn d(&self) -> f64 { self.6 }
}

impl PathDems {
    /// Number of points in the path
    pub fn len(&self) -> usize {
        self.next_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_x.is_empty()
    }
}

impl SimEvent {
    /// Parse a raw message from the simulator.
    ///
    /// Both framed (`42["telemetry", {...}]`) and bare telemetry objects are accepted. Messages
    /// with no data (containing `null`), or carrying any event other than telemetry, parse as
    /// [`SimEvent::Manual`]. An error is only returned when the message isn't JSON at all, or
    /// claims to be telemetry but is missing fields.
    pub fn parse(raw: &str) -> Result<Self, SimParseError> {
        let body = raw.trim();
        let body = body.strip_prefix(EVENT_FRAME_PREFIX).unwrap_or(body);

        // The simulator sends `null` data when it's in manual mode
        if body.is_empty() || body.contains("null") {
            return Ok(SimEvent::Manual);
        }

        let value: Value = serde_json::from_str(body)
            .map_err(SimParseError::InvalidJson)?;

        let data = match value {
            Value::Array(mut items) => {
                let is_telemetry = matches!(
                    items.first(), 
                    Some(Value::String(event)) if event == TELEMETRY_EVENT
                );

                if !is_telemetry || items.len() < 2 {
                    return Ok(SimEvent::Manual);
                }

                items.swap_remove(1)
            },
            obj @ Value::Object(_) => obj,
            _ => return Ok(SimEvent::Manual)
        };

        let telemetry: Telemetry = serde_json::from_value(data)
            .map_err(SimParseError::InvalidTelemetry)?;

        Ok(SimEvent::Telemetry(Box::new(telemetry)))
    }
}

impl SimResponse {
    /// Encode the response as an event frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        let event = match self {
            SimResponse::Control(dems) => {
                serde_json::to_string(&(CONTROL_EVENT, dems))?
            },
            SimResponse::Manual => {
                serde_json::to_string(&(MANUAL_EVENT, Empty {}))?
            }
        };

        Ok(format!("{}{}", EVENT_FRAME_PREFIX, event))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const TELEMETRY_FRAME: &str = r#"42["telemetry",{"x":909.48,"y":1128.67,"yaw":0,"speed":0,"s":124.8336,"d":6.164833,"previous_path_x":[909.5,909.7],"previous_path_y":[1128.7,1128.7],"end_path_s":125.2,"end_path_d":6.0,"sensor_fusion":[[0,1065.6,1147.3,19.4,0.1,277.1,2.3],[1,775.8,1425.2,0,0,6719.2,-280.9]]}]"#;

    #[test]
    fn test_parse_telemetry_frame() {
        let t = match SimEvent::parse(TELEMETRY_FRAME).unwrap() {
            SimEvent::Telemetry(t) => t,
            e => panic!("Expected telemetry, got {:?}", e)
        };

        assert_eq!(t.x, 909.48);
        assert_eq!(t.previous_path_x, vec![909.5, 909.7]);
        assert_eq!(t.sensor_fusion.len(), 2);
        assert_eq!(t.sensor_fusion[0].id(), 0);
        assert_eq!(t.sensor_fusion[0].vx(), 19.4);
        assert_eq!(t.sensor_fusion[1].d(), -280.9);
    }

    #[test]
    fn test_parse_bare_telemetry() {
        let bare = TELEMETRY_FRAME
            .trim_start_matches("42[\"telemetry\",")
            .trim_end_matches(']');

        assert!(matches!(SimEvent::parse(bare), Ok(SimEvent::Telemetry(_))));
    }

    #[test]
    fn test_degenerate_messages_are_manual() {
        assert!(matches!(SimEvent::parse("42[\"telemetry\",null]"), Ok(SimEvent::Manual)));
        assert!(matches!(SimEvent::parse("42[\"connect\",{}]"), Ok(SimEvent::Manual)));
        assert!(matches!(SimEvent::parse("42"), Ok(SimEvent::Manual)));
        assert!(matches!(SimEvent::parse("\"hello\""), Ok(SimEvent::Manual)));
    }

    #[test]
    fn test_invalid_messages_are_errors() {
        assert!(matches!(SimEvent::parse("42[oops"), Err(SimParseError::InvalidJson(_))));
        assert!(matches!(
            SimEvent::parse("42[\"telemetry\",{\"x\":1.0}]"),
            Err(SimParseError::InvalidTelemetry(_))
        ));
    }

    #[test]
    fn test_response_frames() {
        assert_eq!(SimResponse::Manual.to_frame().unwrap(), "42[\"manual\",{}]");

        let control = SimResponse::Control(PathDems {
            next_x: vec![1.0, 2.0],
            next_y: vec![3.0, 4.5],
        });
        assert_eq!(
            control.to_frame().unwrap(),
            "42[\"control\",{\"next_x\":[1.0,2.0],\"next_y\":[3.0,4.5]}]"
        );
    }
}
