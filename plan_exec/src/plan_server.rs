//! # Planner Server Module
//!
//! This module abstracts over the networking side of the planner executable. The server accepts a
//! connection from the simulator bridge, receiving one event per cycle and answering each one with
//! either a path or a neutral acknowledgement.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
    sim::{SimEvent, SimResponse},
};
use log::{trace, warn};

use crate::params::PlanExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the planner executable.
pub struct PlanServer {

    /// REP socket which receives events from the simulator and replies with paths
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`PlanServer`]
#[derive(thiserror::Error, Debug)]
pub enum PlanServerError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),

    #[error("Could not encode the response: {0}")]
    EncodeError(serde_json::Error),

    #[error("Could not send data to the simulator: {0}")]
    SendError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PlanServer {

    /// Create a new instance of the planner server.
    ///
    /// This function will not wait for a connection from the simulator before returning.
    pub fn new(params: &PlanExecParams) -> Result<Self, PlanServerError> {
        let ctx = zmq::Context::new();

        let socket = MonitoredSocket::new(
            &ctx,
            zmq::REP,
            SocketOptions::server(params.recv_timeout_ms),
            &params.net.plan_endpoint
        )?;

        Ok(Self { socket })
    }

    /// Returns true if the simulator is connected.
    pub fn connected(&self) -> bool {
        self.socket.connected()
    }

    /// Receive the next event from the simulator.
    ///
    /// `None` is returned if nothing was received before the timeout. Once an event is returned
    /// the caller MUST answer it with [`PlanServer::send`].
    pub fn recv_event(&mut self) -> Option<SimEvent> {
        let msg = match self.socket.recv_msg(0) {
            Ok(m) => m,
            Err(e) => {
                if !is_recv_timeout(&e) {
                    warn!("Could not receive from the simulator: {}", e);
                }
                return None
            }
        };

        match msg.as_str() {
            Some(raw) => Some(parse_event(raw)),
            None => {
                warn!("Received a message which is not valid UTF-8, treating as manual");
                Some(SimEvent::Manual)
            }
        }
    }

    /// Send a response to the simulator.
    pub fn send(&mut self, response: &SimResponse) -> Result<(), PlanServerError> {
        let frame = response.to_frame()
            .map_err(PlanServerError::EncodeError)?;

        self.socket.send(frame.as_str(), 0)
            .map_err(PlanServerError::SendError)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a raw message from the simulator.
///
/// Messages which cannot be parsed are treated as manual events, so that they are acknowledged
/// without a path rather than stopping the server.
pub fn parse_event(raw: &str) -> SimEvent {
    match SimEvent::parse(raw) {
        Ok(event) => {
            if let SimEvent::Manual = event {
                trace!("Received manual event: {}", raw);
            }
            event
        },
        Err(e) => {
            warn!("Could not parse the simulator message, treating as manual: {}", e);
            SimEvent::Manual
        }
    }
}

/// Whether a receive error only means that nothing arrived before the socket's timeout.
fn is_recv_timeout(e: &zmq::Error) -> bool {
    matches!(e, zmq::Error::EAGAIN)
}
