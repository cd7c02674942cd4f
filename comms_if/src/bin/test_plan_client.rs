//! Simple planner client test
//!
//! Connects to a running planner, sends a handshake and then a cold start telemetry event once a
//! second, printing each response.

use comms_if::{
    net::{MonitoredSocket, SocketOptions},
    sim::{PathDems, SimResponse},
};

/// Cold start telemetry for a vehicle stationary in the middle lane.
const COLD_START_TELEMETRY: &str = r#"42["telemetry",{"x":909.48,"y":1128.67,"yaw":0,"speed":0,"s":124.8336,"d":6.164833,"previous_path_x":[],"previous_path_y":[],"end_path_s":0,"end_path_d":0,"sensor_fusion":[]}]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("tcp://localhost:4567"));

    let ctx = zmq::Context::new();

    let socket_options = SocketOptions {
        connect_timeout: 1000,
        heartbeat_ivl: 500,
        heartbeat_ttl: 1000,
        heartbeat_timeout: 1000,
        linger: 1,
        recv_timeout: 1000,
        send_timeout: 10,
        req_correlate: true,
        req_relaxed: true,
        ..Default::default()
    };

    let socket = match MonitoredSocket::new(&ctx, zmq::REQ, socket_options, &endpoint) {
        Ok(s) => s,
        Err(e) => {
            println!("Could not connect to the planner at {}", endpoint);
            return Err(e.into())
        }
    };

    // The first message is a handshake, which should be acknowledged without a path
    let messages = std::iter::once("42[\"connect\",null]")
        .chain(std::iter::repeat(COLD_START_TELEMETRY));

    for msg in messages {
        if !socket.connected() {
            println!("Waiting for connection");
            std::thread::sleep(std::time::Duration::from_millis(1000));
            continue;
        }

        if let Err(e) = socket.send(msg, 0) {
            println!("could not send: {}", e);
            std::thread::sleep(std::time::Duration::from_millis(1000));
            continue;
        }

        let reply = match socket.recv_string(0) {
            Ok(Ok(r)) => r,
            Ok(Err(_)) => {
                println!("response was not valid UTF-8");
                continue;
            },
            Err(e) => {
                println!("could not read from planner: {}", e);
                std::thread::sleep(std::time::Duration::from_millis(1000));
                continue;
            }
        };

        if reply == SimResponse::Manual.to_frame()? {
            println!("acknowledged");
        }
        else {
            let body = reply.trim_start_matches("42[\"control\",").trim_end_matches(']');
            let path: PathDems = serde_json::from_str(body)?;
            println!(
                "path of {} points, first ({:.3}, {:.3})", 
                path.len(), 
                path.next_x.first().copied().unwrap_or(std::f64::NAN),
                path.next_y.first().copied().unwrap_or(std::f64::NAN)
            );
        }

        std::thread::sleep(std::time::Duration::from_millis(1000));
    }

    Ok(())
}
