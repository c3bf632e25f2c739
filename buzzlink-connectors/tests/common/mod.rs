//! Shared helpers for the connector integration tests
//!
//! - Loopback node configurations with short, test-sized durations
//! - Polling waits with a hard deadline
//! - A raw TCP client for driving the servers byte by byte

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use buzzlink_core::{DeliveryConfig, DetectorConfig, HeartbeatConfig, NodeConfig, ReceiverConfig};

/// Every listener on 127.0.0.1 with an OS-assigned port, heartbeat off
pub fn loopback_config() -> NodeConfig {
    NodeConfig {
        detector: DetectorConfig::default()
            .poll_interval_ms(20)
            .control_port(0)
            .start_enabled(true),
        notify: DeliveryConfig::default().cooldown_ms(150).timeout_ms(1000),
        receiver: ReceiverConfig::default()
            .bind_addr("127.0.0.1")
            .port(0)
            .connection_timeout_ms(200)
            .pulse_ms(20),
        heartbeat: HeartbeatConfig::default().enabled(false),
    }
}

pub fn notify_url(addr: SocketAddr) -> String {
    format!("http://{addr}/notify")
}

/// Poll `condition` every 10 ms until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// Send `payload` (possibly empty), then read the whole response
pub fn raw_exchange(addr: SocketAddr, payload: &[u8], timeout: Duration) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(timeout)).expect("read timeout");
    if !payload.is_empty() {
        stream.write_all(payload).expect("write");
    }
    let mut reply = String::new();
    stream.read_to_string(&mut reply).expect("read response");
    reply
}

/// Body of a raw HTTP response
pub fn body(reply: &str) -> &str {
    reply.split("\r\n\r\n").nth(1).unwrap_or("")
}
