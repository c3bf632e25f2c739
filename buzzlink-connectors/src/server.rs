//! Minimal serial TCP server
//!
//! Expected load is one request per cooldown interval, so connections are
//! handled one at a time, each to completion before the next `accept`:
//!
//! ```text
//! accept ─→ set timeouts ─→ read ≤ limit ─→ handler ─→ write response ─→ close
//!   ↑                          │ (timeout: proceed                          │
//!   │                          │  with what arrived)                        │
//!   └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests are not parsed beyond the request line. A client that connects
//! and sends nothing is still handled once its read timeout expires: the
//! connection itself is the signal.
//!
//! Per-connection failures are logged and counted; [`Server::run`] never
//! returns.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use buzzlink_core::ReceiverConfig;
use thiserror::Error;

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind the listening socket (fatal at startup)
    #[error("Cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// A single connection failed (absorbed by the accept loop)
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),
}

/// Bytes received on one connection
#[derive(Debug, Clone)]
pub struct Request {
    pub peer: Option<SocketAddr>,
    pub bytes: Vec<u8>,
}

impl Request {
    /// `(method, path)` from the first line, if one arrived
    pub fn request_line(&self) -> Option<(&str, &str)> {
        let text = std::str::from_utf8(&self.bytes).ok()?;
        let line = text.lines().next()?;
        let mut parts = line.split_whitespace();
        let method = parts.next()?;
        let path = parts.next()?;
        Some((method, path))
    }
}

/// Plaintext HTTP-shaped response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: &'static str,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, "OK", body)
    }

    pub fn new(status: u16, reason: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            body: body.into(),
        }
    }

    /// Wire form: status line, content-type, length, body
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            self.reason,
            self.body.len(),
            self.body
        )
        .into_bytes()
    }
}

/// Turns one request into one response
///
/// Runs on the accept thread; whatever it does (including driving the
/// actuator) delays the response and the next accept.
pub trait Handler: Send {
    fn handle(&mut self, request: &Request) -> Response;
}

/// Per-server counters
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Connections handled to completion
    pub served: AtomicU64,
    /// Connections that failed at accept, read or write
    pub failed: AtomicU64,
}

/// Serial accept loop around a [`Handler`]
pub struct Server<H> {
    listener: TcpListener,
    handler: H,
    connection_timeout: Duration,
    read_limit: usize,
    stats: Arc<ServerStats>,
}

impl<H: Handler> Server<H> {
    /// Bind `addr` with the timeouts and limits from `config`
    pub fn bind(addr: impl ToSocketAddrs + ToString, handler: H, config: &ReceiverConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self::from_listener(listener, handler, config))
    }

    pub fn from_listener(listener: TcpListener, handler: H, config: &ReceiverConfig) -> Self {
        Self {
            listener,
            handler,
            connection_timeout: config.connection_timeout(),
            read_limit: config.read_limit_bytes,
            stats: Arc::new(ServerStats::default()),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Accept and fully handle one connection
    pub fn serve_once(&mut self) -> Result<Response, ServerError> {
        let (stream, peer) = self.listener.accept()?;
        log::debug!("Connection from {}", peer);
        let result = self.handle_connection(stream, Some(peer));
        match &result {
            Ok(_) => self.stats.served.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.stats.failed.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    /// Serve forever; connection failures are logged and skipped
    pub fn run(&mut self) -> ! {
        if let Ok(addr) = self.local_addr() {
            log::info!("Listening on {}", addr);
        }
        loop {
            if let Err(e) = self.serve_once() {
                log::warn!("Server: {}", e);
            }
        }
    }

    fn handle_connection(&mut self, mut stream: TcpStream, peer: Option<SocketAddr>) -> Result<Response, ServerError> {
        stream.set_read_timeout(Some(self.connection_timeout))?;
        stream.set_write_timeout(Some(self.connection_timeout))?;

        let bytes = read_request(&mut stream, self.read_limit);
        let request = Request { peer, bytes };
        let response = self.handler.handle(&request);

        stream.write_all(&response.to_bytes())?;
        stream.flush()?;
        // Peer may already be gone; the response is written either way
        let _ = stream.shutdown(Shutdown::Both);
        Ok(response)
    }
}

/// Read until the end of the headers, `limit` bytes, EOF or timeout
///
/// Read errors end the read but not the request.
fn read_request<R: Read>(stream: &mut R, limit: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(limit.min(1024));
    let mut chunk = [0u8; 256];
    while bytes.len() < limit {
        let want = chunk.len().min(limit - bytes.len());
        match stream.read(&mut chunk[..want]) {
            Ok(0) => break,
            Ok(n) => {
                bytes.extend_from_slice(&chunk[..n]);
                if bytes.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                if !matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) {
                    log::debug!("Read failed, proceeding: {}", e);
                }
                break;
            }
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct Echo;

    impl Handler for Echo {
        fn handle(&mut self, request: &Request) -> Response {
            match request.request_line() {
                Some((method, path)) => Response::ok(format!("{method} {path}")),
                None => Response::ok(format!("{} bytes", request.bytes.len())),
            }
        }
    }

    fn test_config() -> ReceiverConfig {
        ReceiverConfig::default().connection_timeout_ms(150).read_limit_bytes(64)
    }

    fn exchange(addr: SocketAddr, payload: &[u8]) -> String {
        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        client.write_all(payload).unwrap();
        let mut reply = String::new();
        client.read_to_string(&mut reply).unwrap();
        reply
    }

    #[test]
    fn response_wire_format() {
        let bytes = Response::ok("Notified").to_bytes();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 8\r\nConnection: close\r\n\r\nNotified"
        );
    }

    #[test]
    fn request_line_parsing() {
        let request = Request { peer: None, bytes: b"GET /stop HTTP/1.1\r\nHost: x\r\n\r\n".to_vec() };
        assert_eq!(request.request_line(), Some(("GET", "/stop")));

        let empty = Request { peer: None, bytes: Vec::new() };
        assert_eq!(empty.request_line(), None);
    }

    #[test]
    fn serves_request_line() {
        let mut server = Server::bind("127.0.0.1:0", Echo, &test_config()).unwrap();
        let addr = server.local_addr().unwrap();
        let handle = thread::spawn(move || {
            server.serve_once().unwrap();
            server
        });

        let reply = exchange(addr, b"GET /video HTTP/1.1\r\n\r\n");
        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(reply.ends_with("GET /video"));

        let server = handle.join().unwrap();
        assert_eq!(server.stats().served.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn silent_client_still_answered() {
        let mut server = Server::bind("127.0.0.1:0", Echo, &test_config()).unwrap();
        let addr = server.local_addr().unwrap();
        let handle = thread::spawn(move || server.serve_once().unwrap());

        let reply = exchange(addr, b"");
        assert!(reply.ends_with("0 bytes"));
        handle.join().unwrap();
    }

    #[test]
    fn read_stops_at_limit_or_header_end() {
        let flood = [b'x'; 200];
        assert_eq!(read_request(&mut &flood[..], 64).len(), 64);

        let request = b"GET /notify HTTP/1.1\r\n\r\n";
        assert_eq!(read_request(&mut &request[..], 512), request.to_vec());
        assert!(read_request(&mut &b""[..], 512).is_empty());
    }

    #[test]
    fn failed_connection_does_not_stop_server() {
        let mut server = Server::bind("127.0.0.1:0", Echo, &test_config()).unwrap();
        let addr = server.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let outcomes: Vec<bool> = (0..2).map(|_| server.serve_once().is_ok()).collect();
            (outcomes, server)
        });

        // First client leaves before the response; second behaves
        {
            let client = TcpStream::connect(addr).unwrap();
            client.shutdown(Shutdown::Both).unwrap();
        }
        let reply = exchange(addr, b"GET /notify HTTP/1.1\r\n\r\n");
        assert!(reply.ends_with("GET /notify"));

        let (outcomes, server) = handle.join().unwrap();
        assert!(outcomes[1]);
        let stats = server.stats();
        assert_eq!(
            stats.served.load(Ordering::Relaxed) + stats.failed.load(Ordering::Relaxed),
            2
        );
    }

    #[test]
    fn bind_conflict_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap().to_string();
        assert!(matches!(
            Server::bind(addr.as_str(), Echo, &test_config()),
            Err(ServerError::Bind { .. })
        ));
    }
}
