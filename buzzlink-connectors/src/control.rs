//! Start/stop endpoint for the detection loop
//!
//! | Request      | Effect              | Body                                             |
//! |--------------|---------------------|--------------------------------------------------|
//! | `GET /video` | detection on        | `Detection started` / `Detection already running` |
//! | `GET /stop`  | detection off       | `Detection stopped`                              |
//! | other path   | none                | `404`                                            |
//! | non-`GET`    | none                | `405`                                            |
//! | no request line | none             | `400`                                            |
//!
//! The buzzer device's periodic return notification targets `/video`, so
//! it doubles as a keep-alive that restarts detection after a `/stop` only
//! if someone calls `/video` again.

use buzzlink_core::constants::network::{START_PATH, STOP_PATH};
use buzzlink_core::DetectionSwitch;

use crate::server::{Handler, Request, Response};

/// Toggles a [`DetectionSwitch`] from HTTP requests
#[derive(Debug, Clone)]
pub struct ControlEndpoint {
    switch: DetectionSwitch,
}

impl ControlEndpoint {
    pub fn new(switch: DetectionSwitch) -> Self {
        Self { switch }
    }

    pub fn switch(&self) -> &DetectionSwitch {
        &self.switch
    }
}

impl Handler for ControlEndpoint {
    fn handle(&mut self, request: &Request) -> Response {
        let Some((method, path)) = request.request_line() else {
            log::debug!("Control request without a request line");
            return Response::new(400, "Bad Request", "Bad Request");
        };
        if method != "GET" {
            return Response::new(405, "Method Not Allowed", "Method Not Allowed");
        }

        // Ignore any query string
        let path = path.split('?').next().unwrap_or(path);
        match path {
            START_PATH => {
                if self.switch.enable() {
                    log::info!("Detection started by control request");
                    Response::ok("Detection started")
                } else {
                    Response::ok("Detection already running")
                }
            }
            STOP_PATH => {
                if self.switch.disable() {
                    log::info!("Detection stopped by control request");
                }
                Response::ok("Detection stopped")
            }
            _ => Response::new(404, "Not Found", "Not Found"),
        }
    }
}
