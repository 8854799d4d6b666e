//! Shared agent state handed to every request handler.

use std::sync::Arc;

use crate::capture::CaptureController;
use crate::capture_log::CaptureLog;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<CaptureController>,
    // Read side of the log; the controller owns the only writer.
    pub log: CaptureLog,
}

impl AppState {
    pub fn new(controller: CaptureController, log: CaptureLog) -> Self {
        Self {
            controller: Arc::new(controller),
            log,
        }
    }
}
