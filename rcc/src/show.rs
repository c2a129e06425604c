//! Show controller sink.
//!
//! The theming hardware is driven by an external system; this sink records
//! the commanded state and logs each command until that integration lands.

use std::sync::{Mutex, PoisonError};

use tracing::info;

use rcc_common::show::ShowController;

/// Logging [`ShowController`] sink.
#[derive(Default)]
pub struct LoggingShowController {
    running: Mutex<bool>,
}

impl LoggingShowController {
    /// Create a stopped show.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShowController for LoggingShowController {
    fn start_show(&self) {
        info!("Show start commanded");
        *self.running.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    fn stop_show(&self) {
        info!("Show stop commanded");
        *self.running.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }

    fn status(&self) -> String {
        if *self.running.lock().unwrap_or_else(PoisonError::into_inner) {
            "Running".to_string()
        } else {
            "Stopped".to_string()
        }
    }
}
