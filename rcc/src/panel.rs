//! Panel event source placeholder.
//!
//! The operator panel hardware is an external collaborator reached through
//! [`PanelEventSource`]; until the GPIO panel is wired in, the process runs
//! with a source that produces no events.

use std::sync::mpsc::SyncSender;
use std::time::Duration;

use rcc_common::panel::{PanelEvent, PanelEventSource};
use rcc_common::timing::ShutdownSignal;

/// Panel source that emits nothing and parks until shutdown.
pub struct IdlePanelSource;

impl PanelEventSource for IdlePanelSource {
    fn run(&mut self, _events: &SyncSender<PanelEvent>, shutdown: &ShutdownSignal) {
        while !shutdown.wait_timeout(Duration::from_secs(1)) {}
    }
}
