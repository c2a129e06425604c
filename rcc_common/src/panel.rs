//! Operator panel events and the panel producer contract.
//!
//! The panel hardware runs on its own worker and hands typed events to the
//! supervisor through a bounded MPSC queue. All handler code runs on the
//! supervisor thread, in FIFO order of enqueue.

use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

use crate::timing::ShutdownSignal;

/// Depth of the panel event queue. A full queue drops the send on the panel
/// side rather than stalling the supervisor.
pub const PANEL_QUEUE_DEPTH: usize = 64;

/// Edge state of a momentary push button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MomentaryButton {
    /// Button pressed.
    Pressed,
    /// Button released.
    Released,
}

/// Position of the sustained maintenance rotary switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SustainedSwitch {
    /// Ride operation enabled.
    On,
    /// Ride operation disabled.
    Off,
    /// Reserved third position; currently a no-op.
    Maintenance,
}

/// Position of the momentary three-way jog switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MomentarySwitch {
    /// Jog both motors forward.
    Up,
    /// Spring-return center position.
    Neutral,
    /// Jog both motors in reverse.
    Down,
}

/// A single operator panel event.
///
/// The panel produces one event per edge (press/release) or switch position
/// change; the supervisor dispatches on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelEvent {
    /// Dispatch button edge.
    Dispatch(MomentaryButton),
    /// Reset button edge.
    Reset(MomentaryButton),
    /// Stop button edge.
    Stop(MomentaryButton),
    /// E-Stop button edge.
    EStop(MomentaryButton),
    /// Maintenance switch position change.
    Maintenance(SustainedSwitch),
    /// Jog switch position change.
    Jog(MomentarySwitch),
}

/// Create the bounded panel event queue.
pub fn panel_channel() -> (SyncSender<PanelEvent>, Receiver<PanelEvent>) {
    sync_channel(PANEL_QUEUE_DEPTH)
}

/// Contract for panel implementations.
///
/// An implementation watches its inputs (GPIO, web UI, test script) and sends
/// one [`PanelEvent`] per observed edge until the shutdown signal fires.
pub trait PanelEventSource: Send {
    /// Blocking producer loop. Runs on a dedicated worker thread.
    fn run(&mut self, events: &SyncSender<PanelEvent>, shutdown: &ShutdownSignal);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_is_bounded() {
        let (tx, _rx) = panel_channel();
        for _ in 0..PANEL_QUEUE_DEPTH {
            tx.try_send(PanelEvent::Stop(MomentaryButton::Pressed))
                .unwrap();
        }
        assert!(
            tx.try_send(PanelEvent::Stop(MomentaryButton::Pressed))
                .is_err()
        );
    }

    #[test]
    fn events_drain_in_fifo_order() {
        let (tx, rx) = panel_channel();
        tx.send(PanelEvent::Dispatch(MomentaryButton::Pressed))
            .unwrap();
        tx.send(PanelEvent::EStop(MomentaryButton::Pressed)).unwrap();
        tx.send(PanelEvent::Jog(MomentarySwitch::Neutral)).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            PanelEvent::Dispatch(MomentaryButton::Pressed)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            PanelEvent::EStop(MomentaryButton::Pressed)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            PanelEvent::Jog(MomentarySwitch::Neutral)
        );
        assert!(rx.try_recv().is_err());
    }
}
