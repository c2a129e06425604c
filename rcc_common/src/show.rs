//! Show controller contract.
//!
//! The theming controller is an external collaborator; the supervisor drives
//! it through this start/stop/status surface and nothing more.

/// Capability contract for the show (theming) controller.
pub trait ShowController: Send + Sync {
    /// Start the show program.
    fn start_show(&self);

    /// Stop the show program.
    fn stop_show(&self);

    /// Human-readable show status.
    fn status(&self) -> String;
}
