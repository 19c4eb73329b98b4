//! Host-supplied reactions to the two control actions.
//!
//! The display offers an emergency stop and a calibrate button. Neither
//! touches simulation state: the engine simply forwards them to whatever
//! [`ActionHooks`] the host installed. Hosts with nothing to wire up use
//! [`NoOpHooks`].

/// Callbacks for the host-level control actions.
pub trait ActionHooks: Send {
    /// The operator pressed emergency stop.
    fn on_emergency_stop(&mut self);

    /// The operator pressed calibrate.
    fn on_calibrate(&mut self);
}

/// Hooks that ignore every action.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHooks;

impl ActionHooks for NoOpHooks {
    fn on_emergency_stop(&mut self) {}

    fn on_calibrate(&mut self) {}
}
