//! Shared mutable context threaded through every FSM handler.
//!
//! The service fills in the debounced input events and the current
//! epoch-relative time before each tick; handlers answer with at most one
//! [`SessionCommand`] for the service to apply through the storage port.

/// Storage action requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Open a new session log named from `start_ts`.
    Open { start_ts: u64 },
    /// Final sync and close of the open session log.
    Close,
}

/// The shared context passed to every state handler function.
#[derive(Debug, Default)]
pub struct FsmContext {
    /// A debounced start press arrived this iteration.
    pub start_event: bool,
    /// A debounced stop press arrived this iteration.
    pub stop_event: bool,
    /// Milliseconds since the custom epoch at the start of this iteration.
    pub now_epoch_ms: u64,
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,

    command: Option<SessionCommand>,
}

impl FsmContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command.  A transition issues at most one, so a pending
    /// command is only ever overwritten by a programming error.
    pub fn request(&mut self, command: SessionCommand) {
        debug_assert!(self.command.is_none(), "unapplied session command");
        self.command = Some(command);
    }

    /// Take the pending command, if any.
    pub fn take_command(&mut self) -> Option<SessionCommand> {
        self.command.take()
    }

    /// Clear the per-iteration input events.
    pub fn clear_events(&mut self) {
        self.start_event = false;
        self.stop_event = false;
    }
}
