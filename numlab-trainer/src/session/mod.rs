//! Challenge lifecycle
//!
//! `SessionController` owns the state and the event queue; `SessionHandle`
//! lets other tasks (stdin reader, tests) post commands to it.

mod command;
mod controller;
mod state;
mod timers;

pub use command::{Command, SessionEvent};
pub use controller::SessionController;
pub use state::{SessionState, Submission};
pub use timers::Timers;

use tokio::sync::mpsc::UnboundedSender;

/// Cloneable sender of commands into a session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    pub(crate) fn new(tx: UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    /// Queue a command; false once the controller is gone
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(SessionEvent::Command(command)).is_ok()
    }

    /// Queue several commands in order
    pub fn send_all(&self, commands: impl IntoIterator<Item = Command>) -> bool {
        commands.into_iter().all(|c| self.send(c))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
