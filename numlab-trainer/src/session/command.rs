//! Session inputs

use crate::renderer::RenditionOutcome;
use numlab_common::events::PlaybackSpeed;

/// Discrete command from a presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Type one character (digit or decimal separator)
    PressDigit(char),
    Backspace,
    Clear,
    RequestPlay(PlaybackSpeed),
    Submit,
    /// Replace the task after checking ("try again" loads a fresh task)
    NextChallenge,
    ToggleStressMode,
    ResetHighScore,
    ResetScore,
    Shutdown,
}

/// Everything the controller reacts to
///
/// Timer events carry the generation they were scheduled for; the controller
/// drops them once a newer task is loaded.
#[derive(Debug)]
pub enum SessionEvent {
    Command(Command),
    PlaybackFinished {
        generation: u64,
        play_id: u64,
        outcome: RenditionOutcome,
    },
    AutoAdvance {
        generation: u64,
    },
}

impl From<Command> for SessionEvent {
    fn from(command: Command) -> Self {
        SessionEvent::Command(command)
    }
}
