//! Event types for the trainer event system
//!
//! Provides shared event definitions and the EventBus used by presentation layers.

mod types;

pub use types::{
    DigitStatus, Difficulty, Phase, PlaybackSpeed, ScoreRecord, SessionSnapshot, TaskKind,
    TaskView,
};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Trainer event types
///
/// Emitted by the session controller after each handled event. Presentation
/// layers usually only need `SnapshotUpdated`; the discrete variants exist for
/// logging and sound-independent feedback (e.g. flashing the screen).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LabEvent {
    /// Session started (persisted scores loaded)
    SessionStarted {
        session_id: Uuid,
        high_score: u32,
        score: ScoreRecord,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A fresh task replaced the previous one
    TaskLoaded {
        generation: u64,
        kind: TaskKind,
        expected_length: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A rendition started
    PlaybackStarted {
        generation: u64,
        speed: PlaybackSpeed,
        rate: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The in-flight rendition finished (naturally, with an error, or by timeout)
    PlaybackFinished {
        generation: u64,
        timed_out: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An answer was submitted and checked
    AnswerChecked {
        generation: u64,
        correct: bool,
        diff: Vec<DigitStatus>,
        streak: u32,
        high_score: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Stress mode toggled
    StressModeChanged {
        enabled: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// High score explicitly reset
    HighScoreReset {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Correct/total record explicitly reset
    ScoreReset {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Full state for redraw
    SnapshotUpdated {
        snapshot: SessionSnapshot,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session controller stopped
    SessionEnded {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl LabEvent {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            LabEvent::SessionStarted { .. } => "SessionStarted",
            LabEvent::TaskLoaded { .. } => "TaskLoaded",
            LabEvent::PlaybackStarted { .. } => "PlaybackStarted",
            LabEvent::PlaybackFinished { .. } => "PlaybackFinished",
            LabEvent::AnswerChecked { .. } => "AnswerChecked",
            LabEvent::StressModeChanged { .. } => "StressModeChanged",
            LabEvent::HighScoreReset { .. } => "HighScoreReset",
            LabEvent::ScoreReset { .. } => "ScoreReset",
            LabEvent::SnapshotUpdated { .. } => "SnapshotUpdated",
            LabEvent::SessionEnded { .. } => "SessionEnded",
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block the session)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use numlab_common::events::{EventBus, LabEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(LabEvent::StressModeChanged {
///     enabled: true,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(LabEvent::StressModeChanged { enabled: true, .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LabEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LabEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: LabEvent) -> Result<usize, broadcast::error::SendError<LabEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: LabEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        let result = bus.emit(LabEvent::HighScoreReset {
            timestamp: chrono::Utc::now(),
        });
        assert!(result.is_err());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let delivered = bus
            .emit(LabEvent::StressModeChanged {
                enabled: true,
                timestamp: chrono::Utc::now(),
            })
            .unwrap();
        assert_eq!(delivered, 2);

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                LabEvent::StressModeChanged { enabled, .. } => assert!(enabled),
                other => panic!("Unexpected event: {}", other.name()),
            }
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = LabEvent::TaskLoaded {
            generation: 3,
            kind: TaskKind::DeliveryCode,
            expected_length: 5,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TaskLoaded");
        assert_eq!(json["kind"], "delivery_code");
        assert_eq!(json["expected_length"], 5);
    }
}
