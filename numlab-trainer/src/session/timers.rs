//! Cancellable session timers
//!
//! Each timer is a spawned task that posts one `SessionEvent` back to the
//! controller queue. Aborting the task cancels the timer; events that still
//! slip through carry their generation and are discarded by the controller.

use super::command::SessionEvent;
use crate::renderer::Rendition;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct Timers {
    tx: UnboundedSender<SessionEvent>,
    auto_advance: Option<JoinHandle<()>>,
    playback: Option<JoinHandle<()>>,
}

impl Timers {
    pub fn new(tx: UnboundedSender<SessionEvent>) -> Self {
        Self {
            tx,
            auto_advance: None,
            playback: None,
        }
    }

    /// Post `AutoAdvance { generation }` after `delay`
    ///
    /// Replaces any pending auto-advance.
    pub fn schedule_auto_advance(&mut self, generation: u64, delay: Duration) {
        self.cancel_auto_advance();
        let tx = self.tx.clone();
        self.auto_advance = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SessionEvent::AutoAdvance { generation });
        }));
        debug!("Auto-advance scheduled for generation {} in {:?}", generation, delay);
    }

    pub fn cancel_auto_advance(&mut self) {
        if let Some(handle) = self.auto_advance.take() {
            handle.abort();
        }
    }

    pub fn auto_advance_scheduled(&self) -> bool {
        self.auto_advance
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Await a rendition (with its safety ceiling) and post the outcome
    pub fn watch_playback(&mut self, generation: u64, rendition: Rendition) {
        self.cancel_playback();
        let tx = self.tx.clone();
        let play_id = rendition.id;
        self.playback = Some(tokio::spawn(async move {
            let outcome = rendition.finished().await;
            let _ = tx.send(SessionEvent::PlaybackFinished {
                generation,
                play_id,
                outcome,
            });
        }));
    }

    pub fn cancel_playback(&mut self) {
        if let Some(handle) = self.playback.take() {
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        self.cancel_auto_advance();
        self.cancel_playback();
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_auto_advance_fires_with_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = Timers::new(tx);
        timers.schedule_auto_advance(4, Duration::from_millis(1500));
        assert!(timers.auto_advance_scheduled());

        match rx.recv().await {
            Some(SessionEvent::AutoAdvance { generation }) => assert_eq!(generation, 4),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = Timers::new(tx);
        timers.schedule_auto_advance(1, Duration::from_millis(1500));
        timers.cancel_all();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert!(!timers.auto_advance_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_pending_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = Timers::new(tx);
        timers.schedule_auto_advance(1, Duration::from_millis(1500));
        timers.schedule_auto_advance(2, Duration::from_millis(1500));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::AutoAdvance { generation: 2 })));
        assert!(rx.try_recv().is_err());
    }
}
