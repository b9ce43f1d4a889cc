//! Session controller
//!
//! Single owner of the session state. Commands, playback completions and
//! timer firings arrive on one queue and are handled one at a time; a
//! `SnapshotUpdated` event is published after each of them.
//!
//! Audio and storage failures are absorbed by the collaborators (renderer,
//! feedback synthesizer, score keeper), so no handler here can fail.

use super::command::{Command, SessionEvent};
use super::state::SessionState;
use super::timers::Timers;
use super::SessionHandle;
use crate::feedback::FeedbackSynthesizer;
use crate::renderer::{AudioRenderer, RenditionOutcome};
use crate::storage::{ScoreKeeper, ScoreStore};
use crate::task::{Task, TaskGenerator};
use numlab_common::config::SessionConfig;
use numlab_common::events::{EventBus, LabEvent, Phase, PlaybackSpeed, SessionSnapshot};
use numlab_common::time::{millis_to_duration, now};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct SessionController<S: ScoreStore> {
    state: SessionState,
    generator: TaskGenerator,
    renderer: AudioRenderer,
    feedback: FeedbackSynthesizer,
    scores: ScoreKeeper<S>,
    config: SessionConfig,
    events: EventBus,
    timers: Timers,
    tx: mpsc::UnboundedSender<SessionEvent>,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
    session_id: Uuid,
    started: bool,
    running: bool,
}

impl<S: ScoreStore> SessionController<S> {
    pub fn new(
        generator: TaskGenerator,
        renderer: AudioRenderer,
        feedback: FeedbackSynthesizer,
        store: S,
        config: SessionConfig,
        events: EventBus,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let generator = match config.kind {
            Some(kind) => generator.with_kind_filter(Some(kind)),
            None => generator,
        };

        Self {
            state: SessionState::new(0, Default::default()),
            generator,
            renderer,
            feedback,
            scores: ScoreKeeper::new(store),
            config,
            events,
            timers: Timers::new(tx.clone()),
            tx,
            rx,
            session_id: Uuid::new_v4(),
            started: false,
            running: true,
        }
    }

    /// Handle for feeding commands from other tasks
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.tx.clone())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn renderer(&self) -> &AudioRenderer {
        &self.renderer
    }

    pub fn store(&self) -> &S {
        self.scores.store()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Load persisted scores and the first task
    ///
    /// Called by `run()` if not called explicitly; later calls are no-ops.
    pub async fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let high_score = self.scores.load_high_score().await;
        let score = self.scores.load_score().await;
        let stress_mode = self.state.stress_mode();
        self.state = SessionState::new(high_score, score);
        self.state.set_stress_mode(stress_mode);

        info!(
            "Session {} started (high score {}, {}/{} correct)",
            self.session_id, high_score, score.correct, score.total
        );
        self.events.emit_lossy(LabEvent::SessionStarted {
            session_id: self.session_id,
            high_score,
            score,
            timestamp: now(),
        });

        self.next_task();
        self.publish_snapshot();
    }

    /// Process events until shutdown
    pub async fn run(&mut self) {
        self.start().await;
        while self.running {
            if !self.step().await {
                break;
            }
        }
        self.shutdown();
    }

    /// Wait for and handle one event
    ///
    /// Returns false once the session has stopped.
    pub async fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }
        match self.rx.recv().await {
            Some(event) => {
                self.handle_event(event).await;
                self.running
            }
            None => false,
        }
    }

    /// Handle every event already queued, without waiting
    ///
    /// Returns the number handled.
    pub async fn drain(&mut self) -> usize {
        let mut handled = 0;
        while self.running {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.handle_event(event).await;
                    handled += 1;
                }
                Err(_) => break,
            }
        }
        handled
    }

    pub async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Command(command) => self.handle_command(command).await,
            SessionEvent::PlaybackFinished {
                generation,
                play_id,
                outcome,
            } => self.on_playback_finished(generation, play_id, outcome),
            SessionEvent::AutoAdvance { generation } => self.on_auto_advance(generation),
        }
        self.publish_snapshot();
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::PressDigit(c) => {
                if !self.state.press_char(c) {
                    debug!("Rejected input {:?} in {:?}", c, self.state.phase());
                }
            }
            Command::Backspace => {
                self.state.backspace();
            }
            Command::Clear => {
                self.state.clear_input();
            }
            Command::RequestPlay(speed) => self.request_play(speed),
            Command::Submit => self.submit().await,
            Command::NextChallenge => {
                if self.state.is_checked() || self.state.task().is_none() {
                    self.next_task();
                } else {
                    debug!("Next challenge ignored: current task not checked");
                }
            }
            Command::ToggleStressMode => self.set_stress_mode(!self.state.stress_mode()),
            Command::ResetHighScore => {
                self.state.reset_high_score();
                self.scores.clear_high_score().await;
                info!("High score reset");
                self.events.emit_lossy(LabEvent::HighScoreReset { timestamp: now() });
            }
            Command::ResetScore => {
                self.state.reset_score();
                self.scores.clear_score().await;
                info!("Score record reset");
                self.events.emit_lossy(LabEvent::ScoreReset { timestamp: now() });
            }
            Command::Shutdown => {
                debug!("Shutdown requested");
                self.running = false;
            }
        }
    }

    fn request_play(&mut self, speed: PlaybackSpeed) {
        if let Some(id) = self.state.playing() {
            debug!("Play request dropped: rendition {} in flight", id);
            return;
        }
        let Some(task) = self.state.task() else {
            debug!("Play request dropped: no task");
            return;
        };

        let Some(rendition) = self.renderer.render(task, speed, self.state.stress_mode()) else {
            return;
        };

        let generation = self.state.generation();
        self.state.start_playing(rendition.id, speed);
        self.events.emit_lossy(LabEvent::PlaybackStarted {
            generation,
            speed,
            rate: rendition.rate,
            timestamp: now(),
        });
        self.timers.watch_playback(generation, rendition);
    }

    fn on_playback_finished(&mut self, generation: u64, play_id: u64, outcome: RenditionOutcome) {
        if generation != self.state.generation() || self.state.playing() != Some(play_id) {
            debug!("Discarding stale playback completion {} (generation {})", play_id, generation);
            self.renderer.finish(play_id);
            return;
        }

        let timed_out = outcome == RenditionOutcome::TimedOut;
        match &outcome {
            RenditionOutcome::TimedOut => {
                warn!("Rendition {} hit its safety ceiling, cancelling", play_id);
                self.renderer.cancel();
            }
            RenditionOutcome::Failed(reason) => {
                debug!("Rendition {} failed: {}", play_id, reason);
                self.renderer.finish(play_id);
            }
            RenditionOutcome::Completed | RenditionOutcome::Cancelled => {
                self.renderer.finish(play_id);
            }
        }
        self.state.finish_playing(play_id);

        self.events.emit_lossy(LabEvent::PlaybackFinished {
            generation,
            timed_out,
            timestamp: now(),
        });
    }

    async fn submit(&mut self) {
        let Some(result) = self.state.submit() else {
            debug!("Submit ignored: input incomplete or already checked");
            return;
        };

        if result.correct {
            self.feedback.play_success();
        } else {
            self.feedback.play_error();
        }

        if result.new_high_score {
            self.scores.save_high_score(self.state.high_score()).await;
        }
        self.scores.save_score(self.state.score()).await;

        let generation = self.state.generation();
        info!(
            "Generation {} checked: {} (streak {})",
            generation,
            if result.correct { "correct" } else { "incorrect" },
            result.streak
        );
        self.events.emit_lossy(LabEvent::AnswerChecked {
            generation,
            correct: result.correct,
            diff: result.diff.into_vec(),
            streak: result.streak,
            high_score: self.state.high_score(),
            timestamp: now(),
        });

        if result.correct && self.config.auto_advance {
            self.timers.schedule_auto_advance(
                generation,
                millis_to_duration(self.config.auto_advance_delay_ms),
            );
            self.state.set_auto_advance_pending(true);
        }
    }

    fn on_auto_advance(&mut self, generation: u64) {
        if generation != self.state.generation() || !self.state.auto_advance_pending() {
            debug!("Discarding stale auto-advance for generation {}", generation);
            return;
        }
        self.next_task();
    }

    /// Enter Idle and immediately load a fresh task
    fn next_task(&mut self) {
        let task = self.generator.generate();
        self.replace_task(task);
    }

    /// Present a specific task instead of a generated one
    pub fn load_task(&mut self, task: Task) {
        self.replace_task(task);
        self.publish_snapshot();
    }

    fn replace_task(&mut self, task: Task) {
        self.timers.cancel_all();
        if self.state.playing().is_some() {
            self.renderer.cancel();
            self.state.stop_playing();
        }

        let kind = task.kind();
        let expected_length = task.expected_length();
        let generation = self.state.load_task(task);
        debug_assert_eq!(self.state.phase(), Phase::Loaded);

        info!("Task {} loaded: {} ({} chars)", generation, kind, expected_length);
        self.events.emit_lossy(LabEvent::TaskLoaded {
            generation,
            kind,
            expected_length,
            timestamp: now(),
        });
    }

    /// Enable or disable stress mode (the ambient bed follows it)
    pub fn set_stress_mode(&mut self, enabled: bool) {
        self.state.set_stress_mode(enabled);
        self.renderer.set_ambient(enabled);
        info!("Stress mode {}", if enabled { "on" } else { "off" });
        self.events.emit_lossy(LabEvent::StressModeChanged {
            enabled,
            timestamp: now(),
        });
    }

    fn publish_snapshot(&self) {
        self.events.emit_lossy(LabEvent::SnapshotUpdated {
            snapshot: self.state.snapshot(),
            timestamp: now(),
        });
    }

    /// Cancel timers and speech, stop the ambient bed
    pub fn shutdown(&mut self) {
        self.running = false;
        self.timers.cancel_all();
        self.renderer.shutdown();
        self.events.emit_lossy(LabEvent::SessionEnded { timestamp: now() });
        info!("Session {} ended", self.session_id);
    }
}
