//! Shared fakes for numlab-trainer integration tests
//!
//! - FakeSpeech: scripted speech engine that records requests and only
//!   completes utterances when the test says so
//! - RecordingSink: audio sink that records cues and looped clips
//! - TestSession: controller wired to both, plus a memory store

#![allow(dead_code)]

pub mod fakes;

pub use fakes::{FakeSpeech, FakeSpeechState, RecordingSink};

use numlab_common::config::{AudioConfig, SessionConfig, SpeechConfig};
use numlab_common::events::{EventBus, LabEvent};
use numlab_trainer::speech::{SpeechSynthesizer, Voice};
use numlab_trainer::storage::MemoryScoreStore;
use numlab_trainer::{
    AudioRenderer, Command, FeedbackSynthesizer, SessionController, SessionEvent, Task,
    TaskGenerator,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::broadcast;

pub const SAMPLE_RATE: u32 = 8_000;

pub fn mandarin_voice() -> Voice {
    Voice {
        id: "cmn".to_string(),
        name: "Chinese (Mandarin)".to_string(),
        locale: "cmn".to_string(),
        aliases: vec!["zh-cmn".to_string(), "zh".to_string()],
    }
}

/// Small ambient loop so tests stay fast
pub fn test_audio_config() -> AudioConfig {
    AudioConfig {
        sample_rate: SAMPLE_RATE,
        ambient_loop_ms: 200,
        ..AudioConfig::default()
    }
}

pub struct TestSession {
    pub controller: SessionController<MemoryScoreStore>,
    pub speech: Rc<RefCell<FakeSpeechState>>,
    pub sink: Rc<RecordingSink>,
    pub store: MemoryScoreStore,
    pub events: broadcast::Receiver<LabEvent>,
}

pub struct SessionBuilder {
    session: SessionConfig,
    speech: SpeechConfig,
    store: MemoryScoreStore,
    speech_available: bool,
    seed: u64,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            session: SessionConfig::default(),
            speech: SpeechConfig::default(),
            store: MemoryScoreStore::new(),
            speech_available: true,
            seed: 7,
        }
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session = config;
        self
    }

    pub fn speech_config(mut self, config: SpeechConfig) -> Self {
        self.speech = config;
        self
    }

    pub fn store(mut self, store: MemoryScoreStore) -> Self {
        self.store = store;
        self
    }

    pub fn without_speech(mut self) -> Self {
        self.speech_available = false;
        self
    }

    pub fn build(self) -> TestSession {
        let (fake, speech) = FakeSpeech::new(self.speech_available, vec![mandarin_voice()]);
        let sink = Rc::new(RecordingSink::new(SAMPLE_RATE));
        let boxed: Box<dyn SpeechSynthesizer> = Box::new(fake);

        let renderer = AudioRenderer::new(
            boxed,
            sink.clone(),
            self.speech,
            test_audio_config(),
            StdRng::seed_from_u64(self.seed),
        );
        let feedback = FeedbackSynthesizer::new(sink.clone());
        let bus = EventBus::new(256);
        let events = bus.subscribe();

        let controller = SessionController::new(
            TaskGenerator::seeded(self.seed),
            renderer,
            feedback,
            self.store.clone(),
            self.session,
            bus,
        );

        TestSession {
            controller,
            speech,
            sink,
            store: self.store,
            events,
        }
    }
}

impl TestSession {
    /// Started session presenting a known task
    pub async fn with_task(mut self, task: Task) -> Self {
        self.controller.start().await;
        self.controller.load_task(task);
        self
    }

    pub async fn send(&mut self, command: Command) {
        self.controller
            .handle_event(SessionEvent::Command(command))
            .await;
    }

    /// Type a string character by character
    pub async fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.send(Command::PressDigit(c)).await;
        }
    }

    /// Drain the event bus, keeping everything but snapshots
    pub fn lab_events(&mut self) -> Vec<LabEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if !matches!(event, LabEvent::SnapshotUpdated { .. }) {
                out.push(event);
            }
        }
        out
    }
}
