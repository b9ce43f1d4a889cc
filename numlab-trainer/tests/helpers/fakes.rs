//! Fake collaborators

use numlab_trainer::audio::{AudioSink, Clip, LoopId};
use numlab_trainer::speech::{
    SpeechCompletion, SpeechOutcome, SpeechRequest, SpeechSynthesizer, Voice,
};
use numlab_trainer::{Error, Result};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tokio::sync::oneshot;

/// What the fake speech engine has been asked to do
#[derive(Default)]
pub struct FakeSpeechState {
    pub available: bool,
    pub voices: Vec<Voice>,
    pub requests: Vec<SpeechRequest>,
    pub cancels: usize,
    /// Fail `speak` calls instead of starting an utterance
    pub fail_speak: bool,
    pending: Option<oneshot::Sender<SpeechOutcome>>,
}

impl FakeSpeechState {
    /// Resolve the in-flight utterance
    pub fn complete(&mut self, outcome: SpeechOutcome) -> bool {
        match self.pending.take() {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_request(&self) -> Option<&SpeechRequest> {
        self.requests.last()
    }
}

pub struct FakeSpeech {
    state: Rc<RefCell<FakeSpeechState>>,
}

impl FakeSpeech {
    pub fn new(available: bool, voices: Vec<Voice>) -> (Self, Rc<RefCell<FakeSpeechState>>) {
        let state = Rc::new(RefCell::new(FakeSpeechState {
            available,
            voices,
            ..Default::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl SpeechSynthesizer for FakeSpeech {
    fn is_available(&self) -> bool {
        self.state.borrow().available
    }

    fn list_voices(&self) -> Vec<Voice> {
        self.state.borrow().voices.clone()
    }

    fn speak(&self, request: SpeechRequest) -> Result<SpeechCompletion> {
        let mut state = self.state.borrow_mut();
        state.requests.push(request);
        if state.fail_speak {
            return Err(Error::Speech("scripted failure".to_string()));
        }
        let (tx, rx) = oneshot::channel();
        state.pending = Some(tx);
        Ok(rx)
    }

    fn cancel(&self) {
        let mut state = self.state.borrow_mut();
        state.cancels += 1;
        if let Some(tx) = state.pending.take() {
            let _ = tx.send(SpeechOutcome::Cancelled);
        }
    }
}

/// Sink that records what it was asked to play
pub struct RecordingSink {
    sample_rate: u32,
    pub played: RefCell<Vec<(Clip, f32)>>,
    pub loops_started: RefCell<Vec<(LoopId, Clip, f32)>>,
    pub loops_stopped: RefCell<Vec<LoopId>>,
    active: RefCell<HashSet<LoopId>>,
    next_id: RefCell<u64>,
}

impl RecordingSink {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            played: RefCell::new(Vec::new()),
            loops_started: RefCell::new(Vec::new()),
            loops_stopped: RefCell::new(Vec::new()),
            active: RefCell::new(HashSet::new()),
            next_id: RefCell::new(1),
        }
    }

    pub fn active_loops(&self) -> usize {
        self.active.borrow().len()
    }

    pub fn loop_starts(&self) -> usize {
        self.loops_started.borrow().len()
    }

    pub fn cue_count(&self) -> usize {
        self.played.borrow().len()
    }

    /// Durations of played cues, in samples
    pub fn cue_lengths(&self) -> Vec<usize> {
        self.played.borrow().iter().map(|(c, _)| c.len()).collect()
    }
}

impl AudioSink for RecordingSink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&self, clip: Clip, gain: f32) -> Result<()> {
        self.played.borrow_mut().push((clip, gain));
        Ok(())
    }

    fn start_loop(&self, clip: Clip, gain: f32) -> Result<LoopId> {
        let mut next = self.next_id.borrow_mut();
        let id = LoopId(*next);
        *next += 1;
        self.active.borrow_mut().insert(id);
        self.loops_started.borrow_mut().push((id, clip, gain));
        Ok(id)
    }

    fn stop_loop(&self, id: LoopId) -> Result<()> {
        self.active.borrow_mut().remove(&id);
        self.loops_stopped.borrow_mut().push(id);
        Ok(())
    }
}
