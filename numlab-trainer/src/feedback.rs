//! Feedback cues
//!
//! Two short synthesized cues: an ascending sine chime for a correct answer
//! and a descending sawtooth buzz for a wrong one. Both are rendered once at
//! construction and replayed through the sink. Playback failures are logged
//! at debug level and otherwise ignored.

use crate::audio::oscillator::{ToneSpec, Waveform};
use crate::audio::{AudioSink, Clip};
use numlab_common::RampCurve;
use std::rc::Rc;
use tracing::debug;

/// Which cue to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Success,
    Error,
}

impl Cue {
    /// Tone description of the cue
    pub fn tone(&self) -> ToneSpec {
        match self {
            Cue::Success => ToneSpec::new(Waveform::Sine, 880.0, 0.3)
                .then_frequency(0.1, 1108.73)
                .with_gain(0.3, 0.01, RampCurve::Exponential),
            Cue::Error => ToneSpec::new(Waveform::Sawtooth, 200.0, 0.2)
                .then_frequency(0.1, 150.0)
                .with_gain(0.2, 0.01, RampCurve::Exponential),
        }
    }
}

pub struct FeedbackSynthesizer {
    sink: Rc<dyn AudioSink>,
    success: Clip,
    error: Clip,
}

impl FeedbackSynthesizer {
    pub fn new(sink: Rc<dyn AudioSink>) -> Self {
        let rate = sink.sample_rate();
        Self {
            success: Cue::Success.tone().render(rate),
            error: Cue::Error.tone().render(rate),
            sink,
        }
    }

    pub fn play_success(&self) {
        self.play(Cue::Success);
    }

    pub fn play_error(&self) {
        self.play(Cue::Error);
    }

    /// Fire-and-forget
    pub fn play(&self, cue: Cue) {
        let clip = match cue {
            Cue::Success => self.success.clone(),
            Cue::Error => self.error.clone(),
        };
        if let Err(e) = self.sink.play(clip, 1.0) {
            debug!("{:?} cue not played: {}", cue, e);
        }
    }
}
