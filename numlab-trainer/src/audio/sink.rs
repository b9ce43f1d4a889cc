//! Audio sink seam
//!
//! The trainer never talks to an output device directly. Cues and the ambient
//! bed go through `AudioSink`, which a device-backed mixer or a null sink
//! implements.

use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Handle for a looped clip started on a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopId(pub u64);

/// Rendered mono audio
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl Clip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

/// Low-level tone/noise output device
///
/// Methods take `&self`; implementations use interior mutability so the
/// renderer and the feedback synthesizer can share one sink.
pub trait AudioSink {
    /// Rate clips should be rendered at
    fn sample_rate(&self) -> u32;

    /// Play a clip once at the given gain (fire-and-forget)
    fn play(&self, clip: Clip, gain: f32) -> Result<()>;

    /// Start playing a clip in a loop until stopped
    fn start_loop(&self, clip: Clip, gain: f32) -> Result<LoopId>;

    /// Stop a looped clip; unknown ids are ignored
    fn stop_loop(&self, id: LoopId) -> Result<()>;
}

/// Sink used when no output device is available
#[derive(Debug, Clone)]
pub struct NullSink {
    sample_rate: u32,
    reason: String,
}

impl NullSink {
    pub fn new(sample_rate: u32, reason: impl Into<String>) -> Self {
        Self {
            sample_rate,
            reason: reason.into(),
        }
    }
}

impl AudioSink for NullSink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&self, _clip: Clip, _gain: f32) -> Result<()> {
        Err(Error::AudioUnavailable(self.reason.clone()))
    }

    fn start_loop(&self, _clip: Clip, _gain: f32) -> Result<LoopId> {
        Err(Error::AudioUnavailable(self.reason.clone()))
    }

    fn stop_loop(&self, _id: LoopId) -> Result<()> {
        Ok(())
    }
}
