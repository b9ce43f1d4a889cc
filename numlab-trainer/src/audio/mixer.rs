//! Software mixer for cue and ambient voices
//!
//! # Architecture
//!
//! - One-shot voices (feedback cues) play to the end and are dropped
//! - Looped voices (ambient bed) wrap until stopped
//! - All voices are summed and the result clamped to [-1.0, 1.0] before it
//!   reaches the device
//!
//! Output is mono, copied to every device channel.

use super::sink::{Clip, LoopId};
use cpal::{FromSample, Sample};

#[derive(Debug)]
struct Voice {
    id: u64,
    clip: Clip,
    position: usize,
    gain: f32,
    looped: bool,
}

impl Voice {
    fn next_sample(&mut self) -> Option<f32> {
        let samples = self.clip.samples();
        if samples.is_empty() {
            return None;
        }
        if self.position >= samples.len() {
            if !self.looped {
                return None;
            }
            self.position = 0;
        }
        let value = samples[self.position] * self.gain;
        self.position += 1;
        Some(value)
    }

    fn finished(&self) -> bool {
        !self.looped && self.position >= self.clip.len()
    }
}

/// Mixer state shared between the control thread and the audio callback
#[derive(Debug)]
pub struct Mixer {
    voices: Vec<Voice>,
    next_id: u64,
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            voices: Vec::new(),
            next_id: 1,
        }
    }

    /// Queue a clip to play once
    pub fn play_once(&mut self, clip: Clip, gain: f32) -> u64 {
        self.add_voice(clip, gain, false)
    }

    /// Start a looped clip
    pub fn start_loop(&mut self, clip: Clip, gain: f32) -> LoopId {
        LoopId(self.add_voice(clip, gain, true))
    }

    /// Stop a looped clip
    ///
    /// Returns false if the loop was not playing.
    pub fn stop_loop(&mut self, id: LoopId) -> bool {
        let before = self.voices.len();
        self.voices.retain(|v| !(v.looped && v.id == id.0));
        self.voices.len() != before
    }

    pub fn is_looping(&self, id: LoopId) -> bool {
        self.voices.iter().any(|v| v.looped && v.id == id.0)
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    fn add_voice(&mut self, clip: Clip, gain: f32, looped: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.voices.push(Voice {
            id,
            clip,
            position: 0,
            gain: gain.max(0.0),
            looped,
        });
        id
    }

    /// Produce the next mono output sample
    pub fn next_sample(&mut self) -> f32 {
        let mut sum = 0.0;
        for voice in self.voices.iter_mut() {
            if let Some(v) = voice.next_sample() {
                sum += v;
            }
        }
        self.voices.retain(|v| !v.finished());
        sum.clamp(-1.0, 1.0)
    }

    /// Fill an interleaved device buffer in the device's sample format
    pub fn fill<T>(&mut self, out: &mut [T], channels: usize)
    where
        T: Sample + FromSample<f32>,
    {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let value = T::from_sample(self.next_sample());
            frame.fill(value);
        }
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}
