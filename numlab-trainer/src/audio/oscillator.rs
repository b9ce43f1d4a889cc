//! Oscillator with frequency steps and a gain envelope
//!
//! A `ToneSpec` describes a short synthesized sound the way a browser audio
//! graph would schedule it: a waveform, frequency changes at fixed offsets
//! (set-value-at-time semantics), and a gain ramp across the whole duration.

use super::sink::Clip;
use numlab_common::RampCurve;
use std::f32::consts::TAU;

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Sample value at a phase in [0, 1)
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

/// Frequency change scheduled at an offset from the tone start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyStep {
    pub at_secs: f32,
    pub hz: f32,
}

/// Description of a synthesized tone
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSpec {
    pub waveform: Waveform,
    /// Sorted by `at_secs`; the first step starts at 0.0
    pub steps: Vec<FrequencyStep>,
    pub gain_start: f32,
    pub gain_end: f32,
    pub gain_curve: RampCurve,
    pub duration_secs: f32,
}

impl ToneSpec {
    /// Constant tone at full gain
    pub fn new(waveform: Waveform, hz: f32, duration_secs: f32) -> Self {
        Self {
            waveform,
            steps: vec![FrequencyStep { at_secs: 0.0, hz }],
            gain_start: 1.0,
            gain_end: 1.0,
            gain_curve: RampCurve::Linear,
            duration_secs,
        }
    }

    /// Switch to a new frequency at `at_secs`
    pub fn then_frequency(mut self, at_secs: f32, hz: f32) -> Self {
        self.steps.push(FrequencyStep { at_secs, hz });
        self.steps
            .sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        self
    }

    /// Ramp gain from `start` to `end` over the whole tone
    pub fn with_gain(mut self, start: f32, end: f32, curve: RampCurve) -> Self {
        self.gain_start = start;
        self.gain_end = end;
        self.gain_curve = curve;
        self
    }

    /// Frequency in effect at time `t`
    pub fn frequency_at(&self, t: f32) -> f32 {
        self.steps
            .iter()
            .take_while(|step| step.at_secs <= t)
            .last()
            .or_else(|| self.steps.first())
            .map(|step| step.hz)
            .unwrap_or(0.0)
    }

    /// Gain in effect at time `t`
    pub fn gain_at(&self, t: f32) -> f32 {
        if self.duration_secs <= 0.0 {
            return self.gain_end;
        }
        self.gain_curve
            .value_at(self.gain_start, self.gain_end, t / self.duration_secs)
    }

    /// Render the tone to a mono clip
    ///
    /// Phase is accumulated continuously so frequency steps don't click.
    pub fn render(&self, sample_rate: u32) -> Clip {
        let total = (self.duration_secs.max(0.0) * sample_rate as f32).round() as usize;
        let mut samples = Vec::with_capacity(total);
        let mut phase = 0.0f32;

        for n in 0..total {
            let t = n as f32 / sample_rate as f32;
            samples.push(self.waveform.sample(phase) * self.gain_at(t));

            phase += self.frequency_at(t) / sample_rate as f32;
            phase -= phase.floor();
        }

        Clip::new(samples, sample_rate)
    }
}
