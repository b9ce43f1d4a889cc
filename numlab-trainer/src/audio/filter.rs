//! One-pole low-pass filter
//!
//! Used to band-limit the ambient noise bed so it reads as distant street
//! noise rather than hiss.

use std::f32::consts::TAU;

/// First-order IIR low-pass: y[n] = y[n-1] + α (x[n] - y[n-1])
#[derive(Debug, Clone)]
pub struct OnePoleLowPass {
    alpha: f32,
    state: f32,
}

impl OnePoleLowPass {
    /// Create a filter for a cutoff frequency at a sample rate
    ///
    /// The cutoff is clamped below Nyquist.
    pub fn new(cutoff_hz: f32, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1) as f32;
        let cutoff = cutoff_hz.clamp(1.0, sample_rate / 2.0);
        let rc = 1.0 / (TAU * cutoff);
        let dt = 1.0 / sample_rate;
        Self {
            alpha: dt / (rc + dt),
            state: 0.0,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Filter one sample
    pub fn process(&mut self, input: f32) -> f32 {
        self.state += self.alpha * (input - self.state);
        self.state
    }

    /// Filter a buffer in place
    pub fn apply(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process(*s);
        }
    }
}
