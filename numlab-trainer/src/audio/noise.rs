//! Noise buffer generation
//!
//! The ambient bed is a looped buffer of band-limited random noise. Loop seams
//! are crossfaded so the bed does not tick every time it wraps.

use super::filter::OnePoleLowPass;
use super::sink::Clip;
use numlab_common::RampCurve;
use rand::Rng;

/// Amplitude distribution of generated noise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseShape {
    /// Uniform in [-amplitude, amplitude]
    Uniform,
    /// Sum of two uniforms: peaks at zero, softer than uniform
    Triangular,
}

/// Generate `count` noise samples
pub fn noise_buffer<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    amplitude: f32,
    shape: NoiseShape,
) -> Vec<f32> {
    (0..count)
        .map(|_| {
            let v = match shape {
                NoiseShape::Uniform => rng.gen_range(-1.0f32..=1.0),
                NoiseShape::Triangular => {
                    (rng.gen_range(-1.0f32..=1.0) + rng.gen_range(-1.0f32..=1.0)) * 0.5
                }
            };
            v * amplitude
        })
        .collect()
}

/// Parameters of the looped ambient bed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientSpec {
    pub loop_ms: u64,
    pub cutoff_hz: f32,
    /// Length of the crossfade at the loop seam
    pub seam_ms: u64,
}

/// Render a loopable, low-passed, peak-normalized noise clip
pub fn ambient_loop<R: Rng + ?Sized>(rng: &mut R, spec: AmbientSpec, sample_rate: u32) -> Clip {
    let loop_len = (spec.loop_ms as usize * sample_rate as usize) / 1000;
    let seam_len = ((spec.seam_ms as usize * sample_rate as usize) / 1000).min(loop_len / 2);

    let mut raw = noise_buffer(rng, loop_len + seam_len, 1.0, NoiseShape::Uniform);
    OnePoleLowPass::new(spec.cutoff_hz, sample_rate).apply(&mut raw);

    // Fold the overshoot back over the head: the end of the loop then flows
    // into sample 0 exactly as it would have continued.
    let mut samples = raw[..loop_len].to_vec();
    for i in 0..seam_len {
        let t = (i + 1) as f32 / (seam_len + 1) as f32;
        let head = RampCurve::Linear.value_at(0.0, 1.0, t);
        samples[i] = samples[i] * head + raw[loop_len + i] * (1.0 - head);
    }

    let peak = samples.iter().fold(0.0f32, |a, s| a.max(s.abs()));
    if peak > 0.0 {
        for s in samples.iter_mut() {
            *s /= peak;
        }
    }

    Clip::new(samples, sample_rate)
}
