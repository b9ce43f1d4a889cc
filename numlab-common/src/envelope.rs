//! Gain envelope curves for synthesized cues
//!
//! A ramp moves a parameter (usually gain) from a start value to an end value
//! over a normalized position 0.0..=1.0. The exponential ramp matches the
//! behaviour of a browser-style `exponentialRampToValueAtTime`: equal ratios
//! per unit time, which sounds like a natural decay.

/// Ramp curve types for gain envelopes
///
/// - Linear: constant rate of change
/// - Exponential: constant ratio of change (natural-sounding decay)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampCurve {
    /// v(t) = start + (end - start) × t
    Linear,

    /// v(t) = start × (end / start)^t
    ///
    /// Both values must be strictly positive; otherwise the ramp degrades to linear.
    Exponential,
}

impl RampCurve {
    /// Value of the ramp at a normalized position
    ///
    /// # Arguments
    /// * `start` - Value at position 0.0
    /// * `end` - Value at position 1.0
    /// * `position` - Normalized position through the ramp (clamped to 0.0..=1.0)
    pub fn value_at(&self, start: f32, end: f32, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            RampCurve::Linear => start + (end - start) * t,
            RampCurve::Exponential => {
                if start <= 0.0 || end <= 0.0 {
                    return start + (end - start) * t;
                }
                start * (end / start).powf(t)
            }
        }
    }
}
