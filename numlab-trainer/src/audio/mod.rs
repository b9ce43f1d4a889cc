//! Tone and noise synthesis
//!
//! Clips are rendered up front (oscillator cues, filtered noise) and handed to
//! an `AudioSink`, which mixes them onto the output device.

pub mod filter;
pub mod mixer;
pub mod noise;
pub mod oscillator;
pub mod output;
pub mod sink;

pub use mixer::Mixer;
pub use output::DeviceSink;
pub use sink::{AudioSink, Clip, LoopId, NullSink};
