//! # Number Listening Lab Common Library
//!
//! Shared code for the listening trainer and its front ends:
//! - Error type
//! - Configuration loading
//! - Domain enums and snapshot types (TaskKind, Phase, DigitStatus, ...)
//! - Event types (LabEvent) and the EventBus
//! - Gain envelope curves for synthesized cues

pub mod config;
pub mod envelope;
pub mod error;
pub mod events;
pub mod time;

pub use config::LabConfig;
pub use envelope::RampCurve;
pub use error::{Error, Result};
