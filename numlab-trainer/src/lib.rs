//! # Number Listening Lab Trainer Library (numlab-trainer)
//!
//! Listening-comprehension engine for spoken numbers.
//!
//! **Purpose:** Generate numeric challenges (phone numbers, pickup codes, prices),
//! render them as speech at native or learner tempo (optionally under stress:
//! randomized tempo plus an ambient noise bed), and score digit-by-digit answers.
//!
//! **Architecture:** A single-owner session controller driven by an event queue.
//! Audio collaborators sit behind traits: `SpeechSynthesizer` (espeak-ng adapter),
//! `AudioSink` (software mixer feeding a cpal stream) and `ScoreStore` (SQLite
//! settings table).

pub mod audio;
pub mod db;
pub mod error;
pub mod evaluator;
pub mod feedback;
pub mod renderer;
pub mod session;
pub mod speech;
pub mod storage;
pub mod task;
pub mod terminal;

pub use error::{Error, Result};
pub use evaluator::{diff, is_correct, DigitDiff};
pub use feedback::FeedbackSynthesizer;
pub use renderer::{AudioRenderer, Rendition, RenditionOutcome};
pub use session::{Command, SessionController, SessionEvent, SessionHandle};
pub use storage::{MemoryScoreStore, ScoreStore};
pub use task::{Task, TaskGenerator};
