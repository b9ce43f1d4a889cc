//! Speech synthesis seam
//!
//! The renderer asks a `SpeechSynthesizer` to speak one utterance at a time and
//! awaits a oneshot completion. The espeak-ng adapter is the production
//! backend; `NullSynthesizer` stands in when no engine is installed.

pub mod espeak;
pub mod tokens;

pub use espeak::EspeakSynthesizer;
pub use tokens::{utterance, SpokenToken, PAUSE_MARKER};

use crate::error::{Error, Result};
use tokio::sync::oneshot;

/// A voice offered by a speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub name: String,
    /// Primary locale, e.g. `zh-CN` or `cmn`
    pub locale: String,
    /// Additional locales the voice declares
    pub aliases: Vec<String>,
}

impl Voice {
    fn locales(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.locale.as_str()).chain(self.aliases.iter().map(|a| a.as_str()))
    }
}

/// One utterance request
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub locale: String,
    /// Voice id chosen by the caller; None uses the engine default
    pub voice: Option<String>,
    /// Rate multiplier, 1.0 = engine default tempo
    pub rate: f32,
    /// Pitch multiplier, 1.0 = engine default pitch
    pub pitch: f32,
}

/// How an utterance ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    Ended,
    Failed(String),
    Cancelled,
}

/// Resolves once the utterance ends, fails or is cancelled
///
/// A dropped sender (engine torn down) reads as `RecvError`.
pub type SpeechCompletion = oneshot::Receiver<SpeechOutcome>;

/// Text-to-speech engine
pub trait SpeechSynthesizer {
    /// Whether the engine can speak at all
    fn is_available(&self) -> bool;

    /// Voices known to the engine
    fn list_voices(&self) -> Vec<Voice>;

    /// Start speaking; the returned receiver resolves when speech ends
    fn speak(&self, request: SpeechRequest) -> Result<SpeechCompletion>;

    /// Abort in-flight speech (no-op when idle)
    fn cancel(&self);
}

/// Pick the voice for a locale
///
/// Exact locale match first, then a voice sharing the language prefix
/// (`zh` for `zh-CN`). Aliases count as locales. Comparison ignores case and
/// treats `_` like `-`.
pub fn select_voice<'a>(voices: &'a [Voice], locale: &str) -> Option<&'a Voice> {
    let wanted = normalize_locale(locale);
    let language = wanted.split('-').next().unwrap_or_default().to_string();

    voices
        .iter()
        .find(|v| v.locales().any(|l| normalize_locale(l) == wanted))
        .or_else(|| {
            voices.iter().find(|v| {
                v.locales()
                    .any(|l| normalize_locale(l).split('-').next() == Some(language.as_str()))
            })
        })
}

fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-").to_lowercase()
}

/// Engine used when no speech backend is installed
#[derive(Debug, Clone, Default)]
pub struct NullSynthesizer;

impl SpeechSynthesizer for NullSynthesizer {
    fn is_available(&self) -> bool {
        false
    }

    fn list_voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&self, _request: SpeechRequest) -> Result<SpeechCompletion> {
        Err(Error::Speech("no speech engine available".to_string()))
    }

    fn cancel(&self) {}
}
