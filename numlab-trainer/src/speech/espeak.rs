//! espeak-ng speech backend
//!
//! Each utterance runs the `espeak-ng` command-line synthesizer as a child
//! process. Completion is the process exit; cancellation kills the child.

use super::{SpeechCompletion, SpeechOutcome, SpeechRequest, SpeechSynthesizer, Voice};
use crate::error::{Error, Result};
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// espeak-ng default speaking rate in words per minute
const BASE_WPM: f32 = 175.0;
const MIN_WPM: f32 = 80.0;
const MAX_WPM: f32 = 450.0;

/// espeak-ng default pitch (0-99 scale)
const BASE_PITCH: f32 = 50.0;

/// Map a rate multiplier to espeak-ng words per minute
pub fn words_per_minute(rate: f32) -> u32 {
    (BASE_WPM * rate).clamp(MIN_WPM, MAX_WPM).round() as u32
}

/// Map a pitch multiplier to the espeak-ng pitch scale
pub fn pitch_value(pitch: f32) -> u32 {
    (BASE_PITCH * pitch).clamp(0.0, 99.0).round() as u32
}

/// Parse `espeak-ng --voices` output
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  cmn             --/M      Chinese_(Mandarin) sit/cmn              (zh-cmn 5)(zh 5)
/// ```
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("Pty"))
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _priority = fields.next()?;
            let language = fields.next()?;
            let _age_gender = fields.next()?;
            let name = fields.next()?;
            let _file = fields.next();
            let rest: Vec<&str> = fields.collect();

            let aliases = rest
                .join(" ")
                .split(')')
                .filter_map(|chunk| {
                    let inner = chunk.trim().strip_prefix('(')?;
                    inner.split_whitespace().next().map(str::to_string)
                })
                .collect();

            Some(Voice {
                id: language.to_string(),
                name: name.replace('_', " "),
                locale: language.to_string(),
                aliases,
            })
        })
        .collect()
}

/// Speech engine backed by the espeak-ng binary
pub struct EspeakSynthesizer {
    binary: String,
    voices: Vec<Voice>,
    available: bool,
    /// Cancels the in-flight utterance
    cancel_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl EspeakSynthesizer {
    /// Probe the binary and load its voice list
    ///
    /// A missing or failing binary yields an unavailable engine rather than
    /// an error.
    pub async fn probe(binary: &str) -> Self {
        let output = Command::new(binary)
            .arg("--voices")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;

        let (voices, available) = match output {
            Ok(out) if out.status.success() => {
                let voices = parse_voice_list(&String::from_utf8_lossy(&out.stdout));
                info!("{} available with {} voices", binary, voices.len());
                (voices, true)
            }
            Ok(out) => {
                warn!("{} --voices exited with {}", binary, out.status);
                (Vec::new(), false)
            }
            Err(e) => {
                debug!("{} not usable: {}", binary, e);
                (Vec::new(), false)
            }
        };

        Self::with_voices(binary, voices, available)
    }

    /// Engine with a known voice list (no probing)
    pub fn with_voices(binary: &str, voices: Vec<Voice>, available: bool) -> Self {
        Self {
            binary: binary.to_string(),
            voices,
            available,
            cancel_tx: Mutex::new(None),
        }
    }

    fn command(&self, request: &SpeechRequest) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("-v")
            .arg(request.voice.as_deref().unwrap_or(&request.locale))
            .arg("-s")
            .arg(words_per_minute(request.rate).to_string())
            .arg("-p")
            .arg(pitch_value(request.pitch).to_string())
            .arg(&request.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

impl SpeechSynthesizer for EspeakSynthesizer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn list_voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    /// Must be called inside a tokio runtime
    fn speak(&self, request: SpeechRequest) -> Result<SpeechCompletion> {
        if !self.available {
            return Err(Error::Speech(format!("{} is not available", self.binary)));
        }

        let mut child = self
            .command(&request)
            .spawn()
            .map_err(|e| Error::Speech(format!("Failed to start {}: {}", self.binary, e)))?;

        let (done_tx, done_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        if let Ok(mut slot) = self.cancel_tx.lock() {
            *slot = Some(cancel_tx);
        }

        debug!(
            "Speaking {} chars at {} wpm",
            request.text.chars().count(),
            words_per_minute(request.rate)
        );

        tokio::spawn(async move {
            let exited = tokio::select! {
                status = child.wait() => Some(status),
                // Fires on cancel() and when the engine is dropped
                _ = cancel_rx => None,
            };

            let outcome = match exited {
                Some(Ok(status)) if status.success() => SpeechOutcome::Ended,
                Some(Ok(status)) => SpeechOutcome::Failed(format!("exited with {}", status)),
                Some(Err(e)) => SpeechOutcome::Failed(e.to_string()),
                None => {
                    if let Err(e) = child.kill().await {
                        debug!("Failed to kill speech process: {}", e);
                    }
                    SpeechOutcome::Cancelled
                }
            };
            let _ = done_tx.send(outcome);
        });

        Ok(done_rx)
    }

    fn cancel(&self) {
        if let Ok(mut slot) = self.cancel_tx.lock() {
            if let Some(tx) = slot.take() {
                let _ = tx.send(());
            }
        }
    }
}
