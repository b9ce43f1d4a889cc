//! Audio renderer
//!
//! Turns a task's answer into a spoken rendition and owns the stress-mode
//! ambient bed.
//!
//! # Lifecycle
//!
//! - `render()` starts one rendition and marks the renderer busy; further
//!   calls return None until `finish()` or `cancel()`
//! - The returned `Rendition` is awaited by the caller; `finished()` applies
//!   the safety ceiling so a silent backend cannot hold the session
//! - The ambient bed is independent of renditions and only follows
//!   `set_ambient()`
//!
//! Without a speech engine the rendition is a silent timer of fixed length,
//! so the lesson stays completable.

use crate::audio::noise::{ambient_loop, AmbientSpec};
use crate::audio::{AudioSink, Clip, LoopId};
use crate::speech::{
    select_voice, utterance, SpeechCompletion, SpeechOutcome, SpeechRequest, SpeechSynthesizer,
    Voice,
};
use crate::task::Task;
use numlab_common::config::{AudioConfig, SpeechConfig};
use numlab_common::events::PlaybackSpeed;
use numlab_common::time::millis_to_duration;
use rand::rngs::StdRng;
use rand::Rng;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Crossfade at the ambient loop seam
const AMBIENT_SEAM_MS: u64 = 50;

/// How a rendition ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenditionOutcome {
    Completed,
    Failed(String),
    Cancelled,
    /// The safety ceiling elapsed first
    TimedOut,
}

/// One in-flight rendition
#[derive(Debug)]
pub struct Rendition {
    pub id: u64,
    pub speed: PlaybackSpeed,
    pub rate: f32,
    pub text: String,
    /// Upper bound on how long `finished()` waits
    pub ceiling: Duration,
    /// True when standing in for an unavailable speech engine
    pub silent: bool,
    completion: SpeechCompletion,
}

impl Rendition {
    /// Wait for the rendition to end, bounded by the safety ceiling
    pub async fn finished(self) -> RenditionOutcome {
        match tokio::time::timeout(self.ceiling, self.completion).await {
            Ok(Ok(SpeechOutcome::Ended)) => RenditionOutcome::Completed,
            Ok(Ok(SpeechOutcome::Failed(reason))) => RenditionOutcome::Failed(reason),
            Ok(Ok(SpeechOutcome::Cancelled)) => RenditionOutcome::Cancelled,
            Ok(Err(_)) => RenditionOutcome::Failed("speech engine dropped the utterance".to_string()),
            Err(_) => RenditionOutcome::TimedOut,
        }
    }
}

/// Speech renditions plus the ambient noise bed
pub struct AudioRenderer {
    speech: Box<dyn SpeechSynthesizer>,
    sink: Rc<dyn AudioSink>,
    speech_config: SpeechConfig,
    audio_config: AudioConfig,
    rng: StdRng,
    voice: Option<Voice>,
    /// Id of the in-flight rendition
    busy: Option<u64>,
    next_id: u64,
    ambient: Option<LoopId>,
    ambient_clip: Option<Clip>,
}

impl AudioRenderer {
    pub fn new(
        speech: Box<dyn SpeechSynthesizer>,
        sink: Rc<dyn AudioSink>,
        speech_config: SpeechConfig,
        audio_config: AudioConfig,
        rng: StdRng,
    ) -> Self {
        let voice = if speech.is_available() {
            let voices = speech.list_voices();
            let chosen = select_voice(&voices, &speech_config.locale).cloned();
            match &chosen {
                Some(v) => info!("Using voice '{}' ({}) for {}", v.name, v.id, speech_config.locale),
                None => warn!(
                    "No voice for locale {}, using the engine default",
                    speech_config.locale
                ),
            }
            chosen
        } else {
            info!("No speech engine available, playback will be silent");
            None
        };

        Self {
            speech,
            sink,
            speech_config,
            audio_config,
            rng,
            voice,
            busy: None,
            next_id: 1,
            ambient: None,
            ambient_clip: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_some()
    }

    /// Voice chosen for the configured locale
    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    /// Rate multiplier for the next rendition
    ///
    /// Under stress the native rate is redrawn on every call and slow speed
    /// is a fixed fraction of that draw.
    pub fn select_rate(&mut self, speed: PlaybackSpeed, stress: bool) -> f32 {
        let cfg = &self.speech_config;
        if !stress {
            return match speed {
                PlaybackSpeed::Native => cfg.native_rate,
                PlaybackSpeed::Slow => cfg.slow_rate,
            };
        }

        let stressed = if cfg.stress_rate_max > cfg.stress_rate_min {
            self.rng.gen_range(cfg.stress_rate_min..=cfg.stress_rate_max)
        } else {
            cfg.stress_rate_min
        };
        match speed {
            PlaybackSpeed::Native => stressed,
            PlaybackSpeed::Slow => stressed * cfg.stress_slow_fraction,
        }
    }

    /// Safety ceiling for a speed
    pub fn ceiling(&self, speed: PlaybackSpeed) -> Duration {
        millis_to_duration(match speed {
            PlaybackSpeed::Native => self.speech_config.native_timeout_ms,
            PlaybackSpeed::Slow => self.speech_config.slow_timeout_ms,
        })
    }

    /// Start a rendition of the task's answer
    ///
    /// Returns None while another rendition is in flight. Must be called
    /// inside a tokio runtime.
    pub fn render(&mut self, task: &Task, speed: PlaybackSpeed, stress: bool) -> Option<Rendition> {
        if let Some(id) = self.busy {
            debug!("Render dropped: rendition {} still in flight", id);
            return None;
        }

        let rate = self.select_rate(speed, stress);
        let text = utterance(task, self.speech_config.phone_one_as_yao);
        let ceiling = self.ceiling(speed);

        let spoken = if self.speech.is_available() {
            let request = SpeechRequest {
                text: text.clone(),
                locale: self.speech_config.locale.clone(),
                voice: self.voice.as_ref().map(|v| v.id.clone()),
                rate,
                pitch: self.speech_config.pitch,
            };
            match self.speech.speak(request) {
                Ok(completion) => Some(completion),
                Err(e) => {
                    debug!("Speech failed, falling back to silent playback: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let silent = spoken.is_none();
        let completion = match spoken {
            Some(completion) => completion,
            None => self.silent_completion(),
        };

        let id = self.next_id;
        self.next_id += 1;
        self.busy = Some(id);

        debug!(
            "Rendition {} started: {:?} at rate {:.2}{}",
            id,
            speed,
            rate,
            if silent { " (silent)" } else { "" }
        );

        Some(Rendition {
            id,
            speed,
            rate,
            text,
            ceiling,
            silent,
            completion,
        })
    }

    fn silent_completion(&self) -> SpeechCompletion {
        let (tx, rx) = oneshot::channel();
        let duration = millis_to_duration(self.speech_config.silent_playback_ms);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(SpeechOutcome::Ended);
        });
        rx
    }

    /// Clear the busy flag for a finished rendition
    ///
    /// Returns false for a rendition that is no longer current.
    pub fn finish(&mut self, id: u64) -> bool {
        if self.busy == Some(id) {
            self.busy = None;
            true
        } else {
            false
        }
    }

    /// Abort the in-flight rendition, if any
    pub fn cancel(&mut self) {
        if let Some(id) = self.busy.take() {
            debug!("Cancelling rendition {}", id);
            self.speech.cancel();
        }
    }

    /// Start or stop the ambient noise bed
    ///
    /// Idempotent both ways; stopping a bed that never started is a no-op.
    pub fn set_ambient(&mut self, enabled: bool) {
        if enabled {
            if self.ambient.is_some() {
                return;
            }
            let clip = self.ambient_clip();
            match self.sink.start_loop(clip, self.audio_config.ambient_gain) {
                Ok(id) => {
                    debug!("Ambient bed started");
                    self.ambient = Some(id);
                }
                Err(e) => debug!("Ambient bed unavailable: {}", e),
            }
        } else if let Some(id) = self.ambient.take() {
            match self.sink.stop_loop(id) {
                Ok(()) => debug!("Ambient bed stopped"),
                Err(e) => debug!("Failed to stop ambient bed: {}", e),
            }
        }
    }

    pub fn ambient_active(&self) -> bool {
        self.ambient.is_some()
    }

    fn ambient_clip(&mut self) -> Clip {
        if let Some(clip) = &self.ambient_clip {
            return clip.clone();
        }
        let spec = AmbientSpec {
            loop_ms: self.audio_config.ambient_loop_ms,
            cutoff_hz: self.audio_config.ambient_cutoff_hz,
            seam_ms: AMBIENT_SEAM_MS,
        };
        let clip = ambient_loop(&mut self.rng, spec, self.sink.sample_rate());
        self.ambient_clip = Some(clip.clone());
        clip
    }

    /// Cancel speech and stop the ambient bed
    pub fn shutdown(&mut self) {
        self.cancel();
        self.set_ambient(false);
    }
}

impl Drop for AudioRenderer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
