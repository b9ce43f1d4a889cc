//! Configuration loading and config file resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. `<config_dir>/numlab/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not an error. An unreadable or malformed file is.

use crate::events::TaskKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "NUMLAB_CONFIG";

/// Top-level trainer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub session: SessionConfig,
    pub speech: SpeechConfig,
    pub audio: AudioConfig,
    pub storage: StorageConfig,
    /// tracing EnvFilter directive used when RUST_LOG is unset
    pub log_level: String,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            speech: SpeechConfig::default(),
            audio: AudioConfig::default(),
            storage: StorageConfig::default(),
            log_level: "numlab_trainer=info,numlab_common=info".to_string(),
        }
    }
}

/// Challenge lifecycle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Load the next task automatically after a correct answer
    pub auto_advance: bool,
    pub auto_advance_delay_ms: u64,
    /// Pin the session to a single task kind (None = uniform over all kinds)
    pub kind: Option<TaskKind>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_advance: true,
            auto_advance_delay_ms: 1500,
            kind: None,
        }
    }
}

/// Speech rendition settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Target locale for voice selection
    pub locale: String,
    /// Fixed rate multiplier for native speed
    pub native_rate: f32,
    /// Fixed rate multiplier for slow speed
    pub slow_rate: f32,
    /// Lower bound of the randomized stress-mode rate
    pub stress_rate_min: f32,
    /// Upper bound of the randomized stress-mode rate
    pub stress_rate_max: f32,
    /// Slow speed under stress = this fraction of the randomized rate
    pub stress_slow_fraction: f32,
    pub pitch: f32,
    /// Safety ceiling for a native-speed rendition
    pub native_timeout_ms: u64,
    /// Safety ceiling for a slow-speed rendition
    pub slow_timeout_ms: u64,
    /// Duration of the silent stand-in when no speech engine is available
    pub silent_playback_ms: u64,
    /// Read the digit 1 as 幺 in phone numbers
    pub phone_one_as_yao: bool,
    /// espeak-ng executable name or path
    pub espeak_binary: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "zh-CN".to_string(),
            native_rate: 1.2,
            slow_rate: 0.6,
            stress_rate_min: 1.3,
            stress_rate_max: 1.7,
            stress_slow_fraction: 0.5,
            pitch: 1.0,
            native_timeout_ms: 8_000,
            slow_timeout_ms: 15_000,
            silent_playback_ms: 3_000,
            phone_one_as_yao: false,
            espeak_binary: "espeak-ng".to_string(),
        }
    }
}

/// Tone/noise output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Open an output device at all
    pub enabled: bool,
    /// Output device name (None = default device)
    pub device: Option<String>,
    pub sample_rate: u32,
    /// Gain of the stress-mode ambient noise bed
    pub ambient_gain: f32,
    /// Low-pass cutoff of the ambient noise bed
    pub ambient_cutoff_hz: f32,
    /// Length of the looped noise buffer
    pub ambient_loop_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device: None,
            sample_rate: 44_100,
            ambient_gain: 0.04,
            ambient_cutoff_hz: 1_000.0,
            ambient_loop_ms: 2_000,
        }
    }
}

/// Score persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_data_dir().join("numlab.db"),
        }
    }
}

impl LabConfig {
    /// Resolve and load the configuration
    ///
    /// Falls back to compiled defaults when no config file exists.
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg, CONFIG_ENV_VAR) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            None => {
                debug!("No config file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a specific config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: LabConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the renderer and session cannot work with
    pub fn validate(&self) -> Result<()> {
        let speech = &self.speech;
        for (name, rate) in [
            ("native_rate", speech.native_rate),
            ("slow_rate", speech.slow_rate),
            ("stress_rate_min", speech.stress_rate_min),
            ("stress_rate_max", speech.stress_rate_max),
            ("pitch", speech.pitch),
        ] {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(Error::Config(format!(
                    "speech.{} must be positive, got {}",
                    name, rate
                )));
            }
        }
        if speech.native_rate <= 1.0 {
            return Err(Error::Config(format!(
                "speech.native_rate must be above 1.0, got {}",
                speech.native_rate
            )));
        }
        if speech.slow_rate >= 1.0 {
            return Err(Error::Config(format!(
                "speech.slow_rate must be below 1.0, got {}",
                speech.slow_rate
            )));
        }
        if speech.slow_timeout_ms <= speech.native_timeout_ms {
            return Err(Error::Config(format!(
                "speech.slow_timeout_ms ({}) must exceed native_timeout_ms ({})",
                speech.slow_timeout_ms, speech.native_timeout_ms
            )));
        }
        if speech.stress_rate_min > speech.stress_rate_max {
            return Err(Error::Config(format!(
                "speech.stress_rate_min ({}) exceeds stress_rate_max ({})",
                speech.stress_rate_min, speech.stress_rate_max
            )));
        }
        if !(speech.stress_slow_fraction > 0.0 && speech.stress_slow_fraction <= 1.0) {
            return Err(Error::Config(format!(
                "speech.stress_slow_fraction must be in (0, 1], got {}",
                speech.stress_slow_fraction
            )));
        }
        if speech.locale.trim().is_empty() {
            return Err(Error::Config("speech.locale must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.audio.ambient_gain) {
            return Err(Error::Config(format!(
                "audio.ambient_gain must be in [0, 1], got {}",
                self.audio.ambient_gain
            )));
        }
        if self.audio.sample_rate == 0 {
            return Err(Error::Config("audio.sample_rate must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Resolve the config file path
///
/// Returns None when neither an explicit path nor the per-user file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file
    default_config_file().filter(|path| path.exists())
}

/// Platform config file location (`~/.config/numlab/config.toml` on Linux)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("numlab").join("config.toml"))
}

/// OS-dependent data folder for the score database
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("numlab"))
        .unwrap_or_else(|| PathBuf::from("./numlab_data"))
}
