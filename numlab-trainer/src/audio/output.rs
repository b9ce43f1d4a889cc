//! Audio output using cpal
//!
//! `DeviceSink` owns a cpal output stream whose callback pulls samples from a
//! shared software `Mixer`. Cues and the ambient bed are added to the mixer
//! from the control thread.

use super::mixer::Mixer;
use super::sink::{AudioSink, Clip, LoopId};
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Output device with a mixer-fed stream
pub struct DeviceSink {
    mixer: Arc<Mutex<Mixer>>,
    sample_rate: u32,
    /// Set by the stream error callback
    error_flag: Arc<AtomicBool>,
    _stream: Stream,
}

impl DeviceSink {
    /// List available audio output devices
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open an output device and start the mixer stream
    ///
    /// Falls back to the default device when the named one is not found.
    pub fn open(device_name: Option<&str>, preferred_rate: u32) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => {
                let mut devices = host
                    .output_devices()
                    .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

                match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                    Some(dev) => {
                        info!("Found requested audio device: {}", name);
                        dev
                    }
                    None => {
                        warn!("Requested device '{}' not found, falling back to default device", name);
                        host.default_output_device().ok_or_else(|| {
                            Error::AudioUnavailable(format!(
                                "Device '{}' not found and no default device available",
                                name
                            ))
                        })?
                    }
                }
            }
            None => host
                .default_output_device()
                .ok_or_else(|| Error::AudioUnavailable("No default output device found".to_string()))?,
        };

        let device_label = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let (config, sample_format) = Self::best_config(&device, preferred_rate)?;
        debug!(
            "Audio config: device={}, sample_rate={}, channels={}, format={:?}",
            device_label, config.sample_rate.0, config.channels, sample_format
        );

        let mixer = Arc::new(Mutex::new(Mixer::new()));
        let error_flag = Arc::new(AtomicBool::new(false));

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, &mixer, &error_flag)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, &mixer, &error_flag)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, &mixer, &error_flag)?,
            other => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    other
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        info!("Audio output started on {} at {} Hz", device_label, config.sample_rate.0);

        Ok(Self {
            mixer,
            sample_rate: config.sample_rate.0,
            error_flag,
            _stream: stream,
        })
    }

    /// Pick a config at the preferred rate, otherwise the device default
    fn best_config(device: &Device, preferred_rate: u32) -> Result<(StreamConfig, SampleFormat)> {
        let mut supported_configs = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

        let preferred = supported_configs.find(|config| {
            config.min_sample_rate().0 <= preferred_rate
                && config.max_sample_rate().0 >= preferred_rate
                && config.sample_format() == SampleFormat::F32
        });

        if let Some(supported_config) = preferred {
            let sample_format = supported_config.sample_format();
            let config = supported_config
                .with_sample_rate(cpal::SampleRate(preferred_rate))
                .config();
            return Ok((config, sample_format));
        }

        let supported_config = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;

        let sample_format = supported_config.sample_format();
        Ok((supported_config.config(), sample_format))
    }

    fn mixer(&self) -> Result<MutexGuard<'_, Mixer>> {
        if self.error_flag.load(Ordering::SeqCst) {
            return Err(Error::AudioOutput("Output stream reported an error".to_string()));
        }
        self.mixer
            .lock()
            .map_err(|_| Error::AudioOutput("Mixer lock poisoned".to_string()))
    }
}

impl AudioSink for DeviceSink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&self, clip: Clip, gain: f32) -> Result<()> {
        self.mixer()?.play_once(clip, gain);
        Ok(())
    }

    fn start_loop(&self, clip: Clip, gain: f32) -> Result<LoopId> {
        Ok(self.mixer()?.start_loop(clip, gain))
    }

    fn stop_loop(&self, id: LoopId) -> Result<()> {
        // Stopping must work even after a stream error
        if let Ok(mut mixer) = self.mixer.lock() {
            mixer.stop_loop(id);
        }
        Ok(())
    }
}

/// Build an output stream for one device sample format
fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mixer: &Arc<Mutex<Mixer>>,
    error_flag: &Arc<AtomicBool>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mixer = Arc::clone(mixer);
    let error_flag = Arc::clone(error_flag);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                match mixer.lock() {
                    Ok(mut mixer) => mixer.fill(data, channels),
                    Err(_) => data.fill(T::EQUILIBRIUM),
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
                error_flag.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
}
