use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::CaptureConfig;
use crate::session::{SessionConfig, SpeechConfig};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub transport: TransportSettings,
    pub speech: SpeechSettings,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TransportSettings {
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct SpeechSettings {
    pub language_code: String,
    pub target_language_code: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub fragment_ms: u64,
    pub playback_dir: String,
}

impl Config {
    /// Load defaults, then the optional file at `path`, then `VOICE_CHAT__*`
    /// environment overrides (e.g. `VOICE_CHAT__SERVER__URL`)
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("server.url", "ws://127.0.0.1:8000")?
            .set_default("transport.reconnect_delay_ms", 3000)?
            .set_default("speech.language_code", "en-IN")?
            .set_default("speech.target_language_code", "en-IN")?
            .set_default("audio.sample_rate", 16000)?
            .set_default("audio.channels", 1)?
            .set_default("audio.fragment_ms", 100)?
            .set_default("audio.playback_dir", "replies")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VOICE_CHAT").separator("__"))
            .build()
            .with_context(|| format!("Failed to load configuration from {}", path))?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.audio.fragment_ms > 0, "audio.fragment_ms must be greater than 0");
        ensure!(self.audio.sample_rate > 0, "audio.sample_rate must be greater than 0");
        ensure!(self.audio.channels > 0, "audio.channels must be greater than 0");
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            server_url: self.server.url.clone(),
            reconnect_delay: Duration::from_millis(self.transport.reconnect_delay_ms),
            speech: SpeechConfig {
                language_code: self.speech.language_code.clone(),
                target_language_code: self.speech.target_language_code.clone(),
            },
            capture: CaptureConfig {
                sample_rate: self.audio.sample_rate,
                channels: self.audio.channels,
                fragment_ms: self.audio.fragment_ms,
            },
        }
    }

    pub fn playback_dir(&self) -> PathBuf {
        PathBuf::from(&self.audio.playback_dir)
    }
}
