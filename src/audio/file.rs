use anyhow::{Context, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::device::{AudioFragment, CaptureConfig, CaptureDevice, Microphone};
use crate::error::CaptureError;

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 /
            (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Split the file into fragments of `fragment_ms` each
    pub fn fragments(&self, fragment_ms: u64) -> Vec<AudioFragment> {
        let per_fragment = (self.sample_rate as u64 * fragment_ms / 1000) as usize
            * self.channels as usize;
        let per_fragment = per_fragment.max(self.channels as usize).max(1);

        self.samples
            .chunks(per_fragment)
            .enumerate()
            .map(|(i, chunk)| AudioFragment {
                samples: chunk.to_vec(),
                sample_rate: self.sample_rate,
                channels: self.channels,
                timestamp_ms: i as u64 * fragment_ms,
            })
            .collect()
    }
}

/// Microphone that "speaks" a WAV file in real time
///
/// Used by the terminal front end when no hardware capture is wired in, and
/// handy for scripted sessions against a live backend.
pub struct FileMicrophone {
    path: PathBuf,
}

impl FileMicrophone {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Microphone for FileMicrophone {
    async fn request_access(
        &self,
        config: &CaptureConfig,
    ) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        let path = self.path.clone();
        let audio = tokio::task::spawn_blocking(move || AudioFile::open(path))
            .await
            .map_err(|e| CaptureError::DeviceError(format!("Audio file loader failed: {}", e)))?
            .map_err(|e| CaptureError::DeviceError(format!("{:#}", e)))?;

        if audio.sample_rate != config.sample_rate || audio.channels != config.channels {
            warn!(
                "{} is {}Hz/{}ch, capture requested {}Hz/{}ch; sending as-is",
                audio.path, audio.sample_rate, audio.channels, config.sample_rate, config.channels
            );
        }

        Ok(Box::new(FileCaptureDevice {
            fragments: audio.fragments(config.fragment_ms),
            fragment_ms: config.fragment_ms,
            sender: Arc::new(Mutex::new(None)),
            pump: None,
        }))
    }

    fn name(&self) -> &str {
        "file"
    }
}

struct FileCaptureDevice {
    fragments: Vec<AudioFragment>,
    fragment_ms: u64,
    /// The only long-lived sender; the pump borrows a clone per fragment
    sender: Arc<Mutex<Option<mpsc::Sender<AudioFragment>>>>,
    pump: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl CaptureDevice for FileCaptureDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFragment>, CaptureError> {
        if self.pump.is_some() {
            return Err(CaptureError::DeviceError("Already capturing".to_string()));
        }

        let (tx, rx) = mpsc::channel(32);
        if let Ok(mut slot) = self.sender.lock() {
            *slot = Some(tx);
        }

        let fragments = std::mem::take(&mut self.fragments);
        let mut ticker = tokio::time::interval(Duration::from_millis(self.fragment_ms.max(1)));
        let sender = Arc::clone(&self.sender);

        self.pump = Some(tokio::spawn(async move {
            for fragment in fragments {
                ticker.tick().await;
                let tx = match sender.lock().ok().and_then(|slot| slot.clone()) {
                    Some(tx) => tx,
                    None => return,
                };
                if tx.send(fragment).await.is_err() {
                    return;
                }
            }
            info!("Audio file exhausted, waiting for stop");
        }));

        Ok(rx)
    }

    fn release(&mut self) {
        if let Ok(mut slot) = self.sender.lock() {
            slot.take();
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl Drop for FileCaptureDevice {
    fn drop(&mut self) {
        self.release();
    }
}
