use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::device::{AudioFragment, CaptureConfig, CaptureDevice, Microphone};
use super::encoder::encode_wav;
use crate::error::CaptureError;

/// Lifecycle of a single capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
    Finalizing,
}

/// Captures one bounded utterance and hands it back as a WAV payload.
///
/// A session is built per recording and dropped once its payload has been
/// delivered. Fragments are collected by a background task in arrival order
/// and only while recording: once `stop` draws the line, the stream is closed
/// and whatever the device sends afterwards is refused.
pub struct AudioCaptureSession {
    microphone: Arc<dyn Microphone>,
    config: CaptureConfig,
    state: CaptureState,
    device: Option<Box<dyn CaptureDevice>>,
    collector: Option<JoinHandle<Vec<AudioFragment>>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl AudioCaptureSession {
    pub fn new(microphone: Arc<dyn Microphone>, config: CaptureConfig) -> Self {
        Self {
            microphone,
            config,
            state: CaptureState::Idle,
            device: None,
            collector: None,
            stop_tx: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Request the microphone and begin buffering.
    ///
    /// On denial the session stays `Idle` and the error is returned to the
    /// caller; nothing is retried. Calling this while already recording is
    /// ignored.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Idle {
            warn!("Capture already in progress ({:?}), ignoring start", self.state);
            return Ok(());
        }

        info!("Requesting microphone access ({})", self.microphone.name());

        let mut device = self.microphone.request_access(&self.config).await?;

        let mut fragment_rx = match device.start().await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Failed to start capture: {}", e);
                device.release();
                return Err(e);
            }
        };

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        self.collector = Some(tokio::spawn(async move {
            let mut fragments = Vec::new();
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    fragment = fragment_rx.recv() => match fragment {
                        Some(fragment) => fragments.push(fragment),
                        None => return fragments,
                    },
                }
            }

            // Keep what was already buffered, refuse anything newer
            fragment_rx.close();
            while let Some(fragment) = fragment_rx.recv().await {
                fragments.push(fragment);
            }
            fragments
        }));
        self.stop_tx = Some(stop_tx);
        self.device = Some(device);
        self.state = CaptureState::Recording;

        info!(
            "Recording started ({}Hz, {} channels)",
            self.config.sample_rate, self.config.channels
        );

        Ok(())
    }

    /// Stop recording and finalize the utterance.
    ///
    /// Returns `Ok(None)` when not recording. Otherwise releases the device,
    /// joins the collected fragments into one WAV payload and returns to
    /// `Idle`, whether or not finalization succeeded.
    pub async fn stop(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
        if self.state != CaptureState::Recording {
            debug!("Stop requested while {:?}, nothing to do", self.state);
            return Ok(None);
        }

        self.state = CaptureState::Finalizing;
        self.release_device();
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        let fragments = match self.collector.take() {
            Some(collector) => collector
                .await
                .map_err(|e| CaptureError::DeviceError(format!("Fragment collector failed: {}", e))),
            None => Ok(Vec::new()),
        };

        let payload = fragments.and_then(|fragments| {
            let sample_count: usize = fragments.iter().map(|f| f.samples.len()).sum();
            info!(
                "Finalizing capture: {} fragments, {} samples",
                fragments.len(),
                sample_count
            );
            encode_wav(&fragments)
        });

        self.state = CaptureState::Idle;

        match payload {
            Ok(bytes) => {
                info!("Capture finalized ({} bytes)", bytes.len());
                Ok(Some(bytes))
            }
            Err(e) => {
                warn!("Capture finalization failed: {}", e);
                Err(e)
            }
        }
    }

    fn release_device(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.release();
            debug!("Microphone released");
        }
    }
}

impl Drop for AudioCaptureSession {
    fn drop(&mut self) {
        self.release_device();
        if let Some(collector) = self.collector.take() {
            collector.abort();
        }
    }
}
