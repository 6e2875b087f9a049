use crate::error::CaptureError;
use tokio::sync::mpsc;

/// One chunk of captured audio (16-bit PCM, interleaved)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFragment {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since recording started
    pub timestamp_ms: u64,
}

impl AudioFragment {
    /// Little-endian PCM bytes of this fragment
    pub fn pcm_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}

/// Capture format requested from the microphone
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate
    pub sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Fragment size in milliseconds
    pub fragment_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz speech
            channels: 1,        // Mono
            fragment_ms: 100,   // 100ms fragments
        }
    }
}

/// Microphone-access provider
///
/// Implementations:
/// - `FileMicrophone`: replays a WAV file as if it were spoken into a mic
/// - test doubles that grant or deny access on demand
#[async_trait::async_trait]
pub trait Microphone: Send + Sync {
    /// Ask for access to the device.
    ///
    /// A refusal must be reported as `CaptureError::PermissionDenied`.
    async fn request_access(
        &self,
        config: &CaptureConfig,
    ) -> Result<Box<dyn CaptureDevice>, CaptureError>;

    /// Get microphone name for logging
    fn name(&self) -> &str;
}

/// A granted microphone handle
#[async_trait::async_trait]
pub trait CaptureDevice: Send {
    /// Start capturing audio
    ///
    /// Returns a receiver yielding fragments in arrival order. The sequence is
    /// finite and cannot be restarted: it ends when the device is released or
    /// the source runs dry.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFragment>, CaptureError>;

    /// Stop capturing and give the device back.
    ///
    /// After this returns the fragment sender must be dropped so the receiver
    /// drains and terminates.
    fn release(&mut self);
}

/// Stand-in when no capture source is configured: every request is refused
#[derive(Debug, Default, Clone)]
pub struct UnavailableMicrophone;

#[async_trait::async_trait]
impl Microphone for UnavailableMicrophone {
    async fn request_access(
        &self,
        _config: &CaptureConfig,
    ) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        Err(CaptureError::PermissionDenied)
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
