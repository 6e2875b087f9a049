use tokio::sync::mpsc;
use tracing::debug;

/// Everything the session core tells the rendering layer. The core never
/// reads view state back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    UserUtterance(String),
    AssistantUtterance(String),
    SystemNotice(String),
    StatusChanged(String),
    /// WAV audio to play back
    PlayAudio(Vec<u8>),
}

/// Status line texts
pub mod status {
    pub const CONNECTED: &str = "Connected";
    pub const RECONNECTING: &str = "Disconnected. Reconnecting…";
    pub const CONNECTION_ERROR: &str = "Connection error";
    pub const PROCESSING: &str = "Processing…";
    pub const RECORDING: &str = "Recording…";
    pub const PROCESSING_AUDIO: &str = "Processing audio…";
    pub const MICROPHONE_DENIED: &str = "Microphone access denied";
    pub const AUDIO_SEND_FAILED: &str = "Error sending audio";
}

/// Notice texts shown as system bubbles
pub mod notice {
    pub const MICROPHONE_DENIED: &str = "Could not access microphone. Please check permissions.";
    pub const AUDIO_SEND_FAILED: &str = "Error sending audio. Please try again.";
}

/// Rendering collaborator
pub trait ViewSink: Send + Sync {
    fn render(&self, event: ViewEvent);
}

/// Forward events to whoever holds the receiver (a UI task, or a test)
impl ViewSink for mpsc::UnboundedSender<ViewEvent> {
    fn render(&self, event: ViewEvent) {
        if self.send(event).is_err() {
            debug!("View receiver dropped, discarding event");
        }
    }
}
