use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::view::{notice, status, ViewEvent, ViewSink};
use crate::audio::{AudioCaptureSession, Microphone};
use crate::error::CaptureError;
use crate::identity::SessionIdentity;
use crate::protocol::{InboundMessage, OutboundMessage};
use crate::transport::{ChannelState, Connector, TransportChannel, TransportConfig};

/// Record control state, mirroring the capture lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Idle,
    Recording,
}

/// Input from the user interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    SubmitText(String),
    ToggleRecording,
}

/// Multiplexes text and voice input onto one transport and renders replies.
///
/// Every user action yields at most one outbound frame; every inbound frame
/// yields a fixed sequence of view events.
pub struct SessionController {
    identity: SessionIdentity,
    config: SessionConfig,
    transport: TransportChannel,
    inbound_rx: mpsc::Receiver<String>,
    microphone: Arc<dyn Microphone>,
    capture: Option<AudioCaptureSession>,
    mode: UiMode,
    view: Arc<dyn ViewSink>,
}

enum Event {
    Action(Option<UserAction>),
    Frame(Option<String>),
}

impl SessionController {
    /// Create the controller and start connecting
    pub fn new(
        identity: SessionIdentity,
        config: SessionConfig,
        connector: Arc<dyn Connector>,
        microphone: Arc<dyn Microphone>,
        view: Arc<dyn ViewSink>,
    ) -> Self {
        info!("Creating conversation session: {}", identity);

        let (inbound_tx, inbound_rx) = mpsc::channel(64);
        let transport = TransportChannel::open(
            connector,
            TransportConfig {
                url: identity.endpoint(&config.server_url),
                reconnect_delay: config.reconnect_delay,
            },
            Arc::clone(&view),
            inbound_tx,
        );

        Self {
            identity,
            config,
            transport,
            inbound_rx,
            microphone,
            capture: None,
            mode: UiMode::Idle,
            view,
        }
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    pub fn transport(&self) -> &TransportChannel {
        &self.transport
    }

    pub fn transport_state(&self) -> ChannelState {
        self.transport.state()
    }

    /// Drive the session until the UI hangs up
    pub async fn run(mut self, mut actions: mpsc::Receiver<UserAction>) {
        info!("Session {} running", self.identity);

        loop {
            let event = tokio::select! {
                action = actions.recv() => Event::Action(action),
                frame = self.inbound_rx.recv() => Event::Frame(frame),
            };

            match event {
                Event::Action(Some(action)) => self.handle_action(action).await,
                Event::Frame(Some(frame)) => self.handle_frame(&frame),
                Event::Action(None) => {
                    info!("Input closed, ending session {}", self.identity);
                    break;
                }
                Event::Frame(None) => {
                    error!("Transport stopped delivering frames, ending session");
                    break;
                }
            }
        }

        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.stop().await {
                debug!("Discarding in-flight capture: {}", e);
            }
        }
        self.transport.shutdown();
    }

    pub async fn handle_action(&mut self, action: UserAction) {
        match action {
            UserAction::SubmitText(text) => {
                self.submit_text(&text);
            }
            UserAction::ToggleRecording => {
                if let Err(e) = self.toggle_recording().await {
                    warn!("Recording toggle failed: {}", e);
                }
            }
        }
    }

    /// Echo the text locally and send it as a chat frame.
    ///
    /// Returns false (and does nothing) for blank input.
    pub fn submit_text(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        self.render(ViewEvent::UserUtterance(text.to_string()));
        self.send(OutboundMessage::Chat {
            text: text.to_string(),
        });
        self.status(status::PROCESSING);
        true
    }

    /// Start recording when idle, stop and send when recording.
    ///
    /// Capture failures are shown to the user and also returned.
    pub async fn toggle_recording(&mut self) -> Result<(), CaptureError> {
        match self.mode {
            UiMode::Recording => self.stop_recording().await,
            UiMode::Idle => self.start_recording().await,
        }
    }

    async fn start_recording(&mut self) -> Result<(), CaptureError> {
        if self.capture.is_some() {
            warn!("A capture is already active, ignoring start");
            return Ok(());
        }

        let mut capture =
            AudioCaptureSession::new(Arc::clone(&self.microphone), self.config.capture.clone());

        match capture.start().await {
            Ok(()) => {
                self.capture = Some(capture);
                self.mode = UiMode::Recording;
                self.status(status::RECORDING);
                Ok(())
            }
            Err(e) => {
                error!("Error accessing microphone: {}", e);
                self.status(status::MICROPHONE_DENIED);
                self.render(ViewEvent::SystemNotice(notice::MICROPHONE_DENIED.to_string()));
                Err(e)
            }
        }
    }

    async fn stop_recording(&mut self) -> Result<(), CaptureError> {
        self.mode = UiMode::Idle;

        let mut capture = match self.capture.take() {
            Some(capture) => capture,
            None => return Ok(()),
        };

        self.status(status::PROCESSING_AUDIO);

        match capture.stop().await {
            Ok(Some(payload)) => {
                self.on_audio_finalized(payload);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                error!("Error sending audio: {}", e);
                self.status(status::AUDIO_SEND_FAILED);
                self.render(ViewEvent::SystemNotice(notice::AUDIO_SEND_FAILED.to_string()));
                Err(e)
            }
        }
    }

    /// Send a finalized WAV payload as a speech frame
    pub fn on_audio_finalized(&self, audio: Vec<u8>) {
        info!("Sending speech frame ({} bytes of audio)", audio.len());
        self.send(OutboundMessage::Speech {
            audio,
            language_code: self.config.speech.language_code.clone(),
            target_language_code: self.config.speech.target_language_code.clone(),
        });
    }

    /// Decode one raw frame and dispatch it; undecodable frames are logged
    /// and dropped
    pub fn handle_frame(&self, frame: &str) {
        match InboundMessage::decode(frame) {
            Ok(message) => self.on_inbound(message),
            Err(e) => warn!("Ignoring inbound frame: {}", e),
        }
    }

    pub fn on_inbound(&self, message: InboundMessage) {
        match message {
            InboundMessage::ChatReply { text } => {
                self.render(ViewEvent::AssistantUtterance(text));
            }
            InboundMessage::SpeechReply {
                transcript,
                reply_text,
                audio,
            } => {
                // Transcript before reply, both before playback
                self.render(ViewEvent::UserUtterance(transcript));
                self.render(ViewEvent::AssistantUtterance(reply_text));
                self.render(ViewEvent::PlayAudio(audio));
            }
            InboundMessage::Error { text } => {
                warn!("Backend reported error: {}", text);
                let text = format!("Error: {}", text);
                self.render(ViewEvent::StatusChanged(text.clone()));
                self.render(ViewEvent::SystemNotice(text));
            }
        }
    }

    /// Wait for the next inbound frame and dispatch it.
    ///
    /// Returns false once the transport has stopped.
    pub async fn handle_next_frame(&mut self) -> bool {
        match self.inbound_rx.recv().await {
            Some(frame) => {
                self.handle_frame(&frame);
                true
            }
            None => false,
        }
    }

    fn send(&self, message: OutboundMessage) {
        match message.encode() {
            Ok(frame) => {
                if !self.transport.send(frame) {
                    debug!("{} frame not transmitted", message.kind());
                }
            }
            Err(e) => error!("Failed to encode {} frame: {}", message.kind(), e),
        }
    }

    fn status(&self, text: &str) {
        self.render(ViewEvent::StatusChanged(text.to_string()));
    }

    fn render(&self, event: ViewEvent) {
        self.view.render(event);
    }
}
