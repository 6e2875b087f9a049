pub mod audio;
pub mod config;
pub mod console;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod session;
pub mod transport;

pub use audio::{
    AudioCaptureSession, AudioFile, AudioFragment, CaptureConfig, CaptureDevice, CaptureState,
    FileMicrophone, Microphone, UnavailableMicrophone,
};
pub use config::Config;
pub use console::ConsoleView;
pub use error::{CaptureError, ProtocolError, TransportError};
pub use identity::SessionIdentity;
pub use protocol::{InboundMessage, OutboundMessage};
pub use session::{SessionConfig, SessionController, SpeechConfig, UiMode, UserAction, ViewEvent, ViewSink};
pub use transport::{ChannelState, TransportChannel, TransportConfig, WsConnector};
