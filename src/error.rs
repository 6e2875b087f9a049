use thiserror::Error;

/// Connection-level failures. None of these are fatal: every variant moves the
/// transport to `Closed` and schedules a reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to connect: {0}")]
    ConnectFailed(String),

    #[error("connection closed unexpectedly")]
    UnexpectedClose,

    #[error("socket error: {0}")]
    SocketError(String),
}

/// Microphone capture failures, surfaced to the user and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no audio was captured")]
    EmptyCapture,

    #[error("audio device error: {0}")]
    DeviceError(String),
}

/// Inbound frames that cannot be turned into an `InboundMessage`.
/// Logged and dropped; the channel stays open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("unknown message type: {0}")]
    UnknownType(String),
}
