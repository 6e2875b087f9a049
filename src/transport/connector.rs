use crate::error::TransportError;

/// Establishes socket connections to an endpoint
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, TransportError>;
}

/// One live socket handle carrying text frames
#[async_trait::async_trait]
pub trait Connection: Send {
    /// Send one text frame
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Next inbound text frame. `None` means the peer closed the connection.
    ///
    /// Must be cancel-safe: the driver races it against outbound sends.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Close the socket. Errors are swallowed; the handle is discarded after.
    async fn close(&mut self);
}
