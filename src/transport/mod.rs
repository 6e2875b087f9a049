//! Reconnecting transport to the conversational backend
//!
//! - `machine`: the Connecting/Open/Closed state machine
//! - `channel`: the driver task that owns the socket and reconnects on loss
//! - `connector`: socket seam, so tests can script connections
//! - `ws`: the tokio-tungstenite implementation

pub mod channel;
pub mod connector;
pub mod machine;
pub mod ws;

pub use channel::{TransportChannel, TransportConfig};
pub use connector::{Connection, Connector};
pub use machine::{ChannelMachine, ChannelState};
pub use ws::WsConnector;
