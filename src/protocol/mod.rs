//! Wire protocol between the client and the conversational backend
//!
//! One JSON text frame per message, tagged by its `type` field. Audio travels
//! as a base64-encoded WAV container in both directions.

pub mod messages;

pub use messages::{InboundMessage, OutboundMessage};
