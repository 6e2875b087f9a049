//! Conversation session management
//!
//! This module provides the `SessionController` that:
//! - Turns typed text and recorded speech into protocol frames
//! - Owns the transport channel and the active audio capture, if any
//! - Interprets inbound frames and drives the view layer through `ViewEvent`s

mod config;
mod controller;
pub mod view;

pub use config::{SessionConfig, SpeechConfig};
pub use controller::{SessionController, UiMode, UserAction};
pub use view::{ViewEvent, ViewSink};
