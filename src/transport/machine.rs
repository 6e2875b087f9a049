use std::time::Duration;
use tracing::debug;

use crate::error::TransportError;

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// Pure Connecting/Open/Closed state machine.
///
/// Knows nothing about sockets or timers; the driver feeds it lifecycle events
/// and acts on what it returns.
#[derive(Debug)]
pub struct ChannelMachine {
    state: ChannelState,
    reconnect_delay: Duration,
    connect_attempts: u64,
}

impl ChannelMachine {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ChannelState::Closed,
            reconnect_delay,
            connect_attempts: 0,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts
    }

    /// `Closed -> Connecting`. Returns false (and does nothing) from any other state.
    pub fn open(&mut self) -> bool {
        if self.state != ChannelState::Closed {
            return false;
        }
        self.state = ChannelState::Connecting;
        self.connect_attempts += 1;
        true
    }

    /// `Connecting -> Open`
    pub fn connected(&mut self) -> bool {
        if self.state != ChannelState::Connecting {
            return false;
        }
        self.state = ChannelState::Open;
        true
    }

    /// Connect failure, unexpected close or socket error.
    ///
    /// Moves to `Closed` and returns the delay before the single retry. Returns
    /// `None` if already closed, so a loss is never scheduled twice.
    pub fn lost(&mut self, cause: &TransportError) -> Option<Duration> {
        if self.state == ChannelState::Closed {
            debug!("Ignoring {} while already closed", cause);
            return None;
        }
        self.state = ChannelState::Closed;
        Some(self.reconnect_delay)
    }
}
