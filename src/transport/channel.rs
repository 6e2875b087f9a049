use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::connector::{Connection, Connector};
use super::machine::{ChannelMachine, ChannelState};
use crate::error::TransportError;
use crate::session::view::{status, ViewEvent, ViewSink};

/// Configuration for a transport channel
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Full endpoint URL, e.g. `ws://host:8000/ws/<identity>`
    pub url: String,

    /// Fixed delay between a loss and the next connect attempt
    /// Default: 3 seconds
    pub reconnect_delay: Duration,
}

impl TransportConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: Duration::from_secs(3),
        }
    }
}

/// Persistent, self-healing connection to one endpoint.
///
/// A driver task owns the socket and runs the connect/pump/reconnect loop
/// forever; this handle only observes its state and submits frames. Inbound
/// frames are forwarded verbatim to the session layer, which decodes them.
pub struct TransportChannel {
    url: String,
    state_rx: watch::Receiver<ChannelState>,
    outbound_tx: mpsc::UnboundedSender<String>,
    driver: JoinHandle<()>,
}

impl TransportChannel {
    /// Start connecting and keep the connection alive until shutdown
    pub fn open(
        connector: Arc<dyn Connector>,
        config: TransportConfig,
        view: Arc<dyn ViewSink>,
        inbound_tx: mpsc::Sender<String>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ChannelState::Closed);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            connector,
            url: config.url.clone(),
            machine: ChannelMachine::new(config.reconnect_delay),
            state_tx,
            view,
            inbound_tx,
            outbound_rx,
        };

        info!("Opening transport channel to {}", config.url);

        Self {
            url: config.url,
            state_rx,
            outbound_tx,
            driver: tokio::spawn(driver.run()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Watch state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Submit a frame for transmission.
    ///
    /// Frames are only accepted while `Open`; otherwise they are dropped and
    /// `false` is returned. Never blocks. Acceptance is not delivery: a frame
    /// in flight when the socket dies is lost.
    pub fn send(&self, frame: String) -> bool {
        let state = self.state();
        if state != ChannelState::Open {
            warn!("Transport is {:?}, dropping outbound frame ({} bytes)", state, frame.len());
            return false;
        }

        if self.outbound_tx.send(frame).is_err() {
            error!("Transport driver is gone, dropping outbound frame");
            return false;
        }
        true
    }

    /// Stop the driver and drop the socket
    pub fn shutdown(self) {
        info!("Shutting down transport channel to {}", self.url);
        // Drop does the work
    }
}

impl Drop for TransportChannel {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

enum Step {
    Inbound(Option<Result<String, TransportError>>),
    Outbound(Option<String>),
}

struct Driver {
    connector: Arc<dyn Connector>,
    url: String,
    machine: ChannelMachine,
    state_tx: watch::Sender<ChannelState>,
    view: Arc<dyn ViewSink>,
    inbound_tx: mpsc::Sender<String>,
    outbound_rx: mpsc::UnboundedReceiver<String>,
}

impl Driver {
    async fn run(mut self) {
        loop {
            self.machine.open();
            self.publish();

            info!(
                "Connecting to {} (attempt {})",
                self.url,
                self.machine.connect_attempts()
            );

            let cause = match self.connector.connect(&self.url).await {
                Ok(conn) => {
                    self.machine.connected();
                    self.publish();
                    self.view.render(ViewEvent::StatusChanged(status::CONNECTED.to_string()));
                    info!("Connected to {}", self.url);

                    self.discard_stale_frames();

                    match self.pump(conn).await {
                        Some(cause) => cause,
                        None => {
                            info!("Session layer gone, transport driver exiting");
                            return;
                        }
                    }
                }
                Err(e) => e,
            };

            let delay = self.lost(cause);
            tokio::time::sleep(delay).await;
        }
    }

    /// Move frames between the socket and the session until the socket dies.
    ///
    /// Returns the cause of the loss, or `None` if the session side hung up.
    /// The socket is closed before returning.
    async fn pump(&mut self, mut conn: Box<dyn Connection>) -> Option<TransportError> {
        let cause = loop {
            let step = tokio::select! {
                inbound = conn.recv() => Step::Inbound(inbound),
                outbound = self.outbound_rx.recv() => Step::Outbound(outbound),
            };

            match step {
                Step::Inbound(Some(Ok(frame))) => {
                    debug!("Received frame ({} bytes)", frame.len());
                    if self.inbound_tx.send(frame).await.is_err() {
                        break None;
                    }
                }
                Step::Inbound(Some(Err(e))) => break Some(e),
                Step::Inbound(None) => break Some(TransportError::UnexpectedClose),
                Step::Outbound(Some(frame)) => {
                    debug!("Sending frame ({} bytes)", frame.len());
                    if let Err(e) = conn.send(frame).await {
                        break Some(e);
                    }
                }
                Step::Outbound(None) => break None,
            }
        };

        conn.close().await;
        cause
    }

    fn lost(&mut self, cause: TransportError) -> Duration {
        warn!("Connection to {} lost: {}", self.url, cause);

        if matches!(cause, TransportError::SocketError(_)) {
            self.view
                .render(ViewEvent::StatusChanged(status::CONNECTION_ERROR.to_string()));
        }

        let delay = self
            .machine
            .lost(&cause)
            .unwrap_or_else(|| self.machine.reconnect_delay());
        self.publish();
        self.view.render(ViewEvent::StatusChanged(status::RECONNECTING.to_string()));

        info!("Reconnecting to {} in {:?}", self.url, delay);
        delay
    }

    /// Frames submitted in the window between a loss and `send` noticing it
    /// must not leak onto the next connection
    fn discard_stale_frames(&mut self) {
        let mut dropped = 0;
        while self.outbound_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            warn!("Discarded {} frames queued before reconnect", dropped);
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.machine.state());
    }
}
