// Test doubles shared by the integration tests
//
// - ScriptedConnector: accepts or rejects connect attempts from a script and
//   hands the server side of each accepted connection to the test
// - FakeMicrophone: grants or denies access and replays fixed fragments
// - LateMicrophone: a device that keeps sending after it is released
// - view(): a ViewSink whose events the test can drain

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{timeout, Instant};
use voice_chat_client::audio::{AudioFragment, CaptureConfig, CaptureDevice, Microphone};
use voice_chat_client::transport::{ChannelState, Connection, Connector};
use voice_chat_client::{CaptureError, TransportError, ViewEvent, ViewSink};

pub const WAIT: Duration = Duration::from_secs(600);

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Accept,
    Reject,
}

pub struct ScriptedConnector {
    script: Mutex<VecDeque<Attempt>>,
    attempts: Mutex<Vec<(Instant, String)>>,
    servers: mpsc::UnboundedSender<ServerEnd>,
}

impl ScriptedConnector {
    /// Attempts beyond the end of the script are rejected
    pub fn new(script: &[Attempt]) -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (servers, server_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            script: Mutex::new(script.iter().copied().collect()),
            attempts: Mutex::new(Vec::new()),
            servers,
        });
        (connector, server_rx)
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn attempt_urls(&self) -> Vec<String> {
        self.attempts.lock().unwrap().iter().map(|(_, u)| u.clone()).collect()
    }
}

#[async_trait::async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, TransportError> {
        self.attempts
            .lock()
            .unwrap()
            .push((Instant::now(), url.to_string()));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Attempt::Accept) => {
                let (to_client, inbound) = mpsc::unbounded_channel();
                let (outbound, from_client) = mpsc::unbounded_channel();
                if self
                    .servers
                    .send(ServerEnd {
                        to_client,
                        from_client,
                    })
                    .is_err()
                {
                    panic!("connection accepted but the test no longer holds the server receiver");
                }
                Ok(Box::new(FakeConnection { inbound, outbound }))
            }
            _ => Err(TransportError::ConnectFailed("connection refused".to_string())),
        }
    }
}

struct FakeConnection {
    inbound: mpsc::UnboundedReceiver<Result<String, TransportError>>,
    outbound: mpsc::UnboundedSender<String>,
}

#[async_trait::async_trait]
impl Connection for FakeConnection {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::SocketError("peer gone".to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        self.inbound.recv().await
    }

    async fn close(&mut self) {}
}

/// Server side of one accepted fake connection. Dropping it closes the
/// connection from the server side.
pub struct ServerEnd {
    pub to_client: mpsc::UnboundedSender<Result<String, TransportError>>,
    pub from_client: mpsc::UnboundedReceiver<String>,
}

impl ServerEnd {
    pub fn push(&self, frame: &str) {
        self.to_client.send(Ok(frame.to_string())).unwrap();
    }

    pub fn fail(&self, reason: &str) {
        self.to_client
            .send(Err(TransportError::SocketError(reason.to_string())))
            .unwrap();
    }

    pub async fn next_frame(&mut self) -> String {
        timeout(WAIT, self.from_client.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("client connection closed")
    }

    pub async fn next_json(&mut self) -> serde_json::Value {
        serde_json::from_str(&self.next_frame().await).unwrap()
    }
}

pub async fn next_server(servers: &mut mpsc::UnboundedReceiver<ServerEnd>) -> ServerEnd {
    timeout(WAIT, servers.recv())
        .await
        .expect("timed out waiting for a connection")
        .expect("connector dropped")
}

pub async fn wait_for_state(mut rx: watch::Receiver<ChannelState>, state: ChannelState) {
    timeout(WAIT, rx.wait_for(|s| *s == state))
        .await
        .expect("timed out waiting for channel state")
        .expect("transport driver gone");
}

/// Wait until the view shows `event`, skipping anything before it
pub async fn wait_for_event(rx: &mut mpsc::UnboundedReceiver<ViewEvent>, event: ViewEvent) {
    timeout(WAIT, async {
        while let Some(seen) = rx.recv().await {
            if seen == event {
                return;
            }
        }
        panic!("view closed before {:?}", event);
    })
    .await
    .expect("timed out waiting for a view event");
}

/// Let spawned tasks run without moving the clock
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

// ============================================================================
// Microphone
// ============================================================================

pub struct FakeMicrophone {
    grant: bool,
    fragments: Vec<AudioFragment>,
    pub requests: AtomicUsize,
    pub releases: Arc<AtomicUsize>,
}

impl FakeMicrophone {
    pub fn granting(fragments: Vec<Vec<i16>>) -> Arc<Self> {
        Arc::new(Self {
            grant: true,
            fragments: fragments
                .into_iter()
                .enumerate()
                .map(|(i, samples)| fragment(samples, i as u64 * 100))
                .collect(),
            requests: AtomicUsize::new(0),
            releases: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn denying() -> Arc<Self> {
        Arc::new(Self {
            grant: false,
            fragments: Vec::new(),
            requests: AtomicUsize::new(0),
            releases: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

pub fn fragment(samples: Vec<i16>, timestamp_ms: u64) -> AudioFragment {
    AudioFragment {
        samples,
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}

#[async_trait::async_trait]
impl Microphone for FakeMicrophone {
    async fn request_access(
        &self,
        _config: &CaptureConfig,
    ) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.grant {
            return Err(CaptureError::PermissionDenied);
        }
        Ok(Box::new(FakeDevice {
            fragments: self.fragments.clone(),
            releases: Arc::clone(&self.releases),
            tx: None,
        }))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct FakeDevice {
    fragments: Vec<AudioFragment>,
    releases: Arc<AtomicUsize>,
    tx: Option<mpsc::Sender<AudioFragment>>,
}

#[async_trait::async_trait]
impl CaptureDevice for FakeDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFragment>, CaptureError> {
        let (tx, rx) = mpsc::channel(self.fragments.len().max(1));
        for fragment in self.fragments.drain(..) {
            tx.try_send(fragment)
                .map_err(|e| CaptureError::DeviceError(e.to_string()))?;
        }
        self.tx = Some(tx);
        Ok(rx)
    }

    fn release(&mut self) {
        self.tx = None;
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sends `before` as soon as capture starts and `after` once released, on a
/// sender it never gives up until the stream is closed from the other end
pub struct LateMicrophone {
    before: Vec<AudioFragment>,
    after: Vec<AudioFragment>,
    pub late_sends: Arc<AtomicUsize>,
}

impl LateMicrophone {
    pub fn new(before: Vec<Vec<i16>>, after: Vec<Vec<i16>>) -> Arc<Self> {
        let to_fragments = |samples: Vec<Vec<i16>>| -> Vec<AudioFragment> {
            samples.into_iter().map(|s| fragment(s, 0)).collect()
        };
        Arc::new(Self {
            before: to_fragments(before),
            after: to_fragments(after),
            late_sends: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Late fragments the channel actually accepted
    pub fn late_send_count(&self) -> usize {
        self.late_sends.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Microphone for LateMicrophone {
    async fn request_access(
        &self,
        _config: &CaptureConfig,
    ) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        Ok(Box::new(LateDevice {
            before: self.before.clone(),
            after: self.after.clone(),
            late_sends: Arc::clone(&self.late_sends),
            released: None,
        }))
    }

    fn name(&self) -> &str {
        "late"
    }
}

struct LateDevice {
    before: Vec<AudioFragment>,
    after: Vec<AudioFragment>,
    late_sends: Arc<AtomicUsize>,
    released: Option<oneshot::Sender<()>>,
}

#[async_trait::async_trait]
impl CaptureDevice for LateDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFragment>, CaptureError> {
        let (tx, rx) = mpsc::channel(self.before.len() + self.after.len() + 1);
        for fragment in self.before.drain(..) {
            tx.try_send(fragment)
                .map_err(|e| CaptureError::DeviceError(e.to_string()))?;
        }

        let (released_tx, released_rx) = oneshot::channel();
        self.released = Some(released_tx);
        let after = std::mem::take(&mut self.after);
        let late_sends = Arc::clone(&self.late_sends);

        tokio::spawn(async move {
            let _ = released_rx.await;
            for fragment in after {
                tokio::time::sleep(Duration::from_millis(10)).await;
                if tx.send(fragment).await.is_ok() {
                    late_sends.fetch_add(1, Ordering::SeqCst);
                }
            }
            tx.closed().await;
        });

        Ok(rx)
    }

    fn release(&mut self) {
        if let Some(released) = self.released.take() {
            let _ = released.send(());
        }
    }
}

// ============================================================================
// View
// ============================================================================

pub fn view() -> (Arc<dyn ViewSink>, mpsc::UnboundedReceiver<ViewEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink: Arc<dyn ViewSink> = Arc::new(tx);
    (sink, rx)
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<ViewEvent>) -> Vec<ViewEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn status(text: &str) -> ViewEvent {
    ViewEvent::StatusChanged(text.to_string())
}
