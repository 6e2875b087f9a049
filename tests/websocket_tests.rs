// End-to-end test over a real WebSocket
//
// Spins up a tokio-tungstenite server on localhost that plays the backend for
// one chat exchange, and drives the controller against it.

mod common;

use anyhow::Result;
use common::{view, wait_for_state};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use voice_chat_client::session::view::status;
use voice_chat_client::{
    ChannelState, SessionConfig, SessionController, SessionIdentity, UnavailableMicrophone,
    ViewEvent, WsConnector,
};

#[tokio::test]
async fn test_chat_over_websocket() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let backend = tokio::spawn(async move {
        let (stream, _) = listener.accept().await?;

        let mut path = String::new();
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, |req: &Request, resp: Response| {
            path = req.uri().path().to_string();
            Ok::<_, ErrorResponse>(resp)
        })
        .await?;

        let received = match ws.next().await {
            Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
            other => anyhow::bail!("expected a text frame, got {:?}", other),
        };

        ws.send(Message::text(
            r#"{"type":"chat_response","message":"hi there"}"#.to_string(),
        ))
        .await?;

        // Hand the socket back so it stays open until the test is done
        anyhow::Ok((path, received, ws))
    });

    let (view, mut events) = view();
    let mut controller = SessionController::new(
        SessionIdentity::from_string("e2e-session"),
        SessionConfig {
            server_url: format!("ws://{}", addr),
            ..SessionConfig::default()
        },
        Arc::new(WsConnector),
        Arc::new(UnavailableMicrophone),
        view,
    );

    wait_for_state(controller.transport().subscribe_state(), ChannelState::Open).await;
    assert!(controller.submit_text("hello"));
    assert!(timeout(Duration::from_secs(10), controller.handle_next_frame()).await?);

    let (path, received, _ws) = timeout(Duration::from_secs(10), backend).await???;
    assert_eq!(path, "/ws/e2e-session");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&received)?,
        serde_json::json!({"type": "chat", "message": "hello"})
    );

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen,
        vec![
            ViewEvent::StatusChanged(status::CONNECTED.to_string()),
            ViewEvent::UserUtterance("hello".to_string()),
            ViewEvent::StatusChanged(status::PROCESSING.to_string()),
            ViewEvent::AssistantUtterance("hi there".to_string()),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_keeps_retrying() -> Result<()> {
    // Bind then drop to get a port nothing listens on
    let addr = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;

    let (view, mut events) = view();
    let controller = SessionController::new(
        SessionIdentity::generate(),
        SessionConfig {
            server_url: format!("ws://{}", addr),
            reconnect_delay: Duration::from_millis(50),
            ..SessionConfig::default()
        },
        Arc::new(WsConnector),
        Arc::new(UnavailableMicrophone),
        view,
    );

    let mut reconnects = 0;
    while reconnects < 3 {
        match timeout(Duration::from_secs(10), events.recv()).await? {
            Some(ViewEvent::StatusChanged(text)) if text == status::RECONNECTING => reconnects += 1,
            Some(_) => {}
            None => anyhow::bail!("view closed"),
        }
    }

    assert_ne!(controller.transport_state(), ChannelState::Open);

    Ok(())
}
