//! Integration tests for the realtime client against a local WebSocket server

use futures_util::{SinkExt, StreamExt};
use logwatch::realtime::{
    BackoffPolicy, ClientError, ConnectionStatus, RealtimeClient, SubscribeOptions, LOG_CHUNK,
};
use logwatch::ws::WsConfig;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

const WAIT: Duration = Duration::from_secs(5);

type ServerSocket = WebSocketStream<TcpStream>;

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    (listener, url)
}

async fn accept(listener: &TcpListener) -> ServerSocket {
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .expect("Timed out waiting for client")
        .unwrap();
    accept_async(stream).await.unwrap()
}

async fn next_json(socket: &mut ServerSocket) -> Value {
    loop {
        let msg = tokio::time::timeout(WAIT, socket.next())
            .await
            .expect("Timed out waiting for frame")
            .expect("Socket closed")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn wait_for(status: &mut watch::Receiver<ConnectionStatus>, want: ConnectionStatus) {
    tokio::time::timeout(WAIT, status.wait_for(|s| *s == want))
        .await
        .expect("Timed out waiting for status")
        .unwrap();
}

fn fast_client(url: &str) -> RealtimeClient {
    RealtimeClient::connect(
        WsConfig::new(url),
        BackoffPolicy::new(Duration::from_millis(50), Duration::from_millis(200)),
    )
}

#[tokio::test]
async fn test_subscribe_receive_and_replay_after_drop() {
    let (listener, url) = bind().await;
    let client = fast_client(&url);
    let mut status = client.watch_status();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let guard = client.subscribe_fn(LOG_CHUNK, SubscribeOptions::token("abc"), move |event| {
        tx.send(event.payload().cloned())?;
        Ok(())
    });

    let mut socket = accept(&listener).await;
    let frame = next_json(&mut socket).await;
    assert_eq!(
        frame,
        json!({"type": "subscribe", "event": "log_chunk", "token": "abc"})
    );
    wait_for(&mut status, ConnectionStatus::Connected).await;

    socket
        .send(Message::Text(
            json!({"type": "log_chunk", "token": "abc", "payload": "L 01/30/2025 - 16:33:56: hello"})
                .to_string(),
        ))
        .await
        .unwrap();
    let payload = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(payload, Some(json!("L 01/30/2025 - 16:33:56: hello")));

    // Server goes away without a close handshake
    drop(socket);

    let mut socket = accept(&listener).await;
    let frame = next_json(&mut socket).await;
    assert_eq!(
        frame,
        json!({"type": "subscribe", "event": "log_chunk", "token": "abc"})
    );
    wait_for(&mut status, ConnectionStatus::Connected).await;

    drop(guard);
    let frame = next_json(&mut socket).await;
    assert_eq!(
        frame,
        json!({"type": "unsubscribe", "event": "log_chunk", "token": "abc"})
    );
    assert_eq!(client.subscription_count(), 0);

    client.shutdown();
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_malformed_frames_are_skipped() {
    let (listener, url) = bind().await;
    let client = fast_client(&url);
    let mut status = client.watch_status();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _guard = client.subscribe_fn(LOG_CHUNK, SubscribeOptions::token("abc"), move |event| {
        tx.send(event.token().map(str::to_string))?;
        Ok(())
    });

    let mut socket = accept(&listener).await;
    next_json(&mut socket).await;
    wait_for(&mut status, ConnectionStatus::Connected).await;

    for text in [
        "not json".to_string(),
        json!({"event": "log_chunk"}).to_string(),
        json!({"type": "other", "token": "abc"}).to_string(),
        json!({"type": "log_chunk", "token": "abc", "payload": "x"}).to_string(),
    ] {
        socket.send(Message::Text(text)).await.unwrap();
    }

    let token = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(token.as_deref(), Some("abc"));
    assert!(rx.try_recv().is_err());
    assert_eq!(client.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn test_send_requires_connection() {
    let (listener, url) = bind().await;
    let client = fast_client(&url);
    let mut status = client.watch_status();

    // Handshake has not been accepted yet
    assert_eq!(client.send("{}"), Err(ClientError::NotConnected));

    let mut socket = accept(&listener).await;
    wait_for(&mut status, ConnectionStatus::Connected).await;

    client.send(r#"{"type":"ping"}"#).unwrap();
    assert_eq!(next_json(&mut socket).await, json!({"type": "ping"}));

    client.shutdown();
    assert_eq!(client.send("{}"), Err(ClientError::NotConnected));
}

#[tokio::test]
async fn test_shutdown_stops_reconnecting() {
    let (listener, url) = bind().await;
    let client = fast_client(&url);
    let mut status = client.watch_status();

    let socket = accept(&listener).await;
    wait_for(&mut status, ConnectionStatus::Connected).await;

    client.shutdown();
    drop(socket);

    // Several base delays pass without a new connection attempt
    let attempt = tokio::time::timeout(Duration::from_millis(400), listener.accept()).await;
    assert!(attempt.is_err());
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_shutdown_during_handshake_never_connects() {
    let (listener, url) = bind().await;
    let client = fast_client(&url);
    let mut status = client.watch_status();

    // Hold the upgrade until the client has been shut down
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .expect("Timed out waiting for client")
        .unwrap();
    assert_eq!(client.status(), ConnectionStatus::Connecting);
    client.shutdown();
    assert_eq!(client.status(), ConnectionStatus::Disconnected);

    if let Ok(Ok(mut socket)) = tokio::time::timeout(WAIT, accept_async(stream)).await {
        // The client side is gone: no frames, just the end of the stream
        let next = tokio::time::timeout(WAIT, socket.next())
            .await
            .expect("Socket stayed open after shutdown");
        assert!(matches!(next, None | Some(Err(_))));
    }

    assert_eq!(*status.borrow_and_update(), ConnectionStatus::Disconnected);
    let retry = tokio::time::timeout(Duration::from_millis(300), listener.accept()).await;
    assert!(retry.is_err());
}
