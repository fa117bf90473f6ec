//! WebSocket mock for the voice-AI backend.
//!
//! Accepts one conversation connection, records every JSON message the
//! gateway sends, and lets the test script push arbitrary events back. The
//! received channel closing signals that the gateway closed the socket.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

pub struct AgentMock {
    /// `ws://` URL for the signed-URL mock to hand out.
    pub url: String,
    /// Every JSON message the gateway sent, in order. `None` once the
    /// gateway's socket is gone.
    pub from_gateway: mpsc::Receiver<Value>,
    /// Raw JSON events to push to the gateway.
    pub to_gateway: mpsc::Sender<String>,
}

/// Spawn a single-connection agent mock on an ephemeral port.
pub async fn spawn_agent_mock() -> AgentMock {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind agent mock");
    let port = listener.local_addr().unwrap().port();

    let (received_tx, received_rx) = mpsc::channel::<Value>(256);
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<String>(256);

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(ws_stream) = accept_async(stream).await else {
            return;
        };
        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                incoming = read.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(value) = serde_json::from_str::<Value>(&text)
                            && received_tx.send(value).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if write.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                },
                event = outgoing_rx.recv() => match event {
                    Some(json) => {
                        if write.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        // Dropping received_tx ends the from_gateway stream.
    });

    AgentMock {
        url: format!("ws://127.0.0.1:{port}"),
        from_gateway: received_rx,
        to_gateway: outgoing_tx,
    }
}
