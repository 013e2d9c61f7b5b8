//! Mock executor endpoint for integration tests.
//!
//! Provides a WebSocket server that can:
//! - Record the request path, `Authorization` header and time of each handshake
//! - Push scripted text frames to every connected client
//! - Close all client connections on demand

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::accept_hdr_async;

/// One accepted handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub path: String,
    pub authorization: Option<String>,
    pub accepted_at: Instant,
}

#[derive(Debug, Clone)]
enum Command {
    Send(String),
    Close,
}

#[derive(Default)]
struct State {
    handshakes: Vec<Handshake>,
    active: u32,
}

/// A mock WebSocket server for testing.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    commands: broadcast::Sender<Command>,
    state: Arc<Mutex<State>>,
}

impl MockWsServer {
    /// Start a new mock server on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State::default()));
        let (commands, _) = broadcast::channel::<Command>(64);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let state_clone = state.clone();
        let commands_clone = commands.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        tokio::spawn(handle_connection(
                            stream,
                            state_clone.clone(),
                            commands_clone.clone(),
                        ));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            commands,
            state,
        }
    }

    /// Server base URL, without the executor path.
    pub fn base_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Number of completed handshakes so far.
    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.handshakes.len()
    }

    /// Number of currently open connections.
    pub async fn active_connections(&self) -> u32 {
        self.state.lock().await.active
    }

    pub async fn handshakes(&self) -> Vec<Handshake> {
        self.state.lock().await.handshakes.clone()
    }

    /// Wait until at least `count` handshakes completed.
    pub async fn wait_for_connections(&self, count: usize, limit: Duration) -> bool {
        tokio::time::timeout(limit, async {
            while self.connection_count().await < count {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .is_ok()
    }

    /// Wait until no connection is open.
    pub async fn wait_for_disconnect(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, async {
            while self.active_connections().await > 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .is_ok()
    }

    /// Send a text frame to every open connection.
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.commands.send(Command::Send(frame.into()));
    }

    /// Close every open connection from the server side.
    pub fn close_connections(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<Mutex<State>>,
    commands: broadcast::Sender<Command>,
) {
    let mut handshake = None;
    let record = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        handshake = Some(Handshake {
            path: request.uri().path().to_string(),
            authorization: request
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            accepted_at: Instant::now(),
        });
        Ok(response)
    };
    let ws_stream = match accept_hdr_async(stream, record).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    // Subscribe before the handshake becomes visible so no pushed frame is missed.
    let mut command_rx = commands.subscribe();
    {
        let mut state = state.lock().await;
        state.handshakes.extend(handshake);
        state.active += 1;
    }

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            command = command_rx.recv() => match command {
                Ok(Command::Send(text)) => {
                    if write.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(Command::Close) | Err(_) => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }

    state.lock().await.active -= 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts() {
        let server = MockWsServer::start().await;
        assert!(server.base_url().starts_with("ws://127.0.0.1:"));
        assert_eq!(server.connection_count().await, 0);
        server.shutdown().await;
    }
}
