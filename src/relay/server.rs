//! WebSocket relay server

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;

use super::hub::{ConnectionId, Peer, RelayHub};

/// Outgoing queue of one connection
type Outbox = mpsc::UnboundedSender<Message>;

impl Peer for Outbox {
    fn is_open(&self) -> bool {
        !self.is_closed()
    }

    fn send_text(&self, text: String) -> bool {
        self.send(Message::Text(text)).is_ok()
    }
}

type SharedHub = Arc<Mutex<RelayHub<Outbox>>>;

/// Accept connections on `port` until the listener fails
pub async fn start_relay_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    log::info!("Relay listening on ws://localhost:{}", port);

    let hub: SharedHub = Arc::new(Mutex::new(RelayHub::new()));
    let next_id = AtomicU64::new(1);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let hub = Arc::clone(&hub);
                let id = next_id.fetch_add(1, Ordering::Relaxed);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, addr, id, hub).await {
                        log::warn!("Connection error from {}: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                log::warn!("Accept error: {}", e);
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    id: ConnectionId,
    hub: SharedHub,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    log::info!("Connection {} from {}", id, addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    hub.lock().await.connect(id, tx);

    // Drain this connection's outbox into the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                // Routing failures are replied to the sender by the hub
                let _ = hub.lock().await.handle_text(id, &text);
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                log::debug!("Connection {} read error: {}", id, e);
                break;
            }
            _ => {}
        }
    }

    hub.lock().await.disconnect(id);
    send_task.abort();
    log::info!("Connection {} closed", id);

    Ok(())
}
