//! Channel-based network client for the game server.
//!
//! Spawns background reader/writer tasks and exposes channels, so the
//! dispatcher can receive decoded events and the decision worker can send
//! requests without either of them owning the stream.

use tokio::sync::mpsc;
#[cfg(feature = "native")]
use tokio::task::JoinHandle;

use hanabi_core::protocol::{ClientMessage, ServerMessage};
use hanabi_core::transport::TransportError;
#[cfg(feature = "native")]
use hanabi_core::transport::{Transport, TransportReader, TransportWriter};

/// Sending side of the outbound queue. Cheap to clone; usable from any thread.
pub type Outbound = mpsc::UnboundedSender<ClientMessage>;

// ---------------------------------------------------------------------------
// Wire-level parsing
// ---------------------------------------------------------------------------

/// Decode one server frame.
///
/// Returns `Ok(None)` for blank lines. Tags this client does not know decode
/// to [`ServerMessage::Unknown`]; anything that is not a well-formed message
/// is a [`TransportError::Decode`].
pub fn parse_server_line(line: &str) -> Result<Option<ServerMessage>, TransportError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| TransportError::Decode(format!("{e}: {trimmed}")))
}

// ---------------------------------------------------------------------------
// Channel-based network events
// ---------------------------------------------------------------------------

/// High-level events produced by the background reader task.
#[derive(Debug)]
pub enum NetEvent {
    /// A decoded [`ServerMessage`].
    Message(ServerMessage),
    /// The server closed the connection cleanly.
    Disconnected,
    /// An I/O or decoding error; the reader stops after reporting it.
    Error(TransportError),
}

// ---------------------------------------------------------------------------
// NetClient
// ---------------------------------------------------------------------------

/// A channel-based network client.
///
/// - [`incoming`](NetClient::incoming) yields [`NetEvent`]s in arrival order.
/// - [`send`](NetClient::send) and [`outbound`](NetClient::outbound) enqueue
///   [`ClientMessage`]s for the background writer task.
pub struct NetClient {
    /// Receive decoded server events.
    pub incoming: mpsc::UnboundedReceiver<NetEvent>,
    outgoing: Outbound,
    #[cfg(feature = "native")]
    reader_task: Option<JoinHandle<()>>,
}

impl NetClient {
    /// Create a `NetClient` over any [`Transport`] implementation.
    ///
    /// Splits the transport, spawns the reader and writer tasks, and returns
    /// the ready-to-use client. No handshake is sent.
    #[cfg(feature = "native")]
    pub fn from_transport<T: Transport>(transport: T) -> Self {
        let (reader, writer) = transport.split();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<ClientMessage>();

        let reader_task = Self::spawn_reader_task(reader, event_tx);
        Self::spawn_writer_task(writer, cmd_rx);

        Self {
            incoming: event_rx,
            outgoing: cmd_tx,
            reader_task: Some(reader_task),
        }
    }

    /// Connect to the game server over TCP.
    #[cfg(feature = "native")]
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let transport = hanabi_core::line_transport::LineTransport::connect(host, port).await?;
        Ok(Self::from_transport(transport))
    }

    /// Enqueue a [`ClientMessage`] for transmission.
    ///
    /// Non-blocking; fails only once the writer task has stopped.
    pub fn send(&self, msg: ClientMessage) -> Result<(), mpsc::error::SendError<ClientMessage>> {
        self.outgoing.send(msg)
    }

    /// A clonable handle to the outbound queue.
    pub fn outbound(&self) -> Outbound {
        self.outgoing.clone()
    }

    /// Stop reading from the server.
    ///
    /// The writer task drains whatever is already queued and exits once
    /// every [`Outbound`] handle is dropped.
    pub fn close(&mut self) {
        #[cfg(feature = "native")]
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        self.incoming.close();
    }

    // ------------------------------------------------------------------
    // Private: background task spawners
    // ------------------------------------------------------------------

    #[cfg(feature = "native")]
    fn spawn_reader_task<R: TransportReader>(
        mut reader: R,
        event_tx: mpsc::UnboundedSender<NetEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let event = match reader.recv().await {
                    Ok(Some(line)) => match parse_server_line(&line) {
                        Ok(Some(msg)) => NetEvent::Message(msg),
                        Ok(None) => continue,
                        Err(e) => {
                            let _ = event_tx.send(NetEvent::Error(e));
                            break;
                        }
                    },
                    Ok(None) => {
                        let _ = event_tx.send(NetEvent::Disconnected);
                        break;
                    }
                    Err(e) => {
                        let _ = event_tx.send(NetEvent::Error(e));
                        break;
                    }
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
        })
    }

    #[cfg(feature = "native")]
    fn spawn_writer_task<W: TransportWriter>(
        mut writer: W,
        mut cmd_rx: mpsc::UnboundedReceiver<ClientMessage>,
    ) {
        tokio::spawn(async move {
            while let Some(msg) = cmd_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(j) => j,
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping unencodable message");
                        continue;
                    }
                };
                if let Err(e) = writer.send(&json).await {
                    tracing::warn!(error = %e, "writer stopped");
                    break;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        assert!(matches!(parse_server_line("   \n"), Ok(None)));
    }

    #[test]
    fn malformed_frames_are_decode_errors() {
        assert!(matches!(
            parse_server_line("{not json"),
            Err(TransportError::Decode(_))
        ));
    }

    #[test]
    fn unknown_tags_pass_through() {
        let msg = parse_server_line(r#"{"type":"Chat","text":"gl"}"#).unwrap();
        assert_eq!(msg, Some(ServerMessage::Unknown));
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn reader_reports_messages_then_disconnect() {
        use hanabi_core::line_transport::LineTransport;

        let mock = tokio_test::io::Builder::new()
            .read(b"{\"type\":\"ConnectionAccepted\",\"name\":\"bob\"}\n\n")
            .read(b"{\"type\":\"StartAccepted\",\"accepted\":1,\"connected\":2}\n")
            .build();
        let mut net = NetClient::from_transport(LineTransport::new(mock));

        assert!(matches!(
            net.incoming.recv().await,
            Some(NetEvent::Message(ServerMessage::ConnectionAccepted { .. }))
        ));
        assert!(matches!(
            net.incoming.recv().await,
            Some(NetEvent::Message(ServerMessage::StartAccepted {
                accepted: 1,
                connected: 2
            }))
        ));
        assert!(matches!(net.incoming.recv().await, Some(NetEvent::Disconnected)));
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn connects_over_tcp() {
        use tokio::io::{AsyncBufReadExt, BufReader};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let net = NetClient::connect("127.0.0.1", port).await.unwrap();
        let (socket, _) = listener.accept().await.unwrap();
        net.send(ClientMessage::GetGameState {
            sender: "bob".into(),
        })
        .unwrap();

        let mut line = String::new();
        BufReader::new(socket).read_line(&mut line).await.unwrap();
        assert_eq!(line, "{\"type\":\"GetGameState\",\"sender\":\"bob\"}\n");
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn round_trips_over_a_line_transport() {
        use hanabi_core::line_transport::LineTransport;

        let (client, server) = tokio::io::duplex(1024);
        let mut net = NetClient::from_transport(LineTransport::new(client));
        let (mut peer_rx, mut peer_tx) = LineTransport::new(server).split();

        net.send(ClientMessage::Join {
            sender: "bob".into(),
        })
        .unwrap();
        let line = peer_rx.recv().await.unwrap().unwrap();
        assert_eq!(line, r#"{"type":"Join","sender":"bob"}"#);

        peer_tx
            .send(r#"{"type":"ConnectionAccepted","name":"bob"}"#)
            .await
            .unwrap();
        peer_tx.send("garbage").await.unwrap();

        assert!(matches!(
            net.incoming.recv().await,
            Some(NetEvent::Message(ServerMessage::ConnectionAccepted { .. }))
        ));
        assert!(matches!(
            net.incoming.recv().await,
            Some(NetEvent::Error(TransportError::Decode(_)))
        ));
    }
}
