//! Transport abstraction for the game server connection.
//!
//! The agent only ever exchanges text frames (one JSON document each) with
//! the server. The client crate's `NetClient` uses the [`Transport`] trait to
//! drive any connection that can be split into independent read and write
//! halves.

use std::future::Future;

use thiserror::Error;

/// Errors that can occur during transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// An I/O error on the underlying stream.
    #[error("{0}")]
    Io(String),

    /// A frame arrived that could not be decoded into a server message.
    #[error("malformed frame: {0}")]
    Decode(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// Read half of a transport connection.
pub trait TransportReader: Send + 'static {
    /// Receive the next text frame.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(&mut self) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;
}

/// Write half of a transport connection.
pub trait TransportWriter: Send + 'static {
    /// Send one text frame to the remote peer.
    fn send(&mut self, text: &str) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// A bidirectional transport that can be split into independent read and write
/// halves, so the reader and writer can live in separate tasks.
pub trait Transport: Send + 'static {
    /// The read half produced by [`split`](Transport::split).
    type Reader: TransportReader;
    /// The write half produced by [`split`](Transport::split).
    type Writer: TransportWriter;

    /// Split the transport into independent read and write halves.
    fn split(self) -> (Self::Reader, Self::Writer);
}
