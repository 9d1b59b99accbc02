//! Newline-delimited text transport over any async byte stream.
//!
//! The game server speaks one JSON document per line over plain TCP.
//! [`LineTransport::connect`] opens that connection; tests wrap in-memory
//! streams with [`LineTransport::new`].

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf,
};
use tokio::net::TcpStream;

use crate::transport::{Transport, TransportError, TransportReader, TransportWriter};

/// Line-framed transport. `S` is usually a [`TcpStream`].
pub struct LineTransport<S> {
    stream: S,
}

impl<S> LineTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

impl LineTransport<TcpStream> {
    /// Connect to the game server at `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl<S> Transport for LineTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    type Reader = LineReader<S>;
    type Writer = LineWriter<S>;

    fn split(self) -> (Self::Reader, Self::Writer) {
        let (read_half, write_half) = tokio::io::split(self.stream);
        (
            LineReader {
                reader: BufReader::new(read_half),
                line: String::new(),
            },
            LineWriter { writer: write_half },
        )
    }
}

/// Read half of a [`LineTransport`].
pub struct LineReader<S> {
    reader: BufReader<ReadHalf<S>>,
    line: String,
}

impl<S> TransportReader for LineReader<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        self.line.clear();
        let read = self.reader.read_line(&mut self.line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(self.line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Write half of a [`LineTransport`].
pub struct LineWriter<S> {
    writer: WriteHalf<S>,
}

impl<S> TransportWriter for LineWriter<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        let frame = format!("{text}\n");
        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
