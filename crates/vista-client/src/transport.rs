// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Byte-stream transports and packet I/O.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{trace, warn};
use vista_proto::wire::{encode_message_packet, PacketReader};
use vista_proto::Message;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Any bidirectional byte stream a session can run over.
pub trait Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Stream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// Type-erased stream.
pub type BoxedStream = Box<dyn Stream>;

/// Opens a fresh stream to the server for every (re)connect.
pub trait Connector: Send + Sync + 'static {
    /// Human-readable endpoint for logs and the status panel.
    fn describe(&self) -> String;

    /// Open one connection.
    fn connect(&self) -> impl Future<Output = Result<BoxedStream>> + Send;
}

/// TCP endpoint, e.g. `127.0.0.1:8080`.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    /// Connector for `addr`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl Connector for TcpConnector {
    fn describe(&self) -> String {
        self.addr.clone()
    }

    async fn connect(&self) -> Result<BoxedStream> {
        let stream = time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.addr))
            .await
            .with_context(|| format!("timed out connecting to {}", self.addr))?
            .with_context(|| format!("connect {}", self.addr))?;
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }
}

/// Unix domain socket endpoint.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct UnixConnector {
    path: std::path::PathBuf,
}

#[cfg(unix)]
impl UnixConnector {
    /// Connector for the socket at `path`.
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(unix)]
impl Connector for UnixConnector {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn connect(&self) -> Result<BoxedStream> {
        let stream = time::timeout(CONNECT_TIMEOUT, tokio::net::UnixStream::connect(&self.path))
            .await
            .with_context(|| format!("timed out connecting to {}", self.path.display()))?
            .with_context(|| format!("connect {}", self.path.display()))?;
        Ok(Box::new(stream))
    }
}

/// Read packets until EOF, passing each payload to `on_payload` in order.
///
/// Returns `Ok` on a clean close and an error on I/O failure or broken
/// framing (which leaves the byte stream unrecoverable).
pub async fn read_payloads<R>(
    mut reader: R,
    max_payload: usize,
    mut on_payload: impl FnMut(Bytes),
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut packets = PacketReader::new(max_payload);
    let mut buf = vec![0u8; 16 * 1024];
    loop {
        let n = reader.read(&mut buf).await.context("read from server")?;
        if n == 0 {
            if packets.buffered() > 0 {
                warn!(buffered = packets.buffered(), "stream closed mid-packet");
            }
            return Ok(());
        }
        packets.extend(&buf[..n]);
        while let Some(payload) = packets.next_payload().context("bad packet from server")? {
            trace!(len = payload.len(), "payload received");
            on_payload(payload);
        }
    }
}

/// Encode and write queued messages until the channel closes.
pub async fn write_messages<W>(mut writer: W, mut rx: mpsc::Receiver<Message>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = rx.recv().await {
        let packet = match encode_message_packet(&msg) {
            Ok(packet) => packet,
            Err(err) => {
                warn!(kind = msg.kind(), %err, "could not encode outbound message");
                continue;
            }
        };
        writer.write_all(&packet).await.context("write to server")?;
    }
    writer.shutdown().await.ok();
    Ok(())
}
