//! TCP transport: socket setup, the read loop and the writer task.
//!
//! The read half is owned by a spawned task that feeds decoded fieldsets
//! into an unbounded channel; the write half is owned by a dedicated writer
//! task fed through [`WriterHandle`]. Handles are cheap to clone and all
//! frame bytes are fully encoded before they reach the writer, so the writer
//! never blocks on anything but the socket.
//!
//! There is no retry or reconnection here: the first socket error ends the
//! read loop and the channel closure is the owner's signal.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::error::{Result, TwsError};
use crate::protocol::{
    encode_frame, encode_string_frame, Fieldset, FrameBuffer, HANDSHAKE_PREFIX,
};
use crate::messages::{MAX_CLIENT_VERSION, MIN_CLIENT_VERSION};

/// Handle for queueing raw frames to the writer task.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl WriterHandle {
    /// Queue pre-encoded bytes for writing.
    pub fn send_raw(&self, bytes: Vec<u8>) -> Result<()> {
        self.tx.send(bytes).map_err(|_| TwsError::ConnectionClosed)
    }

    /// Encode a fieldset as one frame and queue it.
    pub fn send_fieldset(&self, fields: &[String]) -> Result<()> {
        self.send_raw(encode_frame(fields))
    }

    /// The raw byte channel into the writer task; the dispatch queue drains
    /// into this.
    pub fn raw_sender(&self) -> mpsc::UnboundedSender<Vec<u8>> {
        self.tx.clone()
    }

    /// Send the connection preamble: the literal `API\0` prefix followed by
    /// the framed client version range. Must precede all other traffic.
    pub fn send_handshake(&self) -> Result<()> {
        self.send_raw(HANDSHAKE_PREFIX.to_vec())?;
        self.send_raw(encode_string_frame(&format!(
            "v{}..{}",
            MIN_CLIENT_VERSION, MAX_CLIENT_VERSION
        )))
    }
}

/// Open a TCP connection and spawn the read/write tasks.
///
/// Resolves once the socket is open, or with the first connect error.
/// Returns the writer handle and the inbound fieldset channel; the channel
/// closing means the connection is gone.
pub async fn connect(host: &str, port: u16) -> Result<(WriterHandle, mpsc::UnboundedReceiver<Fieldset>)> {
    let stream = TcpStream::connect((host, port)).await?;
    stream.set_nodelay(true)?;

    let (read_half, write_half) = stream.into_split();
    Ok(spawn_io(read_half, write_half))
}

/// Spawn the read loop and writer task over arbitrary I/O halves.
///
/// Split out of [`connect`] so tests can drive a session over an in-process
/// duplex stream.
pub fn spawn_io<R, W>(read_half: R, write_half: W) -> (WriterHandle, mpsc::UnboundedReceiver<Fieldset>)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    let (write_tx, write_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        if let Err(e) = read_loop(read_half, frame_tx).await {
            tracing::error!("read loop error: {}", e);
        }
    });

    tokio::spawn(async move {
        if let Err(e) = writer_loop(write_half, write_rx).await {
            tracing::error!("writer error: {}", e);
        }
    });

    (WriterHandle { tx: write_tx }, frame_rx)
}

/// Read loop: buffer partial reads, emit every complete fieldset.
async fn read_loop<R>(mut reader: R, tx: mpsc::UnboundedSender<Fieldset>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut frame_buffer = FrameBuffer::new();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::debug!("socket closed by peer");
                return Ok(());
            }
            Ok(n) => n,
            Err(e) => return Err(TwsError::Io(e)),
        };

        for fields in frame_buffer.push(&buf[..n])? {
            if tx.send(fields).is_err() {
                // Receiver dropped; the session is being torn down.
                return Ok(());
            }
        }
    }
}

/// Writer loop: drain queued frames to the socket in order.
async fn writer_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(bytes) = rx.recv().await {
        writer.write_all(&bytes).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_writer_sends_fieldset_frames() {
        let (client, mut server) = duplex(4096);
        let (reader, writer_half) = tokio::io::split(client);
        let (writer, _rx) = spawn_io(reader, writer_half);

        writer
            .send_fieldset(&["49".to_string(), "1".to_string()])
            .unwrap();

        let mut buf = vec![0u8; 64];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"\x00\x00\x00\x0549\x001\x00");
    }

    #[tokio::test]
    async fn test_handshake_bytes() {
        let (client, mut server) = duplex(4096);
        let (reader, writer_half) = tokio::io::split(client);
        let (writer, _rx) = spawn_io(reader, writer_half);

        writer.send_handshake().unwrap();

        let mut buf = vec![0u8; 64];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"API\x00\x00\x00\x00\x09v100..151");
    }

    #[tokio::test]
    async fn test_read_loop_emits_fieldsets() {
        let (client, mut server) = duplex(4096);
        let (reader, writer_half) = tokio::io::split(client);
        let (_writer, mut rx) = spawn_io(reader, writer_half);

        let frame = encode_frame(&["9".to_string(), "1".to_string(), "42".to_string()]);
        server.write_all(&frame).await.unwrap();

        let fields = rx.recv().await.unwrap();
        assert_eq!(fields, vec!["9", "1", "42"]);
    }

    #[tokio::test]
    async fn test_channel_closes_when_peer_disconnects() {
        let (client, server) = duplex(4096);
        let (reader, writer_half) = tokio::io::split(client);
        let (_writer, mut rx) = spawn_io(reader, writer_half);

        drop(server);

        assert!(rx.recv().await.is_none());
    }
}
