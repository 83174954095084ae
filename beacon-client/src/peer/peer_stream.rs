use crate::peer::DataChannel;
use bytes::Bytes;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};
use tracing::{debug, warn};

const PIPE_CAPACITY: usize = 64 * 1024;
const MAX_MESSAGE: usize = 16 * 1024;

/// Bidirectional byte stream over an open [`DataChannel`].
///
/// Writes are cut into channel messages of at most 16 KiB; inbound messages
/// are concatenated. Dropping or shutting down the stream closes the channel.
pub struct PeerStream {
    io: DuplexStream,
}

impl PeerStream {
    pub fn new(channel: Arc<dyn DataChannel>) -> Self {
        let (io, pipe) = tokio::io::duplex(PIPE_CAPACITY);
        let (mut pipe_reader, mut pipe_writer) = tokio::io::split(pipe);

        let inbound = channel.clone();
        tokio::spawn(async move {
            while let Some(data) = inbound.recv().await {
                if pipe_writer.write_all(&data).await.is_err() {
                    break;
                }
            }
            debug!("Data channel drained");
            let _ = pipe_writer.shutdown().await;
        });

        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_MESSAGE];
            loop {
                match pipe_reader.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Err(e) = channel.send(Bytes::copy_from_slice(&buf[..n])).await {
                            warn!("Data channel send failed: {}", e);
                            break;
                        }
                    }
                }
            }
            channel.close().await;
        });

        Self { io }
    }
}

impl AsyncRead for PeerStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_read(cx, buf)
    }
}

impl AsyncWrite for PeerStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.io).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_shutdown(cx)
    }
}
