//! TCP message source
//!
//! Publishers connect and write one JSON payload per line. Each connection
//! is read by its own task; frames are forwarded to the consumer through a
//! bounded channel. Order is kept within a connection, not across them.
//!
//! Frames are raw bytes. A frame that is not valid UTF-8 or JSON still
//! reaches the pipeline, where it is dropped on its own. A frame longer than
//! the configured maximum is discarded up to its newline.

use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, FramedRead};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{InboundMessage, MessageSource};

/// Default upper bound for one payload frame (1 MiB).
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 1024 * 1024;

#[derive(Debug)]
pub struct TcpSource {
    rx: mpsc::Receiver<InboundMessage>,
    local_addr: SocketAddr,
}

impl TcpSource {
    /// Binds the listener with [`DEFAULT_MAX_FRAME_LENGTH`].
    pub async fn bind(
        addr: impl ToSocketAddrs,
        capacity: usize,
        shutdown: CancellationToken,
    ) -> std::io::Result<Self> {
        Self::bind_with_max_frame(addr, capacity, DEFAULT_MAX_FRAME_LENGTH, shutdown).await
    }

    /// Binds the listener and starts accepting publishers.
    ///
    /// The accept loop and every connection reader stop when `shutdown` is
    /// cancelled.
    pub async fn bind_with_max_frame(
        addr: impl ToSocketAddrs,
        capacity: usize,
        max_frame_length: usize,
        shutdown: CancellationToken,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (tx, rx) = mpsc::channel(capacity.max(1));

        info!(max_frame_length, "Ingest source listening on {}", local_addr);
        tokio::spawn(accept_loop(listener, tx, max_frame_length.max(1), shutdown));

        Ok(Self { rx, local_addr })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl MessageSource for TcpSource {
    async fn recv(&mut self) -> Option<InboundMessage> {
        self.rx.recv().await
    }
}

// == Framing ==
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Payload(Bytes),
    /// Frame exceeded the maximum length; its bytes were discarded
    Oversized,
}

/// Newline-delimited byte frames with a length cap.
///
/// Reports an oversized frame as an item so the stream keeps going; the
/// inner codec skips the rest of that frame on the following calls.
struct PayloadCodec {
    inner: AnyDelimiterCodec,
}

impl PayloadCodec {
    fn new(max_frame_length: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(
                b"\n".to_vec(),
                b"\n".to_vec(),
                max_frame_length,
            ),
        }
    }
}

impl Decoder for PayloadCodec {
    type Item = Frame;
    type Error = AnyDelimiterCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, Self::Error> {
        oversized_as_frame(self.inner.decode(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, Self::Error> {
        oversized_as_frame(self.inner.decode_eof(src))
    }
}

fn oversized_as_frame(
    result: Result<Option<Bytes>, AnyDelimiterCodecError>,
) -> Result<Option<Frame>, AnyDelimiterCodecError> {
    match result {
        Ok(frame) => Ok(frame.map(Frame::Payload)),
        Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => Ok(Some(Frame::Oversized)),
        Err(e) => Err(e),
    }
}

// == Connections ==
async fn accept_loop(
    listener: TcpListener,
    tx: mpsc::Sender<InboundMessage>,
    max_frame_length: usize,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Ingest source shutting down");
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        debug!("Publisher connected: {}", peer);
                        tokio::spawn(read_messages(
                            stream,
                            peer,
                            tx.clone(),
                            max_frame_length,
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                }
            }
        }
    }
}

async fn read_messages(
    stream: TcpStream,
    peer: SocketAddr,
    tx: mpsc::Sender<InboundMessage>,
    max_frame_length: usize,
    shutdown: CancellationToken,
) {
    let mut frames = FramedRead::new(stream, PayloadCodec::new(max_frame_length));

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = frames.next() => frame,
        };

        match frame {
            Some(Ok(Frame::Payload(payload))) => {
                if payload.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                if tx.send(InboundMessage::new(payload.to_vec())).await.is_err() {
                    debug!("Source consumer gone, closing publisher {}", peer);
                    break;
                }
            }
            Some(Ok(Frame::Oversized)) => {
                warn!(
                    max_frame_length,
                    "Dropping oversized frame from publisher {}", peer
                );
            }
            Some(Err(e)) => {
                warn!("Read error from publisher {}: {}", peer, e);
                break;
            }
            None => {
                debug!("Publisher disconnected: {}", peer);
                break;
            }
        }
    }
}
