//! Message Source Module
//!
//! Abstract event stream feeding the pipeline. Sources deliver only messages
//! published after they start; history is never replayed, which is why the
//! cache is rebuilt from the durable store instead.

mod channel;
mod tcp;

use async_trait::async_trait;

pub use channel::ChannelSource;
pub use tcp::TcpSource;

/// One delivered message with its opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// A stream of inbound messages, read by a single consumer.
#[async_trait]
pub trait MessageSource: Send {
    /// Waits for the next message. `None` means the source is closed.
    async fn recv(&mut self) -> Option<InboundMessage>;
}
