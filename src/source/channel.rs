//! In-process message source backed by an mpsc channel.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{InboundMessage, MessageSource};

/// Message source fed through a bounded channel.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<InboundMessage>,
}

impl ChannelSource {
    /// Creates a source and the sender that publishes into it.
    pub fn new(capacity: usize) -> (mpsc::Sender<InboundMessage>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn recv(&mut self) -> Option<InboundMessage> {
        self.rx.recv().await
    }
}
