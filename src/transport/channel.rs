//! In-process transport backed by a tokio unbounded channel.

use tokio::sync::mpsc;
use tracing::debug;

use super::{Reply, Transport, TransportError};
use crate::workitem::WorkItem;

/// Transport whose replies land on an in-process receiver.
///
/// The sending half is unbounded so [`Transport::reply_to_engine`] never
/// waits, whichever thread calls it.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    reply_queue: String,
    replies: mpsc::UnboundedSender<Reply>,
}

impl ChannelTransport {
    /// Create a transport and the receiver its replies are delivered to.
    pub fn new(reply_queue: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<Reply>) {
        let (replies, rx) = mpsc::unbounded_channel();
        let transport = Self {
            reply_queue: reply_queue.into(),
            replies,
        };
        (transport, rx)
    }

    /// Queue replies are tagged with.
    pub fn reply_queue(&self) -> &str {
        &self.reply_queue
    }
}

impl Transport for ChannelTransport {
    fn reply_to_engine(&self, workitem: WorkItem) -> Result<(), TransportError> {
        debug!(queue = %self.reply_queue, "queueing reply to engine");
        self.replies
            .send(Reply {
                reply_queue: self.reply_queue.clone(),
                workitem,
            })
            .map_err(|_| TransportError::Closed)
    }
}
