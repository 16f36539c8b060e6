//! Transport seam between the message bus and the participant core.
//!
//! A transport delivers [`Delivery`] envelopes to the participant and accepts
//! replies through [`Transport::reply_to_engine`]. Replies are enqueued, never
//! awaited, so the call is safe from runtime tasks and plain threads alike.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workitem::WorkItem;

pub mod channel;
pub mod stdio;

pub use channel::ChannelTransport;

/// Queue the engine listens on for participant replies.
pub const DEFAULT_REPLY_QUEUE: &str = "ruote_workitems";

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Inbound message from the engine to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Delivery {
    /// A new workitem for this participant.
    Consume {
        /// The dispatched workitem.
        workitem: WorkItem,
    },
    /// The engine cancelled an in-flight workitem.
    Cancel {
        /// The workitem being cancelled.
        workitem: WorkItem,
    },
    /// The participant is being shut down.
    Stop {
        /// The workitem carried by the shutdown message.
        workitem: WorkItem,
    },
    /// Raw participant lifecycle token (`start`, `die`, ...).
    Control {
        /// Control token.
        token: String,
    },
}

impl Delivery {
    /// Short name of the delivery kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Consume { .. } => "consume",
            Self::Cancel { .. } => "cancel",
            Self::Stop { .. } => "stop",
            Self::Control { .. } => "control",
        }
    }
}

/// Outbound reply from a participant to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Queue the reply is published to.
    pub reply_queue: String,
    /// Workitem sent back as the reply payload.
    pub workitem: WorkItem,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The engine side of the transport has gone away.
    #[error("transport closed")]
    Closed,
    /// A message could not be encoded or decoded.
    #[error("JSON codec error: {0}")]
    Codec(#[from] serde_json::Error),
    /// Reading or writing the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Reply primitive of a message-bus transport.
pub trait Transport: Send + Sync {
    /// Queue `workitem` as the reply payload for the engine.
    ///
    /// Must not block: it is called from control paths and from threads the
    /// handler owns.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] when replies can no longer be
    /// delivered.
    fn reply_to_engine(&self, workitem: WorkItem) -> Result<(), TransportError>;
}
