//! Reply callback injected into handlers.
//!
//! The adapter fills a handler's [`ReplySlot`] exactly once at construction.
//! From then on the handler can reply to the engine from any task or thread
//! by calling [`EngineReply::send_to_engine`], without ever seeing the
//! transport itself.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use super::ParticipantError;
use crate::transport::Transport;
use crate::workitem::WorkItem;

/// Cloneable handle that sends a workitem back to the engine.
#[derive(Clone)]
pub struct EngineReply {
    participant: Arc<str>,
    transport: Arc<dyn Transport>,
}

impl EngineReply {
    pub(crate) fn new(participant: Arc<str>, transport: Arc<dyn Transport>) -> Self {
        Self {
            participant,
            transport,
        }
    }

    /// Send `workitem` to the engine as this participant's reply.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipantError::Transport`] when the transport refuses
    /// the reply.
    pub fn send_to_engine(&self, workitem: WorkItem) -> Result<(), ParticipantError> {
        match &workitem.fei {
            Some(fei) => debug!(participant = %self.participant, fei = %fei, "replying to engine"),
            None => debug!(participant = %self.participant, "replying to engine"),
        }
        self.transport.reply_to_engine(workitem)?;
        Ok(())
    }

    /// Participant this callback replies for.
    pub fn participant(&self) -> &str {
        &self.participant
    }
}

impl fmt::Debug for EngineReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineReply")
            .field("participant", &self.participant)
            .finish_non_exhaustive()
    }
}

/// Write-once holder for a handler's [`EngineReply`].
#[derive(Debug, Default)]
pub struct ReplySlot {
    reply: OnceLock<EngineReply>,
}

impl ReplySlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the slot. A second install is refused and the first one kept.
    pub(crate) fn install(&self, reply: EngineReply) -> Result<(), ParticipantError> {
        self.reply
            .set(reply)
            .map_err(|_| ParticipantError::ReplyAlreadyInstalled)
    }

    /// `true` once an adapter has installed its callback.
    pub fn is_installed(&self) -> bool {
        self.reply.get().is_some()
    }

    /// Owned copy of the callback, for moving into another task or thread.
    pub fn reply(&self) -> Option<EngineReply> {
        self.reply.get().cloned()
    }

    /// Send `workitem` to the engine through the installed callback.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipantError::ReplyNotInstalled`] when no adapter has
    /// been attached yet, or the transport error from the callback.
    pub fn send_to_engine(&self, workitem: WorkItem) -> Result<(), ParticipantError> {
        self.reply
            .get()
            .ok_or(ParticipantError::ReplyNotInstalled)?
            .send_to_engine(workitem)
    }
}
