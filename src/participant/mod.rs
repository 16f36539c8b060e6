//! Participant adapter: routes engine deliveries to an application handler.
//!
//! The [`ParticipantAdapter`] sits between a transport and a [`Handler`]:
//! - `consume` runs on the transport's delivery task and forwards workitems,
//!   logging a trace summary or a full dump when the workitem asks for it;
//! - `cancel` and `stop` run on the control task and forward
//!   [`ControlSignal`]s;
//! - `send_to_engine` is the reply path, also reachable by the handler
//!   through the [`EngineReply`] installed into its [`ReplySlot`].
//!
//! The adapter keeps no per-call state, so all four entry points may run
//! concurrently.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

pub mod handler;
pub mod reply;
pub mod summary;

pub use handler::Handler;
pub use reply::{EngineReply, ReplySlot};
pub use summary::workitem_summary;

use crate::control::ControlSignal;
use crate::transport::{Transport, TransportError};
use crate::workitem::WorkItem;

/// Errors surfaced by the participant adapter.
#[derive(Debug, Error)]
pub enum ParticipantError {
    /// The handler failed; the error is passed through untouched.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
    /// The transport rejected a reply.
    #[error("reply to engine failed: {0}")]
    Transport(#[from] TransportError),
    /// The handler is already attached to an adapter.
    #[error("engine reply callback already installed on this handler")]
    ReplyAlreadyInstalled,
    /// No adapter has attached to the handler yet.
    #[error("engine reply callback not installed")]
    ReplyNotInstalled,
}

/// Bridges a transport's deliveries to one [`Handler`].
pub struct ParticipantAdapter<H: Handler> {
    name: Arc<str>,
    handler: Arc<H>,
    reply: EngineReply,
}

impl<H: Handler> std::fmt::Debug for ParticipantAdapter<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantAdapter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<H: Handler> ParticipantAdapter<H> {
    /// Attach `handler` to `transport` as participant `name`.
    ///
    /// Installs the engine reply callback into the handler's [`ReplySlot`].
    ///
    /// # Errors
    ///
    /// Returns [`ParticipantError::ReplyAlreadyInstalled`] when the handler
    /// already belongs to another adapter.
    pub fn new(
        name: impl Into<String>,
        handler: Arc<H>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ParticipantError> {
        let name: Arc<str> = Arc::from(name.into());
        let reply = EngineReply::new(Arc::clone(&name), transport);
        handler.reply_slot().install(reply.clone())?;
        debug!(participant = %name, "engine reply callback installed");

        Ok(Self {
            name,
            handler,
            reply,
        })
    }

    /// Participant name used in logs and replies.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handler this adapter dispatches to.
    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    /// Hand a newly delivered workitem to the handler.
    ///
    /// Logs the trace summary first (`fields.debug_trace`), then the dump
    /// (`fields.debug_dump` or `params.debug_dump`), then dispatches.
    ///
    /// # Errors
    ///
    /// Returns the handler's error as [`ParticipantError::Handler`].
    pub async fn consume(&self, workitem: WorkItem) -> Result<(), ParticipantError> {
        if workitem.debug_trace() {
            info!(participant = %self.name, "{}", workitem_summary(&workitem));
        }
        if workitem.debug_dump() {
            info!(participant = %self.name, "{}", workitem.dump());
        }
        self.handler.handle_work_item(workitem).await?;
        Ok(())
    }

    /// Tell the handler the engine cancelled `workitem`.
    ///
    /// # Errors
    ///
    /// Returns the handler's error as [`ParticipantError::Handler`].
    pub async fn cancel(&self, workitem: &WorkItem) -> Result<(), ParticipantError> {
        if let Some(fei) = &workitem.fei {
            debug!(participant = %self.name, fei = %fei, "cancel requested");
        }
        self.handler
            .handle_work_item_control(ControlSignal::cancel())
            .await?;
        Ok(())
    }

    /// Tell the handler the participant is shutting down.
    ///
    /// # Errors
    ///
    /// Returns the handler's error as [`ParticipantError::Handler`].
    pub async fn stop(&self, _workitem: &WorkItem) -> Result<(), ParticipantError> {
        self.lifecycle(ControlSignal::stop()).await
    }

    /// Forward a participant lifecycle signal (`start`, `stop`, `die`, ...).
    ///
    /// # Errors
    ///
    /// Returns the handler's error as [`ParticipantError::Handler`].
    pub async fn lifecycle(&self, signal: ControlSignal) -> Result<(), ParticipantError> {
        debug!(participant = %self.name, %signal, "lifecycle control");
        self.handler.handle_lifecycle_control(signal).await?;
        Ok(())
    }

    /// Send `workitem` back to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipantError::Transport`] when the reply is refused.
    pub fn send_to_engine(&self, workitem: WorkItem) -> Result<(), ParticipantError> {
        self.reply.send_to_engine(workitem)
    }
}
