//! Built-in echo participant used by `skynet run`.
//!
//! Replies to every workitem unchanged apart from `fields.__result__ = true`.
//! The reply is sent from a spawned task through the reply slot, the same way
//! a real handler finishing work in the background would.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::control::ControlSignal;
use crate::participant::{Handler, ReplySlot};
use crate::workitem::WorkItem;

/// Handler that completes each workitem immediately.
#[derive(Debug, Default)]
pub struct EchoHandler {
    slot: ReplySlot,
}

impl EchoHandler {
    /// Create an echo handler with an empty reply slot.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Handler for EchoHandler {
    async fn handle_work_item(&self, mut workitem: WorkItem) -> anyhow::Result<()> {
        let reply = self
            .slot
            .reply()
            .ok_or_else(|| anyhow::anyhow!("echo handler is not attached to a participant"))?;

        tokio::spawn(async move {
            workitem.set_result(true);
            if let Err(e) = reply.send_to_engine(workitem) {
                warn!(error = %e, "echo reply was not delivered");
            }
        });
        Ok(())
    }

    async fn handle_work_item_control(&self, signal: ControlSignal) -> anyhow::Result<()> {
        info!(%signal, "echo participant has nothing to cancel");
        Ok(())
    }

    async fn handle_lifecycle_control(&self, signal: ControlSignal) -> anyhow::Result<()> {
        info!(%signal, "echo participant lifecycle");
        Ok(())
    }

    fn reply_slot(&self) -> &ReplySlot {
        &self.slot
    }
}
