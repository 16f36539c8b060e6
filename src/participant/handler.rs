//! Application-side handler contract.

use async_trait::async_trait;
use tracing::debug;

use super::reply::ReplySlot;
use crate::control::ControlSignal;
use crate::workitem::WorkItem;

/// Business logic run by a participant.
///
/// The adapter calls [`Handler::handle_work_item`] from the delivery task and
/// the two control entry points from the control task; they may overlap.
/// A handler that finishes work elsewhere replies through its
/// [`ReplySlot`], which the adapter fills once at construction.
///
/// Control entry points must return quickly. Errors from any entry point are
/// passed back to the transport unchanged.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Process a workitem delivered to this participant.
    async fn handle_work_item(&self, workitem: WorkItem) -> anyhow::Result<()>;

    /// React to a per-workitem control signal such as `cancel`.
    async fn handle_work_item_control(&self, signal: ControlSignal) -> anyhow::Result<()> {
        debug!(%signal, "work item control ignored");
        Ok(())
    }

    /// React to a participant lifecycle signal such as `stop`.
    async fn handle_lifecycle_control(&self, signal: ControlSignal) -> anyhow::Result<()> {
        debug!(%signal, "lifecycle control ignored");
        Ok(())
    }

    /// Slot the adapter installs the engine reply callback into.
    fn reply_slot(&self) -> &ReplySlot;
}
