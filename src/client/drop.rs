//! Drag and drop entry point

use crate::error::Result;
use crate::remote::RemoteApi;
use crate::reorder::{plan_drop, DragResult, DropPlan};

use super::{KanbanClient, Reconciled};

impl<A: RemoteApi> KanbanClient<A> {
    /// Turn a finished drag into the matching positional command.
    ///
    /// `Ok(None)` means nothing was sent: the drag was cancelled or the item
    /// was dropped back where it started.
    pub async fn handle_drop(&self, drag: DragResult) -> Result<Option<Reconciled>> {
        let plan = self
            .resolve(|state| plan_drop(state.active_board_id()?, &state.lists, &drag))
            .inspect_err(|err| tracing::warn!(error = %err, ?drag, "rejected drop"))?;

        let Some(plan) = plan else {
            tracing::debug!(?drag, "drop needs no update");
            return Ok(None);
        };

        let reconciled = match plan {
            DropPlan::ReorderLists { order, .. } => self.reorder_lists(order).await?,
            DropPlan::ReorderCards { list_id, order } => self.reorder_cards(list_id, order).await?,
            DropPlan::MoveCard {
                card_id,
                source_list_id,
                target_list_id,
                position,
            } => {
                self.move_card(card_id, source_list_id, target_list_id, position)
                    .await?
            }
        };
        Ok(Some(reconciled))
    }
}
