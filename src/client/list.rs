//! List commands
//!
//! All of them act on the list collection of the active board.

use crate::error::{Result, StoreError};
use crate::models::{BoardId, List, ListId};
use crate::normalize;
use crate::remote::requests::validate_batch;
use crate::remote::{ListChanges, ListPosition, NewList, RemoteApi};
use crate::status::{OperationKey, OperationKind};
use crate::versions::Container;

use super::{rejected, KanbanClient, Reconciled};

impl<A: RemoteApi> KanbanClient<A> {
    /// Load a board's lists with their cards; the only full replace of `lists`
    pub async fn fetch_lists(&self, board_id: BoardId) -> Result<Vec<List>> {
        let kind = OperationKind::FetchLists;
        self.track(OperationKey::new(kind, board_id), async {
            let payloads = self.api.list_lists(board_id).await.map_err(rejected(kind))?;
            let lists = normalize::lists(payloads, board_id);
            tracing::info!(board_id, count = lists.len(), "lists loaded");
            self.write(|state| {
                state.set_lists(board_id, lists);
                state.lists.clone()
            })
        })
        .await
    }

    pub async fn create_list(&self, list: NewList) -> Result<List> {
        let kind = OperationKind::CreateList;
        self.track(self.board_key(kind), async {
            list.validate()?;
            let board_id = self.resolve(|state| state.active_board_id())?;
            let payload = self
                .api
                .create_list(board_id, &list)
                .await
                .map_err(rejected(kind))?;
            let created = normalize::list(payload, board_id);
            tracing::info!(board_id, list_id = created.id, "list created");
            self.write(|state| {
                if state.lists_board_id == Some(board_id) {
                    state.insert_list(created.clone());
                } else {
                    tracing::warn!(board_id, list_id = created.id, "board changed before list creation settled");
                }
            })?;
            Ok(created)
        })
        .await
    }

    pub async fn update_list(&self, list_id: ListId, changes: ListChanges) -> Result<List> {
        let kind = OperationKind::UpdateList;
        self.track(OperationKey::new(kind, list_id), async {
            changes.validate()?;
            let board_id = self.resolve(|state| {
                state.list(list_id)?;
                state.active_board_id()
            })?;
            let payload = self
                .api
                .update_list(board_id, list_id, &changes)
                .await
                .map_err(rejected(kind))?;
            let merged = self.merge(|state| state.merge_list(payload))?;
            tracing::info!(board_id, list_id, "list updated");
            Ok(merged)
        })
        .await
    }

    pub async fn delete_list(&self, list_id: ListId) -> Result<()> {
        let kind = OperationKind::DeleteList;
        self.track(OperationKey::new(kind, list_id), async {
            let board_id = self.resolve(|state| {
                state.list(list_id)?;
                state.active_board_id()
            })?;
            self.api
                .delete_list(board_id, list_id)
                .await
                .map_err(rejected(kind))?;
            self.merge(|state| state.remove_list(list_id))?;
            tracing::info!(board_id, list_id, "list deleted");
            Ok(())
        })
        .await
    }

    /// Send the full list order of the active board.
    ///
    /// The batch must name every list once with positions 0..n-1.
    pub async fn reorder_lists(&self, order: Vec<ListPosition>) -> Result<Reconciled> {
        let kind = OperationKind::ReorderLists;
        self.track_positional(self.board_key(kind), async {
            validate_batch("lists", order.iter().map(|p| (p.id, p.position)))?;
            let board_id = self.resolve(|state| {
                if order.len() != state.lists.len() {
                    return Err(StoreError::invalid("lists", "batch must name every list of the board"));
                }
                for entry in &order {
                    state.list(entry.id)?;
                }
                state.active_board_id()
            })?;

            let ticket = self.write(|state| state.versions.issue(Container::Board(board_id)))?;
            tracing::debug!(board_id, lists = order.len(), "reordering lists");
            let payloads = self
                .api
                .reorder_lists(board_id, &order)
                .await
                .map_err(rejected(kind))?;

            self.write(|state| {
                if state.lists_board_id != Some(board_id) || !state.versions.is_current(&ticket) {
                    return Reconciled::Superseded;
                }
                state.versions.commit(&ticket);
                state.apply_list_order(board_id, payloads);
                tracing::info!(board_id, "list order applied");
                Reconciled::Applied
            })
        })
        .await
    }
}
