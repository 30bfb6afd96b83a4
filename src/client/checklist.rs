//! Checklist and checklist item commands
//!
//! Commands addressed by a checklist or item id find the owning card through
//! the owner index; a miss fails before the remote is called.

use crate::error::Result;
use crate::models::{CardId, Checklist, ChecklistId, ChecklistItem, ChecklistItemId};
use crate::normalize;
use crate::remote::{ChecklistChanges, ChecklistItemChanges, NewChecklist, NewChecklistItem, RemoteApi};
use crate::status::{OperationKey, OperationKind};

use super::{rejected, KanbanClient};

impl<A: RemoteApi> KanbanClient<A> {
    pub async fn create_checklist(&self, card_id: CardId, checklist: NewChecklist) -> Result<Checklist> {
        let kind = OperationKind::CreateChecklist;
        self.track(OperationKey::new(kind, card_id), async {
            checklist.validate()?;
            self.resolve(|state| state.card(card_id).map(|_| ()))?;
            let payload = self
                .api
                .create_checklist(card_id, &checklist)
                .await
                .map_err(rejected(kind))?;
            let created = normalize::checklist(payload, card_id);
            self.merge(|state| state.insert_checklist(created.clone()))?;
            tracing::info!(card_id, checklist_id = created.id, "checklist created");
            Ok(created)
        })
        .await
    }

    pub async fn update_checklist(&self, checklist_id: ChecklistId, changes: ChecklistChanges) -> Result<Checklist> {
        let kind = OperationKind::UpdateChecklist;
        self.track(OperationKey::new(kind, checklist_id), async {
            changes.validate()?;
            let card_id = self.resolve(|state| state.owners.checklist_card(checklist_id))?;
            let payload = self
                .api
                .update_checklist(card_id, checklist_id, &changes)
                .await
                .map_err(rejected(kind))?;
            let merged = self.merge(|state| state.merge_checklist(card_id, payload))?;
            tracing::info!(card_id, checklist_id, "checklist updated");
            Ok(merged)
        })
        .await
    }

    pub async fn delete_checklist(&self, checklist_id: ChecklistId) -> Result<()> {
        let kind = OperationKind::DeleteChecklist;
        self.track(OperationKey::new(kind, checklist_id), async {
            let card_id = self.resolve(|state| state.owners.checklist_card(checklist_id))?;
            self.api
                .delete_checklist(card_id, checklist_id)
                .await
                .map_err(rejected(kind))?;
            self.merge(|state| state.remove_checklist(checklist_id))?;
            tracing::info!(card_id, checklist_id, "checklist deleted");
            Ok(())
        })
        .await
    }

    pub async fn create_checklist_item(
        &self,
        checklist_id: ChecklistId,
        item: NewChecklistItem,
    ) -> Result<ChecklistItem> {
        let kind = OperationKind::CreateChecklistItem;
        self.track(OperationKey::new(kind, checklist_id), async {
            item.validate()?;
            let card_id = self.resolve(|state| state.owners.checklist_card(checklist_id))?;
            let created = self
                .api
                .create_checklist_item(card_id, checklist_id, &item)
                .await
                .map_err(rejected(kind))?;
            self.merge(|state| state.insert_item(checklist_id, created.clone()))?;
            tracing::info!(card_id, checklist_id, item_id = created.id, "checklist item created");
            Ok(ChecklistItem {
                checklist_id,
                ..created
            })
        })
        .await
    }

    /// Rename or toggle an item
    pub async fn update_checklist_item(
        &self,
        item_id: ChecklistItemId,
        changes: ChecklistItemChanges,
    ) -> Result<ChecklistItem> {
        let kind = OperationKind::UpdateChecklistItem;
        self.track(OperationKey::new(kind, item_id), async {
            changes.validate()?;
            let (card_id, checklist_id) = self.resolve(|state| {
                let checklist_id = state.owners.item_checklist(item_id)?;
                Ok((state.owners.checklist_card(checklist_id)?, checklist_id))
            })?;
            let updated = self
                .api
                .update_checklist_item(card_id, checklist_id, item_id, &changes)
                .await
                .map_err(rejected(kind))?;
            let merged = self.merge(|state| state.merge_item(checklist_id, updated))?;
            tracing::info!(card_id, checklist_id, item_id, completed = merged.completed, "checklist item updated");
            Ok(merged)
        })
        .await
    }

    pub async fn delete_checklist_item(&self, item_id: ChecklistItemId) -> Result<()> {
        let kind = OperationKind::DeleteChecklistItem;
        self.track(OperationKey::new(kind, item_id), async {
            let (card_id, checklist_id) = self.resolve(|state| {
                let checklist_id = state.owners.item_checklist(item_id)?;
                Ok((state.owners.checklist_card(checklist_id)?, checklist_id))
            })?;
            self.api
                .delete_checklist_item(card_id, checklist_id, item_id)
                .await
                .map_err(rejected(kind))?;
            self.merge(|state| state.remove_item(item_id))?;
            tracing::info!(card_id, checklist_id, item_id, "checklist item deleted");
            Ok(())
        })
        .await
    }
}
