//! Label commands

use crate::error::{Result, StoreError};
use crate::models::{CardId, Label, LabelId};
use crate::remote::{NewLabel, RemoteApi};
use crate::status::{OperationKey, OperationKind};

use super::{rejected, KanbanClient};

impl<A: RemoteApi> KanbanClient<A> {
    pub async fn attach_label(&self, card_id: CardId, label: NewLabel) -> Result<Label> {
        let kind = OperationKind::AttachLabel;
        self.track(OperationKey::new(kind, card_id), async {
            label.validate()?;
            self.resolve(|state| state.card(card_id).map(|_| ()))?;
            let attached = self
                .api
                .attach_label(card_id, &label)
                .await
                .map_err(rejected(kind))?;
            self.merge(|state| state.add_label(card_id, attached.clone()))?;
            tracing::info!(card_id, label_id = attached.id, "label attached");
            Ok(attached)
        })
        .await
    }

    pub async fn detach_label(&self, card_id: CardId, label_id: LabelId) -> Result<()> {
        let kind = OperationKind::DetachLabel;
        self.track(OperationKey::new(kind, card_id), async {
            self.resolve(|state| {
                let card = state.card(card_id)?;
                if card.labels.iter().any(|l| l.id == label_id) {
                    Ok(())
                } else {
                    Err(StoreError::not_found("label", label_id))
                }
            })?;
            self.api
                .detach_label(card_id, label_id)
                .await
                .map_err(rejected(kind))?;
            self.merge(|state| state.remove_label(card_id, label_id))?;
            tracing::info!(card_id, label_id, "label detached");
            Ok(())
        })
        .await
    }
}
