//! Attachment commands

use crate::error::Result;
use crate::models::{Attachment, AttachmentId, CardId};
use crate::remote::{NewAttachment, RemoteApi};
use crate::status::{OperationKey, OperationKind};

use super::{rejected, KanbanClient};

impl<A: RemoteApi> KanbanClient<A> {
    pub async fn create_attachment(&self, card_id: CardId, attachment: NewAttachment) -> Result<Attachment> {
        let kind = OperationKind::CreateAttachment;
        self.track(OperationKey::new(kind, card_id), async {
            attachment.validate()?;
            self.resolve(|state| state.card(card_id).map(|_| ()))?;
            let created = self
                .api
                .create_attachment(card_id, &attachment)
                .await
                .map_err(rejected(kind))?;
            let created = Attachment { card_id, ..created };
            self.merge(|state| state.insert_attachment(card_id, created.clone()))?;
            tracing::info!(card_id, attachment_id = created.id, "attachment created");
            Ok(created)
        })
        .await
    }

    pub async fn delete_attachment(&self, attachment_id: AttachmentId) -> Result<()> {
        let kind = OperationKind::DeleteAttachment;
        self.track(OperationKey::new(kind, attachment_id), async {
            let card_id = self.resolve(|state| state.owners.attachment_card(attachment_id))?;
            self.api
                .delete_attachment(card_id, attachment_id)
                .await
                .map_err(rejected(kind))?;
            self.merge(|state| state.remove_attachment(attachment_id))?;
            tracing::info!(card_id, attachment_id, "attachment deleted");
            Ok(())
        })
        .await
    }
}
