//! Comment commands

use crate::error::Result;
use crate::models::{CardId, Comment, CommentId};
use crate::remote::{CommentChanges, NewComment, RemoteApi};
use crate::status::{OperationKey, OperationKind};

use super::{rejected, KanbanClient};

impl<A: RemoteApi> KanbanClient<A> {
    pub async fn create_comment(&self, card_id: CardId, comment: NewComment) -> Result<Comment> {
        let kind = OperationKind::CreateComment;
        self.track(OperationKey::new(kind, card_id), async {
            comment.validate()?;
            self.resolve(|state| state.card(card_id).map(|_| ()))?;
            let created = self
                .api
                .create_comment(card_id, &comment)
                .await
                .map_err(rejected(kind))?;
            let created = Comment { card_id, ..created };
            self.merge(|state| state.insert_comment(card_id, created.clone()))?;
            tracing::info!(card_id, comment_id = created.id, "comment created");
            Ok(created)
        })
        .await
    }

    pub async fn update_comment(&self, comment_id: CommentId, changes: CommentChanges) -> Result<Comment> {
        let kind = OperationKind::UpdateComment;
        self.track(OperationKey::new(kind, comment_id), async {
            changes.validate()?;
            let card_id = self.resolve(|state| state.owners.comment_card(comment_id))?;
            let updated = self
                .api
                .update_comment(card_id, comment_id, &changes)
                .await
                .map_err(rejected(kind))?;
            let merged = self.merge(|state| state.merge_comment(updated))?;
            tracing::info!(card_id, comment_id, "comment updated");
            Ok(merged)
        })
        .await
    }

    pub async fn delete_comment(&self, comment_id: CommentId) -> Result<()> {
        let kind = OperationKind::DeleteComment;
        self.track(OperationKey::new(kind, comment_id), async {
            let card_id = self.resolve(|state| state.owners.comment_card(comment_id))?;
            self.api
                .delete_comment(card_id, comment_id)
                .await
                .map_err(rejected(kind))?;
            self.merge(|state| state.remove_comment(comment_id))?;
            tracing::info!(card_id, comment_id, "comment deleted");
            Ok(())
        })
        .await
    }
}
