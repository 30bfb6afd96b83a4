//! Card detail merges: labels, members, checklists and their items,
//! attachments and comments. Owners are resolved through the index.

use crate::error::{Result, StoreError};
use crate::index::OwnerIndex;
use crate::models::{
    remove_by_id, replace_by_id, Attachment, AttachmentId, Card, CardId, Checklist, ChecklistId,
    ChecklistItem, ChecklistItemId, Comment, CommentId, Label, LabelId, UserSummary,
};
use crate::normalize;
use crate::remote::ChecklistPayload;

use super::KanbanState;

impl KanbanState {
    /// Run a mutation on one card, located through the owner index
    pub(crate) fn edit_card<R>(
        &mut self,
        card_id: CardId,
        edit: impl FnOnce(&mut Card, &mut OwnerIndex) -> Result<R>,
    ) -> Result<R> {
        let list_id = self.owners.card_list(card_id)?;
        self.edit_lists(|lists, owners| {
            let card = lists
                .iter_mut()
                .find(|l| l.id == list_id)
                .and_then(|l| l.card_mut(card_id))
                .ok_or_else(|| StoreError::not_found("card", card_id))?;
            edit(card, owners)
        })
    }

    pub fn card(&self, card_id: CardId) -> Result<&Card> {
        let list_id = self.owners.card_list(card_id)?;
        self.list(list_id)?
            .card(card_id)
            .ok_or_else(|| StoreError::not_found("card", card_id))
    }

    // ========================
    // Labels & members
    // ========================

    pub fn add_label(&mut self, card_id: CardId, label: Label) -> Result<()> {
        self.edit_card(card_id, |card, _| {
            if !replace_by_id(&mut card.labels, label.clone()) {
                card.labels.push(label);
            }
            Ok(())
        })
    }

    pub fn remove_label(&mut self, card_id: CardId, label_id: LabelId) -> Result<()> {
        self.edit_card(card_id, |card, _| {
            remove_by_id(&mut card.labels, label_id)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found("label", label_id))
        })
    }

    pub fn set_card_members(&mut self, card_id: CardId, members: Vec<UserSummary>) -> Result<()> {
        self.edit_card(card_id, |card, _| {
            card.members = members;
            Ok(())
        })
    }

    // ========================
    // Checklists
    // ========================

    pub fn insert_checklist(&mut self, checklist: Checklist) -> Result<()> {
        self.edit_card(checklist.card_id, |card, owners| {
            owners.index_checklist(card.id, &checklist);
            card.checklists.push(checklist);
            Ok(())
        })
    }

    /// Title always, items only when the response carries them
    pub fn merge_checklist(&mut self, card_id: CardId, payload: ChecklistPayload) -> Result<Checklist> {
        self.edit_card(card_id, |card, owners| {
            let existing = card
                .checklist_mut(payload.id)
                .ok_or_else(|| StoreError::not_found("checklist", payload.id))?;
            if payload.items.is_some() {
                let updated = normalize::checklist(payload, card_id);
                owners.forget_checklist(existing);
                owners.index_checklist(card_id, &updated);
                *existing = updated;
            } else {
                existing.title = payload.title;
            }
            Ok(existing.clone())
        })
    }

    pub fn remove_checklist(&mut self, checklist_id: ChecklistId) -> Result<()> {
        let card_id = self.owners.checklist_card(checklist_id)?;
        self.edit_card(card_id, |card, owners| {
            let removed = remove_by_id(&mut card.checklists, checklist_id)
                .ok_or_else(|| StoreError::not_found("checklist", checklist_id))?;
            owners.forget_checklist(&removed);
            Ok(())
        })
    }

    /// Run a mutation on one checklist, located through the owner index
    fn edit_checklist<R>(
        &mut self,
        checklist_id: ChecklistId,
        edit: impl FnOnce(&mut Checklist, &mut OwnerIndex) -> Result<R>,
    ) -> Result<R> {
        let card_id = self.owners.checklist_card(checklist_id)?;
        self.edit_card(card_id, |card, owners| {
            let checklist = card
                .checklist_mut(checklist_id)
                .ok_or_else(|| StoreError::not_found("checklist", checklist_id))?;
            edit(checklist, owners)
        })
    }

    pub fn insert_item(&mut self, checklist_id: ChecklistId, mut item: ChecklistItem) -> Result<()> {
        item.checklist_id = checklist_id;
        self.edit_checklist(checklist_id, |checklist, owners| {
            owners.index_item(checklist_id, item.id);
            checklist.items.push(item);
            Ok(())
        })
    }

    pub fn merge_item(&mut self, checklist_id: ChecklistId, mut item: ChecklistItem) -> Result<ChecklistItem> {
        item.checklist_id = checklist_id;
        self.edit_checklist(checklist_id, |checklist, _| {
            let item_id = item.id;
            if !replace_by_id(&mut checklist.items, item.clone()) {
                return Err(StoreError::not_found("checklist item", item_id));
            }
            Ok(item)
        })
    }

    pub fn remove_item(&mut self, item_id: ChecklistItemId) -> Result<()> {
        let checklist_id = self.owners.item_checklist(item_id)?;
        self.edit_checklist(checklist_id, |checklist, owners| {
            remove_by_id(&mut checklist.items, item_id)
                .ok_or_else(|| StoreError::not_found("checklist item", item_id))?;
            owners.forget_item(item_id);
            Ok(())
        })
    }

    // ========================
    // Attachments & comments
    // ========================

    pub fn insert_attachment(&mut self, card_id: CardId, mut attachment: Attachment) -> Result<()> {
        attachment.card_id = card_id;
        self.edit_card(card_id, |card, owners| {
            owners.index_attachment(card_id, attachment.id);
            card.attachments.push(attachment);
            Ok(())
        })
    }

    pub fn remove_attachment(&mut self, attachment_id: AttachmentId) -> Result<()> {
        let card_id = self.owners.attachment_card(attachment_id)?;
        self.edit_card(card_id, |card, owners| {
            remove_by_id(&mut card.attachments, attachment_id)
                .ok_or_else(|| StoreError::not_found("attachment", attachment_id))?;
            owners.forget_attachment(attachment_id);
            Ok(())
        })
    }

    pub fn insert_comment(&mut self, card_id: CardId, mut comment: Comment) -> Result<()> {
        comment.card_id = card_id;
        self.edit_card(card_id, |card, owners| {
            owners.index_comment(card_id, comment.id);
            card.comments.push(comment);
            Ok(())
        })
    }

    /// Edits replace the comment in place
    pub fn merge_comment(&mut self, mut comment: Comment) -> Result<Comment> {
        let card_id = self.owners.comment_card(comment.id)?;
        comment.card_id = card_id;
        self.edit_card(card_id, |card, _| {
            let comment_id = comment.id;
            if !replace_by_id(&mut card.comments, comment.clone()) {
                return Err(StoreError::not_found("comment", comment_id));
            }
            Ok(comment)
        })
    }

    pub fn remove_comment(&mut self, comment_id: CommentId) -> Result<()> {
        let card_id = self.owners.comment_card(comment_id)?;
        self.edit_card(card_id, |card, owners| {
            remove_by_id(&mut card.comments, comment_id)
                .ok_or_else(|| StoreError::not_found("comment", comment_id))?;
            owners.forget_comment(comment_id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{assert_lockstep, todo_done};
    use super::*;

    fn checklist(id: ChecklistId, card_id: CardId) -> Checklist {
        Checklist {
            id,
            title: "Steps".to_string(),
            card_id,
            items: Vec::new(),
        }
    }

    fn item(id: ChecklistItemId, title: &str) -> ChecklistItem {
        ChecklistItem {
            id,
            title: title.to_string(),
            completed: false,
            checklist_id: 0,
        }
    }

    #[test]
    fn test_checklist_item_lifecycle() {
        let mut state = todo_done();
        state.insert_checklist(checklist(30, 11)).unwrap();
        state.insert_item(30, item(31, "draft")).unwrap();
        assert_eq!(state.owners.item_checklist(31).unwrap(), 30);

        let mut toggled = item(31, "draft");
        toggled.completed = true;
        state.merge_item(30, toggled).unwrap();
        assert!(state.card(11).unwrap().checklists[0].items[0].completed);
        assert_lockstep(&state);

        state.remove_item(31).unwrap();
        assert!(state.owners.item_checklist(31).is_err());
        state.remove_checklist(30).unwrap();
        assert!(state.card(11).unwrap().checklists.is_empty());
        assert_lockstep(&state);
    }

    #[test]
    fn test_unknown_checklist_is_not_found() {
        let mut state = todo_done();
        assert_eq!(
            state.insert_item(99, item(1, "x")).unwrap_err(),
            StoreError::not_found("checklist", 99)
        );
    }

    #[test]
    fn test_merge_checklist_keeps_items_when_absent() {
        let mut state = todo_done();
        let mut with_item = checklist(30, 10);
        with_item.items.push(item(31, "draft"));
        state.insert_checklist(with_item).unwrap();

        let merged = state
            .merge_checklist(
                10,
                ChecklistPayload {
                    id: 30,
                    title: "Renamed".to_string(),
                    card_id: Some(10),
                    items: None,
                },
            )
            .unwrap();
        assert_eq!(merged.title, "Renamed");
        assert_eq!(merged.items.len(), 1);
    }

    #[test]
    fn test_labels_attach_and_detach() {
        let mut state = todo_done();
        let label = Label {
            id: 5,
            name: "bug".to_string(),
            color: "#f00".to_string(),
        };
        state.add_label(10, label.clone()).unwrap();
        state.add_label(10, label).unwrap();
        assert_eq!(state.card(10).unwrap().labels.len(), 1);
        state.remove_label(10, 5).unwrap();
        assert!(state.remove_label(10, 5).is_err());
        assert_lockstep(&state);
    }

    #[test]
    fn test_comment_edit_replaces_in_place() {
        let mut state = todo_done();
        let comment = Comment {
            id: 40,
            content: "first".to_string(),
            card_id: 0,
            user_id: None,
            author: None,
            created_at: None,
            updated_at: None,
        };
        state.insert_comment(10, comment.clone()).unwrap();
        let edited = state
            .merge_comment(Comment {
                content: "edited".to_string(),
                ..comment
            })
            .unwrap();
        assert_eq!(edited.card_id, 10);
        assert_eq!(state.card(10).unwrap().comments[0].content, "edited");

        state.remove_comment(40).unwrap();
        assert!(state.owners.comment_card(40).is_err());
    }

    #[test]
    fn test_attachment_owner_tracked() {
        let mut state = todo_done();
        state
            .insert_attachment(
                11,
                Attachment {
                    id: 50,
                    filename: "spec.pdf".to_string(),
                    url: "/files/spec.pdf".to_string(),
                    card_id: 0,
                },
            )
            .unwrap();
        assert_eq!(state.owners.attachment_card(50).unwrap(), 11);
        state.remove_attachment(50).unwrap();
        assert!(state.card(11).unwrap().attachments.is_empty());
    }
}
