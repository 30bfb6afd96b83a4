//! Owner Index
//!
//! Reverse lookups from a child id to the entity that owns it, kept in
//! step with every insert, delete and move so that commands addressed by a
//! child id never scan the whole tree.

use std::collections::HashMap;

use crate::error::{Result, StoreError};
use crate::models::{
    AttachmentId, Card, CardId, Checklist, ChecklistId, ChecklistItemId, CommentId, List, ListId,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerIndex {
    card_lists: HashMap<CardId, ListId>,
    checklist_cards: HashMap<ChecklistId, CardId>,
    item_checklists: HashMap<ChecklistItemId, ChecklistId>,
    attachment_cards: HashMap<AttachmentId, CardId>,
    comment_cards: HashMap<CommentId, CardId>,
}

impl OwnerIndex {
    pub fn build(lists: &[List]) -> Self {
        let mut index = Self::default();
        for list in lists {
            index.index_list(list);
        }
        index
    }

    pub fn index_list(&mut self, list: &List) {
        for card in &list.cards {
            self.index_card(list.id, card);
        }
    }

    pub fn forget_list(&mut self, list: &List) {
        for card in &list.cards {
            self.forget_card(card);
        }
    }

    pub fn index_card(&mut self, list_id: ListId, card: &Card) {
        self.card_lists.insert(card.id, list_id);
        for checklist in &card.checklists {
            self.index_checklist(card.id, checklist);
        }
        for attachment in &card.attachments {
            self.attachment_cards.insert(attachment.id, card.id);
        }
        for comment in &card.comments {
            self.comment_cards.insert(comment.id, card.id);
        }
    }

    pub fn forget_card(&mut self, card: &Card) {
        self.card_lists.remove(&card.id);
        for checklist in &card.checklists {
            self.forget_checklist(checklist);
        }
        for attachment in &card.attachments {
            self.attachment_cards.remove(&attachment.id);
        }
        for comment in &card.comments {
            self.comment_cards.remove(&comment.id);
        }
    }

    /// Record that a card now lives in another list
    pub fn move_card(&mut self, card_id: CardId, list_id: ListId) {
        self.card_lists.insert(card_id, list_id);
    }

    pub fn index_checklist(&mut self, card_id: CardId, checklist: &Checklist) {
        self.checklist_cards.insert(checklist.id, card_id);
        for item in &checklist.items {
            self.item_checklists.insert(item.id, checklist.id);
        }
    }

    pub fn forget_checklist(&mut self, checklist: &Checklist) {
        self.checklist_cards.remove(&checklist.id);
        for item in &checklist.items {
            self.item_checklists.remove(&item.id);
        }
    }

    pub fn index_item(&mut self, checklist_id: ChecklistId, item_id: ChecklistItemId) {
        self.item_checklists.insert(item_id, checklist_id);
    }

    pub fn forget_item(&mut self, item_id: ChecklistItemId) {
        self.item_checklists.remove(&item_id);
    }

    pub fn index_attachment(&mut self, card_id: CardId, attachment_id: AttachmentId) {
        self.attachment_cards.insert(attachment_id, card_id);
    }

    pub fn forget_attachment(&mut self, attachment_id: AttachmentId) {
        self.attachment_cards.remove(&attachment_id);
    }

    pub fn index_comment(&mut self, card_id: CardId, comment_id: CommentId) {
        self.comment_cards.insert(comment_id, card_id);
    }

    pub fn forget_comment(&mut self, comment_id: CommentId) {
        self.comment_cards.remove(&comment_id);
    }

    pub fn card_list(&self, card_id: CardId) -> Result<ListId> {
        self.card_lists
            .get(&card_id)
            .copied()
            .ok_or_else(|| StoreError::not_found("card", card_id))
    }

    pub fn checklist_card(&self, checklist_id: ChecklistId) -> Result<CardId> {
        self.checklist_cards
            .get(&checklist_id)
            .copied()
            .ok_or_else(|| StoreError::not_found("checklist", checklist_id))
    }

    pub fn item_checklist(&self, item_id: ChecklistItemId) -> Result<ChecklistId> {
        self.item_checklists
            .get(&item_id)
            .copied()
            .ok_or_else(|| StoreError::not_found("checklist item", item_id))
    }

    pub fn attachment_card(&self, attachment_id: AttachmentId) -> Result<CardId> {
        self.attachment_cards
            .get(&attachment_id)
            .copied()
            .ok_or_else(|| StoreError::not_found("attachment", attachment_id))
    }

    pub fn comment_card(&self, comment_id: CommentId) -> Result<CardId> {
        self.comment_cards
            .get(&comment_id)
            .copied()
            .ok_or_else(|| StoreError::not_found("comment", comment_id))
    }

    pub fn card_count(&self) -> usize {
        self.card_lists.len()
    }
}
