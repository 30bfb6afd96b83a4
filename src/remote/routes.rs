//! Resource Paths
//!
//! Identifiers are written in their canonical decimal string form.

use crate::models::{
    AttachmentId, BoardId, CardId, ChecklistId, ChecklistItemId, CommentId, LabelId, ListId, UserId,
};

pub const BOARDS: &str = "/boards";
pub const USERS: &str = "/users";

pub fn board(board_id: BoardId) -> String {
    format!("/boards/{}", board_id)
}

pub fn board_members(board_id: BoardId) -> String {
    format!("/boards/{}/members", board_id)
}

pub fn board_member(board_id: BoardId, user_id: UserId) -> String {
    format!("/boards/{}/members/{}", board_id, user_id)
}

pub fn lists(board_id: BoardId) -> String {
    format!("/boards/{}/lists", board_id)
}

pub fn list(board_id: BoardId, list_id: ListId) -> String {
    format!("/boards/{}/lists/{}", board_id, list_id)
}

pub fn list_reorder(board_id: BoardId) -> String {
    format!("/boards/{}/lists/reorder", board_id)
}

pub fn cards(list_id: ListId) -> String {
    format!("/lists/{}/cards", list_id)
}

pub fn card(list_id: ListId, card_id: CardId) -> String {
    format!("/lists/{}/cards/{}", list_id, card_id)
}

pub fn card_reorder(list_id: ListId) -> String {
    format!("/lists/{}/cards/reorder", list_id)
}

pub fn card_members(card_id: CardId) -> String {
    format!("/cards/{}/members", card_id)
}

pub fn card_member(card_id: CardId, user_id: UserId) -> String {
    format!("/cards/{}/members/{}", card_id, user_id)
}

pub fn labels(card_id: CardId) -> String {
    format!("/cards/{}/labels", card_id)
}

pub fn label(card_id: CardId, label_id: LabelId) -> String {
    format!("/cards/{}/labels/{}", card_id, label_id)
}

pub fn checklists(card_id: CardId) -> String {
    format!("/cards/{}/checklists", card_id)
}

pub fn checklist(card_id: CardId, checklist_id: ChecklistId) -> String {
    format!("/cards/{}/checklists/{}", card_id, checklist_id)
}

pub fn checklist_items(card_id: CardId, checklist_id: ChecklistId) -> String {
    format!("/cards/{}/checklists/{}/items", card_id, checklist_id)
}

pub fn checklist_item(card_id: CardId, checklist_id: ChecklistId, item_id: ChecklistItemId) -> String {
    format!("/cards/{}/checklists/{}/items/{}", card_id, checklist_id, item_id)
}

pub fn attachments(card_id: CardId) -> String {
    format!("/cards/{}/attachments", card_id)
}

pub fn attachment(card_id: CardId, attachment_id: AttachmentId) -> String {
    format!("/cards/{}/attachments/{}", card_id, attachment_id)
}

pub fn comments(card_id: CardId) -> String {
    format!("/cards/{}/comments", card_id)
}

pub fn comment(card_id: CardId, comment_id: CommentId) -> String {
    format!("/cards/{}/comments/{}", card_id, comment_id)
}
