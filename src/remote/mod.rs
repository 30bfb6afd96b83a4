//! Remote Collaborator
//!
//! The server-side API the store mutates through. Every call takes typed
//! request data and returns the canonical server representation.
//! Implementations: `HttpRemote` over any `Transport`, and `MemoryRemote`.

mod http;
mod memory;
pub mod payload;
pub mod requests;
pub mod routes;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::{
    Attachment, AttachmentId, BoardId, CardId, ChecklistId, ChecklistItem, ChecklistItemId, Comment,
    CommentId, Label, LabelId, ListId, UserId, UserSummary,
};

pub use http::{HttpRemote, Method, ReqwestTransport, Transport};
pub use memory::MemoryRemote;
pub use payload::{
    BoardPayload, CardMembersPayload, CardPayload, ChecklistPayload, ListPayload, MemberPayload,
    MemberPivot, MembersPayload,
};
pub use requests::{
    BoardChanges, CardChanges, CardPosition, ChecklistChanges, ChecklistItemChanges, CommentChanges,
    ListChanges, ListPosition, NewAttachment, NewBoard, NewCard, NewCardMember, NewChecklist,
    NewChecklistItem, NewComment, NewLabel, NewList, NewMember,
};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Logical operations of the server API
#[async_trait]
pub trait RemoteApi: Send + Sync {
    // Boards
    async fn list_boards(&self) -> RemoteResult<Vec<BoardPayload>>;
    async fn get_board(&self, board_id: BoardId) -> RemoteResult<BoardPayload>;
    async fn create_board(&self, board: &NewBoard) -> RemoteResult<BoardPayload>;
    async fn update_board(&self, board_id: BoardId, changes: &BoardChanges) -> RemoteResult<BoardPayload>;
    async fn delete_board(&self, board_id: BoardId) -> RemoteResult<()>;
    async fn add_board_member(&self, board_id: BoardId, member: &NewMember) -> RemoteResult<MembersPayload>;
    async fn remove_board_member(&self, board_id: BoardId, user_id: UserId) -> RemoteResult<MembersPayload>;

    // Users
    async fn list_users(&self) -> RemoteResult<Vec<UserSummary>>;

    // Lists
    async fn list_lists(&self, board_id: BoardId) -> RemoteResult<Vec<ListPayload>>;
    async fn create_list(&self, board_id: BoardId, list: &NewList) -> RemoteResult<ListPayload>;
    async fn update_list(
        &self,
        board_id: BoardId,
        list_id: ListId,
        changes: &ListChanges,
    ) -> RemoteResult<ListPayload>;
    async fn delete_list(&self, board_id: BoardId, list_id: ListId) -> RemoteResult<()>;
    async fn reorder_lists(&self, board_id: BoardId, order: &[ListPosition]) -> RemoteResult<Vec<ListPayload>>;

    // Cards
    async fn list_cards(&self, list_id: ListId) -> RemoteResult<Vec<CardPayload>>;
    async fn create_card(&self, list_id: ListId, card: &NewCard) -> RemoteResult<CardPayload>;
    async fn update_card(
        &self,
        list_id: ListId,
        card_id: CardId,
        changes: &CardChanges,
    ) -> RemoteResult<CardPayload>;
    async fn delete_card(&self, list_id: ListId, card_id: CardId) -> RemoteResult<()>;
    /// Batch reorder; a single entry naming another list is a move
    async fn reorder_cards(&self, list_id: ListId, order: &[CardPosition]) -> RemoteResult<Vec<CardPayload>>;
    async fn add_card_member(
        &self,
        card_id: CardId,
        member: &NewCardMember,
    ) -> RemoteResult<CardMembersPayload>;
    async fn remove_card_member(&self, card_id: CardId, user_id: UserId) -> RemoteResult<CardMembersPayload>;

    // Labels
    async fn attach_label(&self, card_id: CardId, label: &NewLabel) -> RemoteResult<Label>;
    async fn detach_label(&self, card_id: CardId, label_id: LabelId) -> RemoteResult<()>;

    // Checklists
    async fn create_checklist(
        &self,
        card_id: CardId,
        checklist: &NewChecklist,
    ) -> RemoteResult<ChecklistPayload>;
    async fn update_checklist(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        changes: &ChecklistChanges,
    ) -> RemoteResult<ChecklistPayload>;
    async fn delete_checklist(&self, card_id: CardId, checklist_id: ChecklistId) -> RemoteResult<()>;
    async fn create_checklist_item(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        item: &NewChecklistItem,
    ) -> RemoteResult<ChecklistItem>;
    async fn update_checklist_item(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        item_id: ChecklistItemId,
        changes: &ChecklistItemChanges,
    ) -> RemoteResult<ChecklistItem>;
    async fn delete_checklist_item(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        item_id: ChecklistItemId,
    ) -> RemoteResult<()>;

    // Attachments
    async fn create_attachment(&self, card_id: CardId, attachment: &NewAttachment) -> RemoteResult<Attachment>;
    async fn delete_attachment(&self, card_id: CardId, attachment_id: AttachmentId) -> RemoteResult<()>;

    // Comments
    async fn create_comment(&self, card_id: CardId, comment: &NewComment) -> RemoteResult<Comment>;
    async fn update_comment(
        &self,
        card_id: CardId,
        comment_id: CommentId,
        changes: &CommentChanges,
    ) -> RemoteResult<Comment>;
    async fn delete_comment(&self, card_id: CardId, comment_id: CommentId) -> RemoteResult<()>;
}
