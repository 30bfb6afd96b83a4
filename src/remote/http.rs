//! HTTP adapter for the remote API
//!
//! `HttpRemote` turns each logical operation into a method, a resource path
//! and an optional JSON body, and hands them to a `Transport`.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::payload::{BoardPayload, CardMembersPayload, CardPayload, ChecklistPayload, ListPayload, MembersPayload};
use super::requests::{
    BoardChanges, CardChanges, CardPosition, ChecklistChanges, ChecklistItemChanges, CommentChanges,
    ListChanges, ListPosition, NewAttachment, NewBoard, NewCard, NewCardMember, NewChecklist,
    NewChecklistItem, NewComment, NewLabel, NewList, NewMember,
};
use super::{routes, RemoteApi, RemoteResult};
use crate::config::ClientConfig;
use crate::error::RemoteError;
use crate::models::{
    Attachment, AttachmentId, BoardId, CardId, ChecklistId, ChecklistItem, ChecklistItemId, Comment,
    CommentId, Label, LabelId, ListId, UserId, UserSummary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Request/response seam below the remote API
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request; an empty response body comes back as `Value::Null`
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> RemoteResult<Value>;
}

/// Pull a readable message out of an error body.
///
/// Tries `error_description`, then `message`, then falls back to the raw body.
pub(crate) fn extract_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(desc) = json.get("error_description").and_then(|v| v.as_str()) {
            return desc.to_string();
        }
        if let Some(msg) = json.get("message").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }
    body.to_string()
}

// ========================
// Reqwest transport
// ========================

pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> RemoteResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method.into(), &url)
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        tracing::trace!(?method, %url, "sending request");
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

// ========================
// Remote API over a transport
// ========================

pub struct HttpRemote<T> {
    transport: T,
}

impl<T: Transport> HttpRemote<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn fetch<R: DeserializeOwned>(&self, path: &str) -> RemoteResult<R> {
        let value = self.transport.request(Method::Get, path, None).await?;
        decode(value)
    }

    async fn send<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> RemoteResult<R> {
        let body = encode(body)?;
        let value = self.transport.request(method, path, Some(body)).await?;
        decode(value)
    }

    async fn remove(&self, path: &str) -> RemoteResult<()> {
        self.transport.request(Method::Delete, path, None).await?;
        Ok(())
    }

    async fn remove_with<R: DeserializeOwned>(&self, path: &str) -> RemoteResult<R> {
        let value = self.transport.request(Method::Delete, path, None).await?;
        decode(value)
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> RemoteResult<Value> {
    serde_json::to_value(body).map_err(|e| RemoteError::Decode(e.to_string()))
}

fn decode<R: DeserializeOwned>(value: Value) -> RemoteResult<R> {
    serde_json::from_value(value).map_err(|e| RemoteError::Decode(e.to_string()))
}

#[async_trait]
impl<T: Transport> RemoteApi for HttpRemote<T> {
    async fn list_boards(&self) -> RemoteResult<Vec<BoardPayload>> {
        self.fetch(routes::BOARDS).await
    }

    async fn get_board(&self, board_id: BoardId) -> RemoteResult<BoardPayload> {
        self.fetch(&routes::board(board_id)).await
    }

    async fn create_board(&self, board: &NewBoard) -> RemoteResult<BoardPayload> {
        self.send(Method::Post, routes::BOARDS, board).await
    }

    async fn update_board(&self, board_id: BoardId, changes: &BoardChanges) -> RemoteResult<BoardPayload> {
        self.send(Method::Put, &routes::board(board_id), changes).await
    }

    async fn delete_board(&self, board_id: BoardId) -> RemoteResult<()> {
        self.remove(&routes::board(board_id)).await
    }

    async fn add_board_member(&self, board_id: BoardId, member: &NewMember) -> RemoteResult<MembersPayload> {
        self.send(Method::Post, &routes::board_members(board_id), member).await
    }

    async fn remove_board_member(&self, board_id: BoardId, user_id: UserId) -> RemoteResult<MembersPayload> {
        self.remove_with(&routes::board_member(board_id, user_id)).await
    }

    async fn list_users(&self) -> RemoteResult<Vec<UserSummary>> {
        self.fetch(routes::USERS).await
    }

    async fn list_lists(&self, board_id: BoardId) -> RemoteResult<Vec<ListPayload>> {
        self.fetch(&routes::lists(board_id)).await
    }

    async fn create_list(&self, board_id: BoardId, list: &NewList) -> RemoteResult<ListPayload> {
        self.send(Method::Post, &routes::lists(board_id), list).await
    }

    async fn update_list(
        &self,
        board_id: BoardId,
        list_id: ListId,
        changes: &ListChanges,
    ) -> RemoteResult<ListPayload> {
        self.send(Method::Put, &routes::list(board_id, list_id), changes).await
    }

    async fn delete_list(&self, board_id: BoardId, list_id: ListId) -> RemoteResult<()> {
        self.remove(&routes::list(board_id, list_id)).await
    }

    async fn reorder_lists(&self, board_id: BoardId, order: &[ListPosition]) -> RemoteResult<Vec<ListPayload>> {
        let body = json!({ "lists": encode(order)? });
        self.send(Method::Put, &routes::list_reorder(board_id), &body).await
    }

    async fn list_cards(&self, list_id: ListId) -> RemoteResult<Vec<CardPayload>> {
        self.fetch(&routes::cards(list_id)).await
    }

    async fn create_card(&self, list_id: ListId, card: &NewCard) -> RemoteResult<CardPayload> {
        self.send(Method::Post, &routes::cards(list_id), card).await
    }

    async fn update_card(
        &self,
        list_id: ListId,
        card_id: CardId,
        changes: &CardChanges,
    ) -> RemoteResult<CardPayload> {
        self.send(Method::Put, &routes::card(list_id, card_id), changes).await
    }

    async fn delete_card(&self, list_id: ListId, card_id: CardId) -> RemoteResult<()> {
        self.remove(&routes::card(list_id, card_id)).await
    }

    async fn reorder_cards(&self, list_id: ListId, order: &[CardPosition]) -> RemoteResult<Vec<CardPayload>> {
        let body = json!({ "cards": encode(order)? });
        self.send(Method::Put, &routes::card_reorder(list_id), &body).await
    }

    async fn add_card_member(
        &self,
        card_id: CardId,
        member: &NewCardMember,
    ) -> RemoteResult<CardMembersPayload> {
        self.send(Method::Post, &routes::card_members(card_id), member).await
    }

    async fn remove_card_member(&self, card_id: CardId, user_id: UserId) -> RemoteResult<CardMembersPayload> {
        self.remove_with(&routes::card_member(card_id, user_id)).await
    }

    async fn attach_label(&self, card_id: CardId, label: &NewLabel) -> RemoteResult<Label> {
        self.send(Method::Post, &routes::labels(card_id), label).await
    }

    async fn detach_label(&self, card_id: CardId, label_id: LabelId) -> RemoteResult<()> {
        self.remove(&routes::label(card_id, label_id)).await
    }

    async fn create_checklist(
        &self,
        card_id: CardId,
        checklist: &NewChecklist,
    ) -> RemoteResult<ChecklistPayload> {
        self.send(Method::Post, &routes::checklists(card_id), checklist).await
    }

    async fn update_checklist(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        changes: &ChecklistChanges,
    ) -> RemoteResult<ChecklistPayload> {
        self.send(Method::Put, &routes::checklist(card_id, checklist_id), changes)
            .await
    }

    async fn delete_checklist(&self, card_id: CardId, checklist_id: ChecklistId) -> RemoteResult<()> {
        self.remove(&routes::checklist(card_id, checklist_id)).await
    }

    async fn create_checklist_item(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        item: &NewChecklistItem,
    ) -> RemoteResult<ChecklistItem> {
        self.send(Method::Post, &routes::checklist_items(card_id, checklist_id), item)
            .await
    }

    async fn update_checklist_item(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        item_id: ChecklistItemId,
        changes: &ChecklistItemChanges,
    ) -> RemoteResult<ChecklistItem> {
        let path = routes::checklist_item(card_id, checklist_id, item_id);
        self.send(Method::Put, &path, changes).await
    }

    async fn delete_checklist_item(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        item_id: ChecklistItemId,
    ) -> RemoteResult<()> {
        self.remove(&routes::checklist_item(card_id, checklist_id, item_id))
            .await
    }

    async fn create_attachment(&self, card_id: CardId, attachment: &NewAttachment) -> RemoteResult<Attachment> {
        self.send(Method::Post, &routes::attachments(card_id), attachment).await
    }

    async fn delete_attachment(&self, card_id: CardId, attachment_id: AttachmentId) -> RemoteResult<()> {
        self.remove(&routes::attachment(card_id, attachment_id)).await
    }

    async fn create_comment(&self, card_id: CardId, comment: &NewComment) -> RemoteResult<Comment> {
        self.send(Method::Post, &routes::comments(card_id), comment).await
    }

    async fn update_comment(
        &self,
        card_id: CardId,
        comment_id: CommentId,
        changes: &CommentChanges,
    ) -> RemoteResult<Comment> {
        self.send(Method::Put, &routes::comment(card_id, comment_id), changes)
            .await
    }

    async fn delete_comment(&self, card_id: CardId, comment_id: CommentId) -> RemoteResult<()> {
        self.remove(&routes::comment(card_id, comment_id)).await
    }
}
