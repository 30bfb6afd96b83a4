//! Wire Payloads
//!
//! Server representations as they arrive. Relations the server did not
//! load are absent, so they are `Option`s here and become empty sequences
//! once the normalizer has run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    Attachment, BoardId, CardId, ChecklistId, ChecklistItem, Comment, Label, ListId, MemberRole,
    UserId, UserSummary, Visibility,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardPayload {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "owner_id")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<MemberPayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lists: Option<Vec<ListPayload>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPayload {
    pub id: ListId,
    pub name: String,
    #[serde(default)]
    pub board_id: Option<BoardId>,
    #[serde(default)]
    pub position: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<CardPayload>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPayload {
    pub id: CardId,
    #[serde(default, alias = "board_list_id")]
    pub list_id: Option<ListId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Label>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklists: Option<Vec<ChecklistPayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<UserSummary>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistPayload {
    pub id: ChecklistId,
    pub title: String,
    #[serde(default)]
    pub card_id: Option<CardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ChecklistItem>>,
}

/// A board member: the user fields plus the pivot row carrying the role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPayload {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub pivot: Option<MemberPivot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPivot {
    pub role: MemberRole,
}

/// Response of the board membership endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembersPayload {
    pub members: Vec<MemberPayload>,
}

/// Response of the card membership endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMembersPayload {
    pub members: Vec<UserSummary>,
}
