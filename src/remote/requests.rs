//! Request Bodies
//!
//! One typed body per remote operation, validated before the call is made.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::models::{CardId, ListId, MemberRole, UserId, Visibility};

fn require_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::invalid(field, "must not be blank"));
    }
    Ok(())
}

fn require_optional_text(field: &'static str, value: Option<&String>) -> Result<()> {
    match value {
        Some(v) => require_text(field, v),
        None => Ok(()),
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

// ========================
// Boards
// ========================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBoard {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl NewBoard {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            visibility: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl BoardChanges {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_none() && self.description.is_none() && self.visibility.is_none() {
            return Err(StoreError::invalid("board", "no changes given"));
        }
        require_optional_text("name", self.name.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMember {
    pub user_id: UserId,
    pub role: MemberRole,
}

// ========================
// Lists
// ========================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewList {
    pub name: String,
}

impl NewList {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListChanges {
    pub name: String,
}

impl ListChanges {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)
    }
}

/// One entry of a list reorder batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListPosition {
    pub id: ListId,
    pub position: i32,
}

/// One entry of a card reorder batch; also the single-element move form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CardPosition {
    pub id: CardId,
    pub position: i32,
    #[serde(rename = "board_list_id")]
    pub list_id: ListId,
}

/// A batch must name each entity once with positions exactly 0..n-1
pub fn validate_batch(field: &'static str, entries: impl Iterator<Item = (u32, i32)>) -> Result<()> {
    let mut ids = HashSet::new();
    let mut positions = Vec::new();
    for (id, position) in entries {
        if !ids.insert(id) {
            return Err(StoreError::invalid(field, format!("id {} appears twice", id)));
        }
        positions.push(position);
    }
    if positions.is_empty() {
        return Err(StoreError::invalid(field, "batch is empty"));
    }
    positions.sort_unstable();
    if positions.iter().enumerate().any(|(index, position)| *position != index as i32) {
        return Err(StoreError::invalid(field, "positions are not dense"));
    }
    Ok(())
}

// ========================
// Cards
// ========================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCard {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewCard {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CardChanges {
    pub fn validate(&self) -> Result<()> {
        if self.title.is_none() && self.description.is_none() {
            return Err(StoreError::invalid("card", "no changes given"));
        }
        require_optional_text("title", self.title.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCardMember {
    pub user_id: UserId,
}

// ========================
// Card Details
// ========================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLabel {
    pub name: String,
    pub color: String,
}

impl NewLabel {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        if !is_hex_color(&self.color) {
            return Err(StoreError::invalid("color", format!("'{}' is not a hex colour", self.color)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewChecklist {
    pub title: String,
}

impl NewChecklist {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistChanges {
    pub title: String,
}

impl ChecklistChanges {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewChecklistItem {
    pub title: String,
}

impl NewChecklistItem {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChecklistItemChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ChecklistItemChanges {
    pub fn toggle(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.is_none() && self.completed.is_none() {
            return Err(StoreError::invalid("checklist item", "no changes given"));
        }
        require_optional_text("title", self.title.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAttachment {
    pub filename: String,
    pub url: String,
}

impl NewAttachment {
    pub fn validate(&self) -> Result<()> {
        require_text("filename", &self.filename)?;
        require_text("url", &self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewComment {
    pub content: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<()> {
        require_text("content", &self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentChanges {
    pub content: String,
}

impl CommentChanges {
    pub fn validate(&self) -> Result<()> {
        require_text("content", &self.content)
    }
}
