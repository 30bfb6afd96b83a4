//! Client Models
//!
//! Normalized entities held by the store. Relation fields are plain
//! sequences here; the optional wire shapes live in `remote::payload`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type BoardId = u32;
pub type ListId = u32;
pub type CardId = u32;
pub type LabelId = u32;
pub type ChecklistId = u32;
pub type ChecklistItemId = u32;
pub type AttachmentId = u32;
pub type CommentId = u32;
pub type UserId = u32;

/// Anything addressed by a server-assigned identifier
pub trait Entity {
    fn id(&self) -> u32;
}

/// Entities ordered by a dense zero-based position within their container
pub trait Positioned: Entity {
    fn position(&self) -> i32;
    fn set_position(&mut self, position: i32);
}

/// Who can see a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Team,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Team => "team",
            Visibility::Public => "public",
        }
    }
}

/// Role of a user on a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    #[default]
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: UserSummary,
    pub role: MemberRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Option<UserId>,
    pub visibility: Visibility,
    pub members: Vec<Member>,
    /// Empty for catalog entries; populated for the active board
    pub lists: Vec<List>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub name: String,
    pub board_id: BoardId,
    pub position: i32,
    pub cards: Vec<Card>,
}

impl List {
    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    pub fn card_mut(&mut self, card_id: CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|card| card.id == card_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub list_id: ListId,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub labels: Vec<Label>,
    pub checklists: Vec<Checklist>,
    pub attachments: Vec<Attachment>,
    pub comments: Vec<Comment>,
    pub members: Vec<UserSummary>,
}

impl Card {
    /// A card with no relations yet, as returned right after creation
    pub fn new(id: CardId, list_id: ListId, title: String, position: i32) -> Self {
        Self {
            id,
            list_id,
            title,
            description: None,
            position,
            labels: Vec::new(),
            checklists: Vec::new(),
            attachments: Vec::new(),
            comments: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn checklist_mut(&mut self, checklist_id: ChecklistId) -> Option<&mut Checklist> {
        self.checklists.iter_mut().find(|c| c.id == checklist_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: ChecklistId,
    pub title: String,
    pub card_id: CardId,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    #[serde(alias = "content")]
    pub title: String,
    #[serde(default, alias = "is_completed")]
    pub completed: bool,
    #[serde(default)]
    pub checklist_id: ChecklistId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub card_id: CardId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    #[serde(default)]
    pub card_id: CardId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default, alias = "user")]
    pub author: Option<UserSummary>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Board {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Entity for List {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Entity for Card {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Entity for Label {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Entity for Checklist {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Entity for ChecklistItem {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Entity for Attachment {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Entity for Comment {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Positioned for List {
    fn position(&self) -> i32 {
        self.position
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
    }
}

impl Positioned for Card {
    fn position(&self) -> i32 {
        self.position
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
    }
}

/// Replace the entity with the same id, returning whether one was found
pub fn replace_by_id<T: Entity>(items: &mut [T], updated: T) -> bool {
    match items.iter_mut().find(|item| item.id() == updated.id()) {
        Some(slot) => {
            *slot = updated;
            true
        }
        None => false,
    }
}

/// Remove the entity with the given id, returning it
pub fn remove_by_id<T: Entity>(items: &mut Vec<T>, id: u32) -> Option<T> {
    let index = items.iter().position(|item| item.id() == id)?;
    Some(items.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(id: u32, name: &str) -> Label {
        Label {
            id,
            name: name.to_string(),
            color: "#ff0000".to_string(),
        }
    }

    #[test]
    fn test_replace_by_id() {
        let mut labels = vec![label(1, "bug"), label(2, "feature")];
        assert!(replace_by_id(&mut labels, label(2, "chore")));
        assert_eq!(labels[1].name, "chore");
        assert!(!replace_by_id(&mut labels, label(9, "missing")));
    }

    #[test]
    fn test_remove_by_id() {
        let mut labels = vec![label(1, "bug"), label(2, "feature")];
        assert_eq!(remove_by_id(&mut labels, 1).map(|l| l.name), Some("bug".to_string()));
        assert!(remove_by_id(&mut labels, 1).is_none());
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn test_checklist_item_accepts_legacy_field_names() {
        let item: ChecklistItem =
            serde_json::from_str(r#"{"id":3,"content":"Write docs","is_completed":true}"#).unwrap();
        assert_eq!(item.title, "Write docs");
        assert!(item.completed);
        assert_eq!(item.checklist_id, 0);
    }

    #[test]
    fn test_comment_accepts_user_as_author() {
        let comment: Comment = serde_json::from_str(
            r#"{"id":1,"content":"hi","card_id":4,"user_id":2,
                "user":{"id":2,"name":"Ann","email":"ann@example.com"},
                "created_at":"2024-03-01T10:00:00.000000Z"}"#,
        )
        .unwrap();
        assert_eq!(comment.author.map(|u| u.name), Some("Ann".to_string()));
        assert!(comment.created_at.is_some());
    }

    #[test]
    fn test_visibility_serialization() {
        assert_eq!(Visibility::Public.as_str(), "public");
        let parsed: Visibility = serde_json::from_str(r#""team""#).unwrap();
        assert_eq!(parsed, Visibility::Team);
    }
}
