//! Operation Status Channel
//!
//! Tracks every in-flight command by key so concurrent commands report
//! their own outcome instead of overwriting one shared loading/error slot.

use std::collections::HashMap;
use std::fmt;

/// Command families, one per store command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    FetchBoards,
    FetchBoard,
    CreateBoard,
    UpdateBoard,
    DeleteBoard,
    AddBoardMember,
    RemoveBoardMember,
    FetchUsers,
    FetchLists,
    CreateList,
    UpdateList,
    DeleteList,
    ReorderLists,
    FetchCards,
    CreateCard,
    UpdateCard,
    DeleteCard,
    ReorderCards,
    MoveCard,
    AddCardMember,
    RemoveCardMember,
    AttachLabel,
    DetachLabel,
    CreateChecklist,
    UpdateChecklist,
    DeleteChecklist,
    CreateChecklistItem,
    UpdateChecklistItem,
    DeleteChecklistItem,
    CreateAttachment,
    DeleteAttachment,
    CreateComment,
    UpdateComment,
    DeleteComment,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::FetchBoards => "fetch boards",
            OperationKind::FetchBoard => "fetch board",
            OperationKind::CreateBoard => "create board",
            OperationKind::UpdateBoard => "update board",
            OperationKind::DeleteBoard => "delete board",
            OperationKind::AddBoardMember => "add board member",
            OperationKind::RemoveBoardMember => "remove board member",
            OperationKind::FetchUsers => "fetch users",
            OperationKind::FetchLists => "fetch lists",
            OperationKind::CreateList => "create list",
            OperationKind::UpdateList => "update list",
            OperationKind::DeleteList => "delete list",
            OperationKind::ReorderLists => "reorder lists",
            OperationKind::FetchCards => "fetch cards",
            OperationKind::CreateCard => "create card",
            OperationKind::UpdateCard => "update card",
            OperationKind::DeleteCard => "delete card",
            OperationKind::ReorderCards => "reorder cards",
            OperationKind::MoveCard => "move card",
            OperationKind::AddCardMember => "add card member",
            OperationKind::RemoveCardMember => "remove card member",
            OperationKind::AttachLabel => "attach label",
            OperationKind::DetachLabel => "detach label",
            OperationKind::CreateChecklist => "create checklist",
            OperationKind::UpdateChecklist => "update checklist",
            OperationKind::DeleteChecklist => "delete checklist",
            OperationKind::CreateChecklistItem => "create checklist item",
            OperationKind::UpdateChecklistItem => "update checklist item",
            OperationKind::DeleteChecklistItem => "delete checklist item",
            OperationKind::CreateAttachment => "create attachment",
            OperationKind::DeleteAttachment => "delete attachment",
            OperationKind::CreateComment => "create comment",
            OperationKind::UpdateComment => "update comment",
            OperationKind::DeleteComment => "delete comment",
        }
    }

    /// Fixed human-readable message recorded when the command fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            OperationKind::FetchBoards => "Failed to fetch boards",
            OperationKind::FetchBoard => "Failed to fetch board",
            OperationKind::CreateBoard => "Failed to create board",
            OperationKind::UpdateBoard => "Failed to update board",
            OperationKind::DeleteBoard => "Failed to delete board",
            OperationKind::AddBoardMember => "Failed to add board member",
            OperationKind::RemoveBoardMember => "Failed to remove board member",
            OperationKind::FetchUsers => "Failed to fetch users",
            OperationKind::FetchLists => "Failed to fetch lists",
            OperationKind::CreateList => "Failed to create list",
            OperationKind::UpdateList => "Failed to update list",
            OperationKind::DeleteList => "Failed to delete list",
            OperationKind::ReorderLists => "Failed to reorder lists",
            OperationKind::FetchCards => "Failed to fetch cards",
            OperationKind::CreateCard => "Failed to create card",
            OperationKind::UpdateCard => "Failed to update card",
            OperationKind::DeleteCard => "Failed to delete card",
            OperationKind::ReorderCards => "Failed to reorder cards",
            OperationKind::MoveCard => "Failed to move card",
            OperationKind::AddCardMember => "Failed to add card member",
            OperationKind::RemoveCardMember => "Failed to remove card member",
            OperationKind::AttachLabel => "Failed to attach label",
            OperationKind::DetachLabel => "Failed to detach label",
            OperationKind::CreateChecklist => "Failed to create checklist",
            OperationKind::UpdateChecklist => "Failed to update checklist",
            OperationKind::DeleteChecklist => "Failed to delete checklist",
            OperationKind::CreateChecklistItem => "Failed to create checklist item",
            OperationKind::UpdateChecklistItem => "Failed to update checklist item",
            OperationKind::DeleteChecklistItem => "Failed to delete checklist item",
            OperationKind::CreateAttachment => "Failed to create attachment",
            OperationKind::DeleteAttachment => "Failed to delete attachment",
            OperationKind::CreateComment => "Failed to create comment",
            OperationKind::UpdateComment => "Failed to update comment",
            OperationKind::DeleteComment => "Failed to delete comment",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One command invocation: its family plus the id it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationKey {
    pub kind: OperationKind,
    pub target: Option<u32>,
}

impl OperationKey {
    pub fn new(kind: OperationKind, target: u32) -> Self {
        Self {
            kind,
            target: Some(target),
        }
    }

    /// Key for commands without a natural target (catalog fetches, creates)
    pub fn global(kind: OperationKind) -> Self {
        Self { kind, target: None }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Some(id) => write!(f, "{} #{}", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Failed(String),
    /// Confirmed by the server but not merged: a later write to the same
    /// container had already been applied
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Settlement {
    status: OperationStatus,
    sequence: u64,
}

/// Keyed register of in-flight and unsuccessful operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationLog {
    in_flight: HashMap<OperationKey, usize>,
    settled: HashMap<OperationKey, Settlement>,
    sequence: u64,
}

impl OperationLog {
    /// Mark a dispatch; clears any earlier failure for the same key
    pub fn begin(&mut self, key: OperationKey) {
        *self.in_flight.entry(key).or_insert(0) += 1;
        self.settled.remove(&key);
    }

    pub fn succeed(&mut self, key: OperationKey) {
        self.finish(key);
    }

    pub fn fail(&mut self, key: OperationKey, message: impl Into<String>) {
        self.finish(key);
        self.record(key, OperationStatus::Failed(message.into()));
    }

    pub fn supersede(&mut self, key: OperationKey) {
        self.finish(key);
        self.record(key, OperationStatus::Superseded);
    }

    pub fn status(&self, key: &OperationKey) -> Option<OperationStatus> {
        if self.in_flight.contains_key(key) {
            return Some(OperationStatus::Pending);
        }
        self.settled.get(key).map(|s| s.status.clone())
    }

    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn is_pending(&self, key: &OperationKey) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Message of the most recently failed operation
    pub fn error(&self) -> Option<&str> {
        self.failures()
            .max_by_key(|(_, _, sequence)| *sequence)
            .map(|(_, message, _)| message)
    }

    pub fn error_for(&self, key: &OperationKey) -> Option<&str> {
        match self.settled.get(key) {
            Some(Settlement {
                status: OperationStatus::Failed(message),
                ..
            }) => Some(message.as_str()),
            _ => None,
        }
    }

    /// All failures, oldest first
    pub fn errors(&self) -> Vec<(OperationKey, &str)> {
        let mut failures: Vec<_> = self.failures().collect();
        failures.sort_by_key(|(_, _, sequence)| *sequence);
        failures
            .into_iter()
            .map(|(key, message, _)| (key, message))
            .collect()
    }

    pub fn clear_error(&mut self, key: &OperationKey) {
        self.settled.remove(key);
    }

    fn failures(&self) -> impl Iterator<Item = (OperationKey, &str, u64)> + '_ {
        self.settled.iter().filter_map(|(key, settlement)| match &settlement.status {
            OperationStatus::Failed(message) => Some((*key, message.as_str(), settlement.sequence)),
            _ => None,
        })
    }

    fn finish(&mut self, key: OperationKey) {
        if let Some(count) = self.in_flight.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(&key);
            }
        }
    }

    fn record(&mut self, key: OperationKey, status: OperationStatus) {
        self.sequence += 1;
        self.settled.insert(
            key,
            Settlement {
                status,
                sequence: self.sequence,
            },
        );
    }
}
