//! In-memory remote
//!
//! A complete server behind a mutex: ids are assigned here, positions are
//! reindexed densely after every positional write, and any operation can be
//! made to fail or to answer late. Mutations happen when the request
//! arrives; injected latency only delays the response.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::payload::{
    BoardPayload, CardMembersPayload, CardPayload, ChecklistPayload, ListPayload, MemberPayload,
    MemberPivot, MembersPayload,
};
use super::requests::{
    BoardChanges, CardChanges, CardPosition, ChecklistChanges, ChecklistItemChanges, CommentChanges,
    ListChanges, ListPosition, NewAttachment, NewBoard, NewCard, NewCardMember, NewChecklist,
    NewChecklistItem, NewComment, NewLabel, NewList, NewMember,
};
use super::{RemoteApi, RemoteResult};
use crate::error::RemoteError;
use crate::models::{
    Attachment, AttachmentId, BoardId, CardId, ChecklistId, ChecklistItem, ChecklistItemId, Comment,
    CommentId, Label, LabelId, ListId, MemberRole, UserId, UserSummary, Visibility,
};
use crate::status::OperationKind;

fn missing(entity: &str, id: u32) -> RemoteError {
    RemoteError::Status {
        status: 404,
        message: format!("{} {} not found", entity, id),
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

// ========================
// Server rows
// ========================

#[derive(Debug, Clone)]
struct BoardRow {
    id: BoardId,
    name: String,
    description: Option<String>,
    owner_id: Option<UserId>,
    visibility: Visibility,
    members: Vec<(UserId, MemberRole)>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ListRow {
    id: ListId,
    board_id: BoardId,
    name: String,
    position: i32,
}

#[derive(Debug, Clone)]
struct CardRow {
    id: CardId,
    list_id: ListId,
    title: String,
    description: Option<String>,
    position: i32,
    labels: Vec<Label>,
    members: Vec<UserId>,
}

#[derive(Debug, Clone)]
struct ChecklistRow {
    id: ChecklistId,
    card_id: CardId,
    title: String,
}

#[derive(Debug, Default)]
struct ServerState {
    next_id: u32,
    users: Vec<UserSummary>,
    boards: Vec<BoardRow>,
    lists: Vec<ListRow>,
    cards: Vec<CardRow>,
    checklists: Vec<ChecklistRow>,
    items: Vec<ChecklistItem>,
    attachments: Vec<Attachment>,
    comments: Vec<Comment>,
}

impl ServerState {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn acting_user(&self) -> Option<&UserSummary> {
        self.users.first()
    }

    fn user(&self, user_id: UserId) -> RemoteResult<&UserSummary> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| missing("user", user_id))
    }

    fn board_mut(&mut self, board_id: BoardId) -> RemoteResult<&mut BoardRow> {
        self.boards
            .iter_mut()
            .find(|b| b.id == board_id)
            .ok_or_else(|| missing("board", board_id))
    }

    fn board(&self, board_id: BoardId) -> RemoteResult<&BoardRow> {
        self.boards
            .iter()
            .find(|b| b.id == board_id)
            .ok_or_else(|| missing("board", board_id))
    }

    /// A list, checked against the board named in the route
    fn list_in(&mut self, board_id: BoardId, list_id: ListId) -> RemoteResult<&mut ListRow> {
        self.lists
            .iter_mut()
            .find(|l| l.id == list_id && l.board_id == board_id)
            .ok_or_else(|| missing("list", list_id))
    }

    fn has_list(&self, list_id: ListId) -> bool {
        self.lists.iter().any(|l| l.id == list_id)
    }

    fn card(&self, card_id: CardId) -> RemoteResult<&CardRow> {
        self.cards
            .iter()
            .find(|c| c.id == card_id)
            .ok_or_else(|| missing("card", card_id))
    }

    fn card_mut(&mut self, card_id: CardId) -> RemoteResult<&mut CardRow> {
        self.cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| missing("card", card_id))
    }

    /// A card, checked against the list named in the route
    fn card_in(&mut self, list_id: ListId, card_id: CardId) -> RemoteResult<&mut CardRow> {
        self.cards
            .iter_mut()
            .find(|c| c.id == card_id && c.list_id == list_id)
            .ok_or_else(|| missing("card", card_id))
    }

    fn checklist_in(&mut self, card_id: CardId, checklist_id: ChecklistId) -> RemoteResult<&mut ChecklistRow> {
        self.checklists
            .iter_mut()
            .find(|c| c.id == checklist_id && c.card_id == card_id)
            .ok_or_else(|| missing("checklist", checklist_id))
    }

    fn lists_of(&self, board_id: BoardId) -> Vec<&ListRow> {
        let mut lists: Vec<_> = self.lists.iter().filter(|l| l.board_id == board_id).collect();
        lists.sort_by_key(|l| (l.position, l.id));
        lists
    }

    fn cards_of(&self, list_id: ListId) -> Vec<&CardRow> {
        let mut cards: Vec<_> = self.cards.iter().filter(|c| c.list_id == list_id).collect();
        cards.sort_by_key(|c| (c.position, c.id));
        cards
    }

    fn reindex_lists(&mut self, board_id: BoardId) {
        let order: Vec<ListId> = self.lists_of(board_id).iter().map(|l| l.id).collect();
        for (index, id) in order.into_iter().enumerate() {
            if let Some(list) = self.lists.iter_mut().find(|l| l.id == id) {
                list.position = index as i32;
            }
        }
    }

    fn reindex_cards(&mut self, list_id: ListId) {
        let order: Vec<CardId> = self.cards_of(list_id).iter().map(|c| c.id).collect();
        for (index, id) in order.into_iter().enumerate() {
            if let Some(card) = self.cards.iter_mut().find(|c| c.id == id) {
                card.position = index as i32;
            }
        }
    }

    fn remove_card(&mut self, card_id: CardId) {
        self.cards.retain(|c| c.id != card_id);
        let checklists: Vec<ChecklistId> = self
            .checklists
            .iter()
            .filter(|c| c.card_id == card_id)
            .map(|c| c.id)
            .collect();
        for checklist_id in checklists {
            self.remove_checklist(checklist_id);
        }
        self.attachments.retain(|a| a.card_id != card_id);
        self.comments.retain(|c| c.card_id != card_id);
    }

    fn remove_checklist(&mut self, checklist_id: ChecklistId) {
        self.checklists.retain(|c| c.id != checklist_id);
        self.items.retain(|i| i.checklist_id != checklist_id);
    }

    fn remove_list(&mut self, list_id: ListId) {
        self.lists.retain(|l| l.id != list_id);
        let cards: Vec<CardId> = self
            .cards
            .iter()
            .filter(|c| c.list_id == list_id)
            .map(|c| c.id)
            .collect();
        for card_id in cards {
            self.remove_card(card_id);
        }
    }

    // Representations

    fn board_payload(&self, board: &BoardRow, deep: bool) -> BoardPayload {
        let lists = deep.then(|| {
            self.lists_of(board.id)
                .into_iter()
                .map(|l| self.list_payload(l, true))
                .collect()
        });
        BoardPayload {
            id: board.id,
            name: board.name.clone(),
            description: board.description.clone(),
            user_id: board.owner_id,
            visibility: Some(board.visibility),
            members: non_empty(self.member_payloads(board)),
            lists,
            created_at: Some(board.created_at),
            updated_at: Some(board.updated_at),
        }
    }

    fn member_payloads(&self, board: &BoardRow) -> Vec<MemberPayload> {
        board
            .members
            .iter()
            .filter_map(|(user_id, role)| {
                let user = self.user(*user_id).ok()?;
                Some(MemberPayload {
                    id: user.id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    pivot: Some(MemberPivot { role: *role }),
                })
            })
            .collect()
    }

    fn list_payload(&self, list: &ListRow, with_cards: bool) -> ListPayload {
        let cards = with_cards.then(|| {
            self.cards_of(list.id)
                .into_iter()
                .map(|c| self.card_payload(c, true))
                .collect()
        });
        ListPayload {
            id: list.id,
            name: list.name.clone(),
            board_id: Some(list.board_id),
            position: list.position,
            cards,
        }
    }

    /// Relations are left out entirely when empty, as the real API does
    fn card_payload(&self, card: &CardRow, with_relations: bool) -> CardPayload {
        let mut payload = CardPayload {
            id: card.id,
            list_id: Some(card.list_id),
            title: card.title.clone(),
            description: card.description.clone(),
            position: card.position,
            labels: None,
            checklists: None,
            attachments: None,
            comments: None,
            members: None,
        };
        if with_relations {
            payload.labels = non_empty(card.labels.clone());
            payload.checklists = non_empty(
                self.checklists
                    .iter()
                    .filter(|c| c.card_id == card.id)
                    .map(|c| self.checklist_payload(c))
                    .collect(),
            );
            payload.attachments = non_empty(
                self.attachments
                    .iter()
                    .filter(|a| a.card_id == card.id)
                    .cloned()
                    .collect(),
            );
            payload.comments = non_empty(
                self.comments
                    .iter()
                    .filter(|c| c.card_id == card.id)
                    .cloned()
                    .collect(),
            );
            payload.members = non_empty(self.card_members(card));
        }
        payload
    }

    fn card_members(&self, card: &CardRow) -> Vec<UserSummary> {
        card.members
            .iter()
            .filter_map(|id| self.user(*id).ok().cloned())
            .collect()
    }

    fn checklist_payload(&self, checklist: &ChecklistRow) -> ChecklistPayload {
        let items: Vec<ChecklistItem> = self
            .items
            .iter()
            .filter(|i| i.checklist_id == checklist.id)
            .cloned()
            .collect();
        ChecklistPayload {
            id: checklist.id,
            title: checklist.title.clone(),
            card_id: Some(checklist.card_id),
            items: non_empty(items),
        }
    }

    // Positional writes

    fn reorder_lists(&mut self, board_id: BoardId, order: &[ListPosition]) -> RemoteResult<Vec<ListPayload>> {
        self.board(board_id)?;
        for entry in order {
            self.list_in(board_id, entry.id)?.position = entry.position;
        }
        self.reindex_lists(board_id);
        Ok(self
            .lists_of(board_id)
            .into_iter()
            .map(|l| self.list_payload(l, false))
            .collect())
    }

    /// Each entry is placed at its position in its target list, pushing
    /// later cards down; every list that lost or gained a card is reindexed
    fn reorder_cards(&mut self, list_id: ListId, order: &[CardPosition]) -> RemoteResult<Vec<CardPayload>> {
        if !self.has_list(list_id) {
            return Err(missing("list", list_id));
        }
        for entry in order {
            if !self.has_list(entry.list_id) {
                return Err(missing("list", entry.list_id));
            }
            self.card(entry.id)?;
        }

        let batch: HashSet<CardId> = order.iter().map(|e| e.id).collect();
        let mut touched = BTreeSet::from([list_id]);
        for entry in order {
            for card in self.cards.iter_mut().filter(|c| {
                c.list_id == entry.list_id && !batch.contains(&c.id) && c.position >= entry.position
            }) {
                card.position += 1;
            }
            let card = self.card_mut(entry.id)?;
            touched.insert(card.list_id);
            touched.insert(entry.list_id);
            card.list_id = entry.list_id;
            card.position = entry.position;
        }
        for touched_list in touched {
            self.reindex_cards(touched_list);
        }

        Ok(self
            .cards_of(list_id)
            .into_iter()
            .map(|c| self.card_payload(c, false))
            .collect())
    }

    /// A single entry naming a card that lives elsewhere is a move
    fn card_batch_kind(&self, order: &[CardPosition]) -> OperationKind {
        match order {
            [entry] if self.card(entry.id).map_or(false, |c| c.list_id != entry.list_id) => {
                OperationKind::MoveCard
            }
            _ => OperationKind::ReorderCards,
        }
    }
}

// ========================
// Fault injection
// ========================

#[derive(Debug, Default)]
struct Faults {
    failing: HashMap<OperationKind, RemoteError>,
    latency: HashMap<OperationKind, VecDeque<Duration>>,
    calls: HashMap<OperationKind, usize>,
}

/// In-memory `RemoteApi` with per-operation failure and latency injection
#[derive(Debug, Default)]
pub struct MemoryRemote {
    state: Mutex<ServerState>,
    faults: Mutex<Faults>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the user directory; the first user acts as the caller
    pub fn with_users(users: Vec<UserSummary>) -> Self {
        let remote = Self::default();
        {
            let mut state = remote.lock_state();
            state.next_id = users.iter().map(|u| u.id).max().unwrap_or(0);
            state.users = users;
        }
        remote
    }

    /// Make every later call of this kind fail with a server error
    pub fn fail(&self, kind: OperationKind) {
        self.fail_with(
            kind,
            RemoteError::Status {
                status: 500,
                message: "Server Error".to_string(),
            },
        );
    }

    pub fn fail_with(&self, kind: OperationKind, error: RemoteError) {
        self.lock_faults().failing.insert(kind, error);
    }

    pub fn recover(&self, kind: OperationKind) {
        self.lock_faults().failing.remove(&kind);
    }

    /// Delay the response of the next call of this kind
    pub fn push_latency(&self, kind: OperationKind, delay: Duration) {
        self.lock_faults()
            .latency
            .entry(kind)
            .or_default()
            .push_back(delay);
    }

    pub fn calls(&self, kind: OperationKind) -> usize {
        self.lock_faults().calls.get(&kind).copied().unwrap_or(0)
    }

    /// Server-side list order of a board
    pub fn list_order(&self, board_id: BoardId) -> Vec<(ListId, i32)> {
        self.lock_state()
            .lists_of(board_id)
            .iter()
            .map(|l| (l.id, l.position))
            .collect()
    }

    /// Server-side card order of a list
    pub fn card_order(&self, list_id: ListId) -> Vec<(CardId, i32)> {
        self.lock_state()
            .cards_of(list_id)
            .iter()
            .map(|c| (c.id, c.position))
            .collect()
    }

    fn lock_state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Count the call, then either apply it or fail it, then answer after
    /// any queued latency
    async fn call<R, F>(&self, kind: OperationKind, op: F) -> RemoteResult<R>
    where
        F: FnOnce(&mut ServerState) -> RemoteResult<R> + Send,
        R: Send,
    {
        let (failure, delay) = {
            let mut faults = self.lock_faults();
            *faults.calls.entry(kind).or_insert(0) += 1;
            let delay = faults.latency.get_mut(&kind).and_then(|queue| queue.pop_front());
            (faults.failing.get(&kind).cloned(), delay)
        };

        let result = match failure {
            Some(error) => Err(error),
            None => {
                let mut state = self.lock_state();
                op(&mut state)
            }
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl RemoteApi for MemoryRemote {
    async fn list_boards(&self) -> RemoteResult<Vec<BoardPayload>> {
        self.call(OperationKind::FetchBoards, |state| {
            Ok(state
                .boards
                .iter()
                .map(|b| state.board_payload(b, false))
                .collect())
        })
        .await
    }

    async fn get_board(&self, board_id: BoardId) -> RemoteResult<BoardPayload> {
        self.call(OperationKind::FetchBoard, |state| {
            let board = state.board(board_id)?;
            Ok(state.board_payload(board, true))
        })
        .await
    }

    async fn create_board(&self, board: &NewBoard) -> RemoteResult<BoardPayload> {
        self.call(OperationKind::CreateBoard, |state| {
            let id = state.allocate();
            let now = Utc::now();
            let owner_id = state.acting_user().map(|u| u.id);
            let row = BoardRow {
                id,
                name: board.name.clone(),
                description: board.description.clone(),
                owner_id,
                visibility: board.visibility.unwrap_or_default(),
                members: owner_id.map(|id| (id, MemberRole::Admin)).into_iter().collect(),
                created_at: now,
                updated_at: now,
            };
            let payload = state.board_payload(&row, false);
            state.boards.push(row);
            Ok(payload)
        })
        .await
    }

    async fn update_board(&self, board_id: BoardId, changes: &BoardChanges) -> RemoteResult<BoardPayload> {
        self.call(OperationKind::UpdateBoard, |state| {
            let board = state.board_mut(board_id)?;
            if let Some(name) = &changes.name {
                board.name = name.clone();
            }
            if let Some(description) = &changes.description {
                board.description = Some(description.clone());
            }
            if let Some(visibility) = changes.visibility {
                board.visibility = visibility;
            }
            board.updated_at = Utc::now();
            let board = state.board(board_id)?;
            Ok(state.board_payload(board, false))
        })
        .await
    }

    async fn delete_board(&self, board_id: BoardId) -> RemoteResult<()> {
        self.call(OperationKind::DeleteBoard, |state| {
            state.board(board_id)?;
            state.boards.retain(|b| b.id != board_id);
            let lists: Vec<ListId> = state
                .lists
                .iter()
                .filter(|l| l.board_id == board_id)
                .map(|l| l.id)
                .collect();
            for list_id in lists {
                state.remove_list(list_id);
            }
            Ok(())
        })
        .await
    }

    async fn add_board_member(&self, board_id: BoardId, member: &NewMember) -> RemoteResult<MembersPayload> {
        self.call(OperationKind::AddBoardMember, |state| {
            state.user(member.user_id)?;
            let board = state.board_mut(board_id)?;
            match board.members.iter_mut().find(|(id, _)| *id == member.user_id) {
                Some(existing) => existing.1 = member.role,
                None => board.members.push((member.user_id, member.role)),
            }
            let board = state.board(board_id)?;
            Ok(MembersPayload {
                members: state.member_payloads(board),
            })
        })
        .await
    }

    async fn remove_board_member(&self, board_id: BoardId, user_id: UserId) -> RemoteResult<MembersPayload> {
        self.call(OperationKind::RemoveBoardMember, |state| {
            let board = state.board_mut(board_id)?;
            let before = board.members.len();
            board.members.retain(|(id, _)| *id != user_id);
            if board.members.len() == before {
                return Err(missing("member", user_id));
            }
            let board = state.board(board_id)?;
            Ok(MembersPayload {
                members: state.member_payloads(board),
            })
        })
        .await
    }

    async fn list_users(&self) -> RemoteResult<Vec<UserSummary>> {
        self.call(OperationKind::FetchUsers, |state| Ok(state.users.clone()))
            .await
    }

    async fn list_lists(&self, board_id: BoardId) -> RemoteResult<Vec<ListPayload>> {
        self.call(OperationKind::FetchLists, |state| {
            state.board(board_id)?;
            Ok(state
                .lists_of(board_id)
                .into_iter()
                .map(|l| state.list_payload(l, true))
                .collect())
        })
        .await
    }

    async fn create_list(&self, board_id: BoardId, list: &NewList) -> RemoteResult<ListPayload> {
        self.call(OperationKind::CreateList, |state| {
            state.board(board_id)?;
            let row = ListRow {
                id: state.allocate(),
                board_id,
                name: list.name.clone(),
                position: state.lists_of(board_id).len() as i32,
            };
            let payload = state.list_payload(&row, false);
            state.lists.push(row);
            Ok(payload)
        })
        .await
    }

    async fn update_list(
        &self,
        board_id: BoardId,
        list_id: ListId,
        changes: &ListChanges,
    ) -> RemoteResult<ListPayload> {
        self.call(OperationKind::UpdateList, |state| {
            let list = state.list_in(board_id, list_id)?;
            list.name = changes.name.clone();
            let list = list.clone();
            Ok(state.list_payload(&list, false))
        })
        .await
    }

    async fn delete_list(&self, board_id: BoardId, list_id: ListId) -> RemoteResult<()> {
        self.call(OperationKind::DeleteList, |state| {
            state.list_in(board_id, list_id)?;
            state.remove_list(list_id);
            state.reindex_lists(board_id);
            Ok(())
        })
        .await
    }

    async fn reorder_lists(&self, board_id: BoardId, order: &[ListPosition]) -> RemoteResult<Vec<ListPayload>> {
        self.call(OperationKind::ReorderLists, |state| state.reorder_lists(board_id, order))
            .await
    }

    async fn list_cards(&self, list_id: ListId) -> RemoteResult<Vec<CardPayload>> {
        self.call(OperationKind::FetchCards, |state| {
            if !state.has_list(list_id) {
                return Err(missing("list", list_id));
            }
            Ok(state
                .cards_of(list_id)
                .into_iter()
                .map(|c| state.card_payload(c, true))
                .collect())
        })
        .await
    }

    async fn create_card(&self, list_id: ListId, card: &NewCard) -> RemoteResult<CardPayload> {
        self.call(OperationKind::CreateCard, |state| {
            if !state.has_list(list_id) {
                return Err(missing("list", list_id));
            }
            let row = CardRow {
                id: state.allocate(),
                list_id,
                title: card.title.clone(),
                description: card.description.clone(),
                position: state.cards_of(list_id).len() as i32,
                labels: Vec::new(),
                members: Vec::new(),
            };
            let payload = state.card_payload(&row, false);
            state.cards.push(row);
            Ok(payload)
        })
        .await
    }

    async fn update_card(
        &self,
        list_id: ListId,
        card_id: CardId,
        changes: &CardChanges,
    ) -> RemoteResult<CardPayload> {
        self.call(OperationKind::UpdateCard, |state| {
            let card = state.card_in(list_id, card_id)?;
            if let Some(title) = &changes.title {
                card.title = title.clone();
            }
            if let Some(description) = &changes.description {
                card.description = Some(description.clone());
            }
            let card = card.clone();
            Ok(state.card_payload(&card, false))
        })
        .await
    }

    async fn delete_card(&self, list_id: ListId, card_id: CardId) -> RemoteResult<()> {
        self.call(OperationKind::DeleteCard, |state| {
            state.card_in(list_id, card_id)?;
            state.remove_card(card_id);
            state.reindex_cards(list_id);
            Ok(())
        })
        .await
    }

    async fn reorder_cards(&self, list_id: ListId, order: &[CardPosition]) -> RemoteResult<Vec<CardPayload>> {
        let kind = self.lock_state().card_batch_kind(order);
        self.call(kind, |state| state.reorder_cards(list_id, order)).await
    }

    async fn add_card_member(
        &self,
        card_id: CardId,
        member: &NewCardMember,
    ) -> RemoteResult<CardMembersPayload> {
        self.call(OperationKind::AddCardMember, |state| {
            state.user(member.user_id)?;
            let card = state.card_mut(card_id)?;
            if !card.members.contains(&member.user_id) {
                card.members.push(member.user_id);
            }
            let card = state.card(card_id)?;
            Ok(CardMembersPayload {
                members: state.card_members(card),
            })
        })
        .await
    }

    async fn remove_card_member(&self, card_id: CardId, user_id: UserId) -> RemoteResult<CardMembersPayload> {
        self.call(OperationKind::RemoveCardMember, |state| {
            let card = state.card_mut(card_id)?;
            if !card.members.contains(&user_id) {
                return Err(missing("member", user_id));
            }
            card.members.retain(|id| *id != user_id);
            let card = state.card(card_id)?;
            Ok(CardMembersPayload {
                members: state.card_members(card),
            })
        })
        .await
    }

    async fn attach_label(&self, card_id: CardId, label: &NewLabel) -> RemoteResult<Label> {
        self.call(OperationKind::AttachLabel, |state| {
            state.card(card_id)?;
            let label = Label {
                id: state.allocate(),
                name: label.name.clone(),
                color: label.color.clone(),
            };
            state.card_mut(card_id)?.labels.push(label.clone());
            Ok(label)
        })
        .await
    }

    async fn detach_label(&self, card_id: CardId, label_id: LabelId) -> RemoteResult<()> {
        self.call(OperationKind::DetachLabel, |state| {
            let card = state.card_mut(card_id)?;
            if !card.labels.iter().any(|l| l.id == label_id) {
                return Err(missing("label", label_id));
            }
            card.labels.retain(|l| l.id != label_id);
            Ok(())
        })
        .await
    }

    async fn create_checklist(
        &self,
        card_id: CardId,
        checklist: &NewChecklist,
    ) -> RemoteResult<ChecklistPayload> {
        self.call(OperationKind::CreateChecklist, |state| {
            state.card(card_id)?;
            let row = ChecklistRow {
                id: state.allocate(),
                card_id,
                title: checklist.title.clone(),
            };
            let payload = state.checklist_payload(&row);
            state.checklists.push(row);
            Ok(payload)
        })
        .await
    }

    async fn update_checklist(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        changes: &ChecklistChanges,
    ) -> RemoteResult<ChecklistPayload> {
        self.call(OperationKind::UpdateChecklist, |state| {
            let checklist = state.checklist_in(card_id, checklist_id)?;
            checklist.title = changes.title.clone();
            let checklist = checklist.clone();
            Ok(state.checklist_payload(&checklist))
        })
        .await
    }

    async fn delete_checklist(&self, card_id: CardId, checklist_id: ChecklistId) -> RemoteResult<()> {
        self.call(OperationKind::DeleteChecklist, |state| {
            state.checklist_in(card_id, checklist_id)?;
            state.remove_checklist(checklist_id);
            Ok(())
        })
        .await
    }

    async fn create_checklist_item(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        item: &NewChecklistItem,
    ) -> RemoteResult<ChecklistItem> {
        self.call(OperationKind::CreateChecklistItem, |state| {
            state.checklist_in(card_id, checklist_id)?;
            let item = ChecklistItem {
                id: state.allocate(),
                title: item.title.clone(),
                completed: false,
                checklist_id,
            };
            state.items.push(item.clone());
            Ok(item)
        })
        .await
    }

    async fn update_checklist_item(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        item_id: ChecklistItemId,
        changes: &ChecklistItemChanges,
    ) -> RemoteResult<ChecklistItem> {
        self.call(OperationKind::UpdateChecklistItem, |state| {
            state.checklist_in(card_id, checklist_id)?;
            let item = state
                .items
                .iter_mut()
                .find(|i| i.id == item_id && i.checklist_id == checklist_id)
                .ok_or_else(|| missing("checklist item", item_id))?;
            if let Some(title) = &changes.title {
                item.title = title.clone();
            }
            if let Some(completed) = changes.completed {
                item.completed = completed;
            }
            Ok(item.clone())
        })
        .await
    }

    async fn delete_checklist_item(
        &self,
        card_id: CardId,
        checklist_id: ChecklistId,
        item_id: ChecklistItemId,
    ) -> RemoteResult<()> {
        self.call(OperationKind::DeleteChecklistItem, |state| {
            state.checklist_in(card_id, checklist_id)?;
            let before = state.items.len();
            state
                .items
                .retain(|i| !(i.id == item_id && i.checklist_id == checklist_id));
            if state.items.len() == before {
                return Err(missing("checklist item", item_id));
            }
            Ok(())
        })
        .await
    }

    async fn create_attachment(&self, card_id: CardId, attachment: &NewAttachment) -> RemoteResult<Attachment> {
        self.call(OperationKind::CreateAttachment, |state| {
            state.card(card_id)?;
            let attachment = Attachment {
                id: state.allocate(),
                filename: attachment.filename.clone(),
                url: attachment.url.clone(),
                card_id,
            };
            state.attachments.push(attachment.clone());
            Ok(attachment)
        })
        .await
    }

    async fn delete_attachment(&self, card_id: CardId, attachment_id: AttachmentId) -> RemoteResult<()> {
        self.call(OperationKind::DeleteAttachment, |state| {
            let before = state.attachments.len();
            state
                .attachments
                .retain(|a| !(a.id == attachment_id && a.card_id == card_id));
            if state.attachments.len() == before {
                return Err(missing("attachment", attachment_id));
            }
            Ok(())
        })
        .await
    }

    async fn create_comment(&self, card_id: CardId, comment: &NewComment) -> RemoteResult<Comment> {
        self.call(OperationKind::CreateComment, |state| {
            state.card(card_id)?;
            let author = state.acting_user().cloned();
            let now = Utc::now();
            let comment = Comment {
                id: state.allocate(),
                content: comment.content.clone(),
                card_id,
                user_id: author.as_ref().map(|u| u.id),
                author,
                created_at: Some(now),
                updated_at: Some(now),
            };
            state.comments.push(comment.clone());
            Ok(comment)
        })
        .await
    }

    async fn update_comment(
        &self,
        card_id: CardId,
        comment_id: CommentId,
        changes: &CommentChanges,
    ) -> RemoteResult<Comment> {
        self.call(OperationKind::UpdateComment, |state| {
            let comment = state
                .comments
                .iter_mut()
                .find(|c| c.id == comment_id && c.card_id == card_id)
                .ok_or_else(|| missing("comment", comment_id))?;
            comment.content = changes.content.clone();
            comment.updated_at = Some(Utc::now());
            Ok(comment.clone())
        })
        .await
    }

    async fn delete_comment(&self, card_id: CardId, comment_id: CommentId) -> RemoteResult<()> {
        self.call(OperationKind::DeleteComment, |state| {
            let before = state.comments.len();
            state
                .comments
                .retain(|c| !(c.id == comment_id && c.card_id == card_id));
            if state.comments.len() == before {
                return Err(missing("comment", comment_id));
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn board_with_cards(remote: &MemoryRemote, titles: &[&str]) -> (BoardId, ListId, Vec<CardId>) {
        let board = remote.create_board(&NewBoard::named("Roadmap")).await.unwrap();
        let list = remote
            .create_list(board.id, &NewList { name: "Todo".to_string() })
            .await
            .unwrap();
        let mut cards = Vec::new();
        for title in titles {
            cards.push(remote.create_card(list.id, &NewCard::titled(*title)).await.unwrap().id);
        }
        (board.id, list.id, cards)
    }

    #[tokio::test]
    async fn test_created_cards_are_appended() {
        let remote = MemoryRemote::new();
        let (_, list_id, cards) = board_with_cards(&remote, &["a", "b", "c"]).await;
        assert_eq!(
            remote.card_order(list_id),
            vec![(cards[0], 0), (cards[1], 1), (cards[2], 2)]
        );
    }

    #[tokio::test]
    async fn test_single_entry_move_shifts_target_and_closes_source() {
        let remote = MemoryRemote::new();
        let (board_id, todo, cards) = board_with_cards(&remote, &["a", "b"]).await;
        let done = remote
            .create_list(board_id, &NewList { name: "Done".to_string() })
            .await
            .unwrap()
            .id;
        let c = remote.create_card(done, &NewCard::titled("c")).await.unwrap().id;

        let response = remote
            .reorder_cards(
                done,
                &[CardPosition {
                    id: cards[0],
                    position: 0,
                    list_id: done,
                }],
            )
            .await
            .unwrap();

        assert_eq!(remote.calls(OperationKind::MoveCard), 1);
        assert_eq!(remote.card_order(todo), vec![(cards[1], 0)]);
        assert_eq!(remote.card_order(done), vec![(cards[0], 0), (c, 1)]);
        assert_eq!(response.len(), 2);
        assert!(response.iter().all(|card| card.labels.is_none()));
    }

    #[tokio::test]
    async fn test_failure_leaves_server_untouched() {
        let remote = MemoryRemote::new();
        let (board_id, list_id, _) = board_with_cards(&remote, &["a"]).await;
        remote.fail(OperationKind::DeleteList);

        let err = remote.delete_list(board_id, list_id).await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 500, .. }));
        assert_eq!(remote.list_order(board_id).len(), 1);

        remote.recover(OperationKind::DeleteList);
        remote.delete_list(board_id, list_id).await.unwrap();
        assert!(remote.list_order(board_id).is_empty());
        assert_eq!(remote.calls(OperationKind::DeleteList), 2);
    }

    #[tokio::test]
    async fn test_board_tree_omits_empty_relations() {
        let remote = MemoryRemote::new();
        let (board_id, _, cards) = board_with_cards(&remote, &["a", "b"]).await;
        remote
            .attach_label(
                cards[1],
                &NewLabel {
                    name: "bug".to_string(),
                    color: "#f00".to_string(),
                },
            )
            .await
            .unwrap();

        let board = remote.get_board(board_id).await.unwrap();
        let lists = board.lists.unwrap();
        let cards = lists[0].cards.as_ref().unwrap();
        assert!(cards[0].labels.is_none());
        assert_eq!(cards[1].labels.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_wrong_owner_in_route_is_not_found() {
        let remote = MemoryRemote::new();
        let (_, list_id, cards) = board_with_cards(&remote, &["a"]).await;
        let err = remote.delete_card(list_id + 100, cards[0]).await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 404, .. }));
    }
}
