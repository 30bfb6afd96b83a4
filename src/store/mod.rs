//! Kanban Store
//!
//! The client-side copy of server-confirmed board data. Uses Leptos
//! reactive_stores so views can subscribe per field. Every merge below is a
//! plain method on `KanbanState`; commands in `client` call them only after
//! the server has answered.

mod cards;
mod details;

use leptos::prelude::*;
use reactive_stores::Store;

use crate::error::{Result, StoreError};
use crate::index::OwnerIndex;
use crate::models::{remove_by_id, replace_by_id, Board, BoardId, List, ListId, Member, UserSummary};
use crate::normalize;
use crate::remote::{BoardPayload, ListPayload};
use crate::reorder::{insert_at, resequence};
use crate::status::{OperationKey, OperationLog, OperationStatus};
use crate::versions::{Container, ContainerVersions};

/// Canonical client state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct KanbanState {
    /// Board catalog; entries carry no list tree
    pub boards: Vec<Board>,
    /// Active board with its list/card tree, mirrored from `lists`
    pub current_board: Option<Board>,
    /// Flat list collection used by board-scoped commands
    pub lists: Vec<List>,
    /// Board the `lists` collection belongs to
    pub lists_board_id: Option<BoardId>,
    /// Users that can be added as members
    pub users: Vec<UserSummary>,
    pub operations: OperationLog,
    pub owners: OwnerIndex,
    pub versions: ContainerVersions,
}

/// Type alias for the store
pub type KanbanStore = Store<KanbanState>;

/// Create the store and put it in the Leptos context
pub fn provide_kanban_store() -> KanbanStore {
    let store = Store::new(KanbanState::default());
    provide_context(store);
    store
}

/// Get the kanban store from context
pub fn use_kanban_store() -> KanbanStore {
    expect_context::<KanbanStore>()
}

impl KanbanState {
    // ========================
    // Status
    // ========================

    pub fn is_loading(&self) -> bool {
        self.operations.is_loading()
    }

    /// Most recent failure message, if any
    pub fn error(&self) -> Option<&str> {
        self.operations.error()
    }

    pub fn status(&self, key: &OperationKey) -> Option<OperationStatus> {
        self.operations.status(key)
    }

    // ========================
    // Lockstep
    // ========================

    /// Copy `lists` into the active board when both describe the same board
    fn sync_current_board(&mut self) {
        if let (Some(board), Some(board_id)) = (self.current_board.as_mut(), self.lists_board_id) {
            if board.id == board_id {
                board.lists = self.lists.clone();
            }
        }
    }

    /// Run a mutation over the list collection and the index, then mirror it
    pub(crate) fn edit_lists<R>(&mut self, edit: impl FnOnce(&mut Vec<List>, &mut OwnerIndex) -> R) -> R {
        let result = edit(&mut self.lists, &mut self.owners);
        self.sync_current_board();
        result
    }

    pub(crate) fn list(&self, list_id: ListId) -> Result<&List> {
        self.lists
            .iter()
            .find(|l| l.id == list_id)
            .ok_or_else(|| StoreError::not_found("list", list_id))
    }

    /// Board the list collection belongs to
    pub(crate) fn active_board_id(&self) -> Result<BoardId> {
        self.lists_board_id
            .or(self.current_board.as_ref().map(|b| b.id))
            .ok_or_else(|| StoreError::invalid("board", "no board is active"))
    }

    // ========================
    // Boards
    // ========================

    pub fn set_boards(&mut self, boards: Vec<Board>) {
        self.boards = boards;
    }

    pub fn set_users(&mut self, users: Vec<UserSummary>) {
        self.users = users;
    }

    /// Retire the ordering tickets of the list collection's board
    fn retire_lists(&mut self) {
        if let Some(board_id) = self.lists_board_id {
            self.versions.retire(Container::Board(board_id));
        }
        for list in &self.lists {
            self.versions.retire(Container::List(list.id));
        }
    }

    /// Make a fully loaded board the active one
    pub fn set_current_board(&mut self, mut board: Board) {
        resequence(&mut board.lists);
        for list in &mut board.lists {
            resequence(&mut list.cards);
        }
        let entry = Board {
            lists: Vec::new(),
            ..board.clone()
        };
        if !replace_by_id(&mut self.boards, entry.clone()) {
            self.boards.push(entry);
        }

        if self.lists_board_id != Some(board.id) {
            self.retire_lists();
        }
        self.lists = board.lists.clone();
        self.lists_board_id = Some(board.id);
        self.owners = OwnerIndex::build(&self.lists);
        self.current_board = Some(board);
    }

    pub fn insert_board(&mut self, board: Board) {
        self.boards.push(Board {
            lists: Vec::new(),
            ..board
        });
    }

    pub fn merge_board(&mut self, payload: BoardPayload) -> Result<Board> {
        let board_id = payload.id;
        let entry = self
            .boards
            .iter_mut()
            .find(|b| b.id == board_id)
            .ok_or_else(|| StoreError::not_found("board", board_id))?;
        normalize::merge_board(entry, payload.clone());
        let merged = entry.clone();
        if let Some(current) = self.current_board.as_mut().filter(|b| b.id == board_id) {
            normalize::merge_board(current, payload);
        }
        Ok(merged)
    }

    /// Drop a board; clears the active selection if it was active
    pub fn remove_board(&mut self, board_id: BoardId) {
        self.boards.retain(|b| b.id != board_id);
        if self.current_board.as_ref().is_some_and(|b| b.id == board_id) {
            self.current_board = None;
        }
        if self.lists_board_id == Some(board_id) {
            self.retire_lists();
            self.lists.clear();
            self.lists_board_id = None;
            self.owners = OwnerIndex::default();
        }
        self.versions.retire(Container::Board(board_id));
    }

    pub fn set_board_members(&mut self, board_id: BoardId, members: Vec<Member>) -> Result<()> {
        let entry = self
            .boards
            .iter_mut()
            .find(|b| b.id == board_id)
            .ok_or_else(|| StoreError::not_found("board", board_id))?;
        entry.members = members.clone();
        if let Some(current) = self.current_board.as_mut().filter(|b| b.id == board_id) {
            current.members = members;
        }
        Ok(())
    }

    // ========================
    // Lists
    // ========================

    /// Replace the list collection after a full fetch
    pub fn set_lists(&mut self, board_id: BoardId, mut lists: Vec<List>) {
        resequence(&mut lists);
        for list in &mut lists {
            resequence(&mut list.cards);
        }
        if self.lists_board_id != Some(board_id) {
            self.retire_lists();
        }
        self.owners = OwnerIndex::build(&lists);
        self.lists = lists;
        self.lists_board_id = Some(board_id);
        self.sync_current_board();
    }

    /// Insert a created list at its server position
    pub fn insert_list(&mut self, list: List) {
        self.edit_lists(|lists, owners| {
            owners.index_list(&list);
            insert_at(lists, list);
        });
    }

    pub fn merge_list(&mut self, payload: ListPayload) -> Result<List> {
        self.edit_lists(|lists, _| {
            let list = lists
                .iter_mut()
                .find(|l| l.id == payload.id)
                .ok_or_else(|| StoreError::not_found("list", payload.id))?;
            list.name = payload.name;
            Ok(list.clone())
        })
    }

    pub fn remove_list(&mut self, list_id: ListId) -> Result<List> {
        let removed = self.edit_lists(|lists, owners| {
            let removed = remove_by_id(lists, list_id).ok_or_else(|| StoreError::not_found("list", list_id))?;
            owners.forget_list(&removed);
            resequence(lists);
            Ok(removed)
        })?;
        self.versions.retire(Container::List(list_id));
        Ok(removed)
    }

    /// Merge a reorder response.
    ///
    /// Positions and names come from the server. Known lists keep their local
    /// cards even when the response carries some, since cards are only
    /// replaced by the card commands. Lists the client did not know are added.
    pub fn apply_list_order(&mut self, board_id: BoardId, payloads: Vec<ListPayload>) {
        self.edit_lists(|lists, owners| {
            for payload in payloads {
                match lists.iter_mut().find(|l| l.id == payload.id) {
                    Some(list) => normalize::merge_list(list, payload),
                    None => {
                        let list = normalize::list(payload, board_id);
                        owners.index_list(&list);
                        lists.push(list);
                    }
                }
            }
            resequence(lists);
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Card, Label, Visibility};
    use crate::remote::CardPayload;
    use crate::reorder::is_dense;

    pub(crate) fn board(id: BoardId, lists: Vec<List>) -> Board {
        Board {
            id,
            name: format!("board {}", id),
            description: None,
            owner_id: None,
            visibility: Visibility::Private,
            members: Vec::new(),
            lists,
            created_at: None,
            updated_at: None,
        }
    }

    pub(crate) fn list(id: ListId, position: i32, cards: Vec<Card>) -> List {
        List {
            id,
            name: format!("list {}", id),
            board_id: 1,
            position,
            cards,
        }
    }

    pub(crate) fn card(id: u32, list_id: ListId, position: i32) -> Card {
        Card::new(id, list_id, format!("card {}", id), position)
    }

    /// Board 1 with Todo (1: cards 10, 11) and Done (2: empty)
    pub(crate) fn todo_done() -> KanbanState {
        let mut state = KanbanState::default();
        state.set_current_board(board(
            1,
            vec![
                list(1, 0, vec![card(10, 1, 0), card(11, 1, 1)]),
                list(2, 1, Vec::new()),
            ],
        ));
        state
    }

    pub(crate) fn assert_lockstep(state: &KanbanState) {
        let board = state.current_board.as_ref().expect("active board");
        assert_eq!(board.lists, state.lists);
        assert!(is_dense(&state.lists));
        for list in &state.lists {
            assert!(is_dense(&list.cards));
            assert!(list.cards.iter().all(|c| c.list_id == list.id));
        }
    }

    #[test]
    fn test_set_current_board_indexes_tree() {
        let state = todo_done();
        assert_eq!(state.lists_board_id, Some(1));
        assert_eq!(state.owners.card_list(11).unwrap(), 1);
        assert_eq!(state.boards.len(), 1);
        assert!(state.boards[0].lists.is_empty());
        assert_lockstep(&state);
    }

    #[test]
    fn test_insert_and_remove_list_keep_lockstep() {
        let mut state = todo_done();
        state.insert_list(list(3, 1, Vec::new()));
        let ids: Vec<_> = state.lists.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert_lockstep(&state);

        let removed = state.remove_list(1).unwrap();
        assert_eq!(removed.cards.len(), 2);
        assert!(state.owners.card_list(10).is_err());
        assert_lockstep(&state);
    }

    #[test]
    fn test_list_order_preserves_cards() {
        let mut state = todo_done();
        state.apply_list_order(
            1,
            vec![
                ListPayload {
                    id: 2,
                    name: "list 2".to_string(),
                    board_id: Some(1),
                    position: 0,
                    cards: None,
                },
                ListPayload {
                    id: 1,
                    name: "list 1".to_string(),
                    board_id: Some(1),
                    position: 1,
                    cards: None,
                },
            ],
        );
        assert_eq!(state.lists[0].id, 2);
        assert_eq!(state.lists[1].cards.len(), 2);
        assert_lockstep(&state);
    }

    #[test]
    fn test_remove_active_board_clears_selection() {
        let mut state = todo_done();
        state.remove_board(1);
        assert!(state.current_board.is_none());
        assert!(state.lists.is_empty());
        assert!(state.boards.is_empty());
        assert_eq!(state.owners.card_count(), 0);
    }

    #[test]
    fn test_lists_of_another_board_do_not_touch_active_tree() {
        let mut state = todo_done();
        state.set_lists(5, vec![list(8, 0, Vec::new())]);
        assert_eq!(state.current_board.as_ref().map(|b| b.lists.len()), Some(2));
        assert_eq!(state.active_board_id().unwrap(), 5);
    }

    #[test]
    fn test_merge_board_updates_catalog_and_active() {
        let mut state = todo_done();
        let merged = state
            .merge_board(
                serde_json::from_str(r#"{"id":1,"name":"Renamed","visibility":"public"}"#).unwrap(),
            )
            .unwrap();
        assert_eq!(merged.name, "Renamed");
        let current = state.current_board.as_ref().unwrap();
        assert_eq!(current.name, "Renamed");
        assert_eq!(current.visibility, Visibility::Public);
        assert_eq!(current.lists.len(), 2);
    }

    #[test]
    fn test_list_order_keeps_local_cards() {
        let mut state = todo_done();
        state.lists[0].cards[0].labels.push(Label {
            id: 1,
            name: "bug".to_string(),
            color: "#f00".to_string(),
        });
        let echoed = CardPayload {
            id: 10,
            list_id: Some(1),
            title: "card 10".to_string(),
            description: None,
            position: 0,
            labels: None,
            checklists: None,
            attachments: None,
            comments: None,
            members: None,
        };

        state.apply_list_order(
            1,
            vec![
                ListPayload {
                    id: 2,
                    name: "list 2".to_string(),
                    board_id: Some(1),
                    position: 0,
                    cards: Some(Vec::new()),
                },
                ListPayload {
                    id: 1,
                    name: "list 1".to_string(),
                    board_id: Some(1),
                    position: 1,
                    cards: Some(vec![echoed]),
                },
            ],
        );

        assert_eq!(state.lists[0].id, 2);
        let todo = &state.lists[1];
        assert_eq!(todo.cards.len(), 2);
        assert_eq!(todo.cards[0].labels.len(), 1);
        assert_eq!(state.owners.card_list(11).unwrap(), 1);
        assert_lockstep(&state);
    }

    #[test]
    fn test_switching_boards_retires_pending_order_writes() {
        let mut state = todo_done();
        let lists_ticket = state.versions.issue(Container::Board(1));
        let cards_ticket = state.versions.issue(Container::List(1));

        state.set_current_board(board(2, vec![List { board_id: 2, ..list(5, 0, Vec::new()) }]));
        assert!(!state.versions.is_current(&lists_ticket));
        assert!(!state.versions.is_current(&cards_ticket));

        state.set_current_board(todo_done().current_board.unwrap());
        assert!(!state.versions.is_current(&lists_ticket));
        let fresh = state.versions.issue(Container::Board(1));
        assert!(state.versions.is_current(&fresh));
    }

    #[test]
    fn test_refetching_active_board_keeps_pending_order_writes() {
        let mut state = todo_done();
        let ticket = state.versions.issue(Container::Board(1));
        state.set_lists(1, vec![list(1, 0, Vec::new()), list(2, 1, Vec::new())]);
        assert!(state.versions.is_current(&ticket));
    }
}
