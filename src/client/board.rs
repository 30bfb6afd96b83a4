//! Board and user commands

use crate::error::{Result, StoreError};
use crate::models::{Board, BoardId, Member, UserId, UserSummary};
use crate::normalize;
use crate::remote::{BoardChanges, NewBoard, NewMember, RemoteApi};
use crate::status::{OperationKey, OperationKind};
use crate::store::KanbanState;

use super::{rejected, KanbanClient};

fn known_board(state: &KanbanState, board_id: BoardId) -> Result<()> {
    if state.boards.iter().any(|b| b.id == board_id) {
        Ok(())
    } else {
        Err(StoreError::not_found("board", board_id))
    }
}

impl<A: RemoteApi> KanbanClient<A> {
    /// Load the board catalog; the only full replace of `boards`
    pub async fn fetch_boards(&self) -> Result<Vec<Board>> {
        let kind = OperationKind::FetchBoards;
        self.track(OperationKey::global(kind), async {
            let payloads = self.api.list_boards().await.map_err(rejected(kind))?;
            let boards: Vec<Board> = payloads.into_iter().map(normalize::board).collect();
            tracing::info!(count = boards.len(), "boards loaded");
            self.write(|state| state.set_boards(boards.clone()))?;
            Ok(boards)
        })
        .await
    }

    /// Load one board with its list/card tree and make it active
    pub async fn fetch_board(&self, board_id: BoardId) -> Result<Board> {
        let kind = OperationKind::FetchBoard;
        self.track(OperationKey::new(kind, board_id), async {
            let payload = self.api.get_board(board_id).await.map_err(rejected(kind))?;
            let board = normalize::board(payload);
            tracing::info!(board_id, lists = board.lists.len(), "board loaded");
            self.merge(|state| {
                state.set_current_board(board);
                state
                    .current_board
                    .clone()
                    .ok_or_else(|| StoreError::not_found("board", board_id))
            })
        })
        .await
    }

    pub async fn create_board(&self, board: NewBoard) -> Result<Board> {
        let kind = OperationKind::CreateBoard;
        self.track(OperationKey::global(kind), async {
            board.validate()?;
            let payload = self.api.create_board(&board).await.map_err(rejected(kind))?;
            let created = normalize::board(payload);
            tracing::info!(board_id = created.id, "board created");
            self.write(|state| state.insert_board(created.clone()))?;
            Ok(created)
        })
        .await
    }

    pub async fn update_board(&self, board_id: BoardId, changes: BoardChanges) -> Result<Board> {
        let kind = OperationKind::UpdateBoard;
        self.track(OperationKey::new(kind, board_id), async {
            changes.validate()?;
            self.resolve(|state| known_board(state, board_id))?;
            let payload = self
                .api
                .update_board(board_id, &changes)
                .await
                .map_err(rejected(kind))?;
            let merged = self.merge(|state| state.merge_board(payload))?;
            tracing::info!(board_id, "board updated");
            Ok(merged)
        })
        .await
    }

    pub async fn delete_board(&self, board_id: BoardId) -> Result<()> {
        let kind = OperationKind::DeleteBoard;
        self.track(OperationKey::new(kind, board_id), async {
            self.api.delete_board(board_id).await.map_err(rejected(kind))?;
            self.write(|state| state.remove_board(board_id))?;
            tracing::info!(board_id, "board deleted");
            Ok(())
        })
        .await
    }

    pub async fn add_board_member(&self, board_id: BoardId, member: NewMember) -> Result<Vec<Member>> {
        let kind = OperationKind::AddBoardMember;
        self.track(OperationKey::new(kind, board_id), async {
            self.resolve(|state| known_board(state, board_id))?;
            let payload = self
                .api
                .add_board_member(board_id, &member)
                .await
                .map_err(rejected(kind))?;
            let members = normalize::members(payload.members);
            self.merge(|state| state.set_board_members(board_id, members.clone()))?;
            tracing::info!(board_id, user_id = member.user_id, "board member added");
            Ok(members)
        })
        .await
    }

    pub async fn remove_board_member(&self, board_id: BoardId, user_id: UserId) -> Result<Vec<Member>> {
        let kind = OperationKind::RemoveBoardMember;
        self.track(OperationKey::new(kind, board_id), async {
            self.resolve(|state| known_board(state, board_id))?;
            let payload = self
                .api
                .remove_board_member(board_id, user_id)
                .await
                .map_err(rejected(kind))?;
            let members = normalize::members(payload.members);
            self.merge(|state| state.set_board_members(board_id, members.clone()))?;
            tracing::info!(board_id, user_id, "board member removed");
            Ok(members)
        })
        .await
    }

    /// Load the directory of users that can be added as members
    pub async fn fetch_users(&self) -> Result<Vec<UserSummary>> {
        let kind = OperationKind::FetchUsers;
        self.track(OperationKey::global(kind), async {
            let users = self.api.list_users().await.map_err(rejected(kind))?;
            self.write(|state| state.set_users(users.clone()))?;
            Ok(users)
        })
        .await
    }
}
