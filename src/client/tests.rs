//! Command tests against the in-memory remote

use std::time::Duration;

use leptos::prelude::{Dispose, Owner};
use reactive_stores::Store;

use super::{KanbanClient, Reconciled};
use crate::error::StoreError;
use crate::models::{BoardId, CardId, ListId, UserSummary};
use crate::remote::{
    CardChanges, CardPosition, ChecklistItemChanges, CommentChanges, ListPosition, MemoryRemote, NewAttachment,
    NewBoard, NewCard, NewChecklist, NewChecklistItem, NewComment, NewLabel, NewList, RemoteApi,
};
use crate::reorder::{DragKind, DragResult, DropContainer, DropLocation};
use crate::status::{OperationKey, OperationKind, OperationStatus};
use crate::store::tests::assert_lockstep;
use crate::store::KanbanState;

struct Fixture {
    _owner: Owner,
    client: KanbanClient<MemoryRemote>,
    board_id: BoardId,
    todo: ListId,
    done: ListId,
    a: CardId,
    b: CardId,
}

fn client() -> (Owner, KanbanClient<MemoryRemote>) {
    let owner = Owner::new();
    owner.set();
    let remote = MemoryRemote::with_users(vec![UserSummary {
        id: 1,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
    }]);
    let store = Store::new(KanbanState::default());
    (owner, KanbanClient::new(store, remote))
}

/// Todo [A, B] and an empty Done, loaded as the active board
async fn todo_done() -> Fixture {
    let (owner, client) = client();
    let api = client.api();
    let board_id = api.create_board(&NewBoard::named("Roadmap")).await.unwrap().id;
    let todo = api.create_list(board_id, &NewList { name: "Todo".into() }).await.unwrap().id;
    let done = api.create_list(board_id, &NewList { name: "Done".into() }).await.unwrap().id;
    let a = api.create_card(todo, &NewCard::titled("A")).await.unwrap().id;
    let b = api.create_card(todo, &NewCard::titled("B")).await.unwrap().id;
    client.fetch_board(board_id).await.unwrap();
    Fixture {
        _owner: owner,
        client,
        board_id,
        todo,
        done,
        a,
        b,
    }
}

fn card_ids(state: &KanbanState, list_id: ListId) -> Vec<(CardId, i32)> {
    state
        .list(list_id)
        .unwrap()
        .cards
        .iter()
        .map(|c| (c.id, c.position))
        .collect()
}

fn card_drag(from: (ListId, usize), to: (ListId, usize)) -> DragResult {
    DragResult {
        kind: DragKind::Card,
        source: DropLocation::new(DropContainer::List(from.0), from.1),
        destination: Some(DropLocation::new(DropContainer::List(to.0), to.1)),
    }
}

#[tokio::test]
async fn test_fetch_board_loads_tree() {
    let f = todo_done().await;
    let state = f.client.snapshot().unwrap();

    assert_eq!(state.lists_board_id, Some(f.board_id));
    assert_eq!(card_ids(&state, f.todo), vec![(f.a, 0), (f.b, 1)]);
    assert!(state.list(f.done).unwrap().cards.is_empty());
    assert!(!f.client.is_loading());
    assert_lockstep(&state);
}

#[tokio::test]
async fn test_drag_card_to_other_list_keeps_relations() {
    let f = todo_done().await;
    let label = f
        .client
        .attach_label(
            f.a,
            NewLabel {
                name: "urgent".into(),
                color: "#ff0000".into(),
            },
        )
        .await
        .unwrap();
    let checklist = f
        .client
        .create_checklist(f.a, NewChecklist { title: "Steps".into() })
        .await
        .unwrap();
    f.client
        .create_checklist_item(checklist.id, NewChecklistItem { title: "one".into() })
        .await
        .unwrap();
    let before = f.client.snapshot().unwrap().card(f.a).unwrap().clone();

    let outcome = f.client.handle_drop(card_drag((f.todo, 0), (f.done, 0))).await.unwrap();
    assert_eq!(outcome, Some(Reconciled::Applied));

    let state = f.client.snapshot().unwrap();
    assert_eq!(card_ids(&state, f.todo), vec![(f.b, 0)]);
    assert_eq!(card_ids(&state, f.done), vec![(f.a, 0)]);
    let moved = state.card(f.a).unwrap();
    assert_eq!(moved.list_id, f.done);
    assert_eq!(moved.labels, vec![label]);
    assert_eq!(moved.checklists, before.checklists);
    assert_eq!(state.owners.checklist_card(checklist.id).unwrap(), f.a);
    assert_eq!(f.client.api().calls(OperationKind::MoveCard), 1);
    assert_eq!(f.client.api().card_order(f.done), vec![(f.a, 0)]);
    assert_lockstep(&state);
}

#[tokio::test]
async fn test_drag_list_to_front() {
    let f = todo_done().await;
    let doing = f
        .client
        .create_list(NewList { name: "Doing".into() })
        .await
        .unwrap()
        .id;
    // Todo, Doing, Done
    f.client
        .reorder_lists(vec![
            ListPosition { id: f.todo, position: 0 },
            ListPosition { id: doing, position: 1 },
            ListPosition { id: f.done, position: 2 },
        ])
        .await
        .unwrap();
    let cards_before = f.client.snapshot().unwrap().lists.clone();

    let drag = DragResult {
        kind: DragKind::List,
        source: DropLocation::new(DropContainer::Board, 2),
        destination: Some(DropLocation::new(DropContainer::Board, 0)),
    };
    assert_eq!(f.client.handle_drop(drag).await.unwrap(), Some(Reconciled::Applied));

    let state = f.client.snapshot().unwrap();
    let order: Vec<_> = state.lists.iter().map(|l| (l.id, l.position)).collect();
    assert_eq!(order, vec![(f.done, 0), (f.todo, 1), (doing, 2)]);
    for list in &state.lists {
        let before = cards_before.iter().find(|l| l.id == list.id).unwrap();
        assert_eq!(list.cards, before.cards);
    }
    assert_eq!(f.client.api().list_order(f.board_id), order);
    assert_lockstep(&state);
}

#[tokio::test]
async fn test_drop_on_origin_sends_nothing() {
    let f = todo_done().await;
    let cancelled = DragResult {
        destination: None,
        ..card_drag((f.todo, 0), (f.todo, 0))
    };

    assert_eq!(f.client.handle_drop(cancelled).await.unwrap(), None);
    assert_eq!(f.client.handle_drop(card_drag((f.todo, 1), (f.todo, 1))).await.unwrap(), None);
    assert_eq!(f.client.api().calls(OperationKind::ReorderCards), 0);
}

#[tokio::test]
async fn test_reorder_within_list_is_dense() {
    let f = todo_done().await;
    let c = f.client.create_card(f.todo, NewCard::titled("C")).await.unwrap().id;

    f.client.handle_drop(card_drag((f.todo, 2), (f.todo, 0))).await.unwrap();

    let state = f.client.snapshot().unwrap();
    assert_eq!(card_ids(&state, f.todo), vec![(c, 0), (f.a, 1), (f.b, 2)]);
    assert_eq!(f.client.api().card_order(f.todo), card_ids(&state, f.todo));
    assert_lockstep(&state);
}

#[tokio::test]
async fn test_partial_card_batch_is_rejected() {
    let f = todo_done().await;
    let err = f
        .client
        .reorder_cards(
            f.todo,
            vec![CardPosition {
                id: f.b,
                position: 0,
                list_id: f.todo,
            }],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidInput { .. }));
    assert_eq!(f.client.api().calls(OperationKind::ReorderCards), 0);
    assert_eq!(f.client.error().as_deref(), Some("Failed to reorder cards"));
}

#[tokio::test]
async fn test_failed_delete_list_keeps_state() {
    let f = todo_done().await;
    let before = f.client.snapshot().unwrap();
    f.client.api().fail(OperationKind::DeleteList);

    let err = f.client.delete_list(f.todo).await.unwrap_err();
    assert!(matches!(err, StoreError::RemoteFailure { .. }));

    let after = f.client.snapshot().unwrap();
    assert_eq!(after.lists, before.lists);
    assert_eq!(f.client.error().as_deref(), Some("Failed to delete list"));
    assert_eq!(
        after.status(&OperationKey::new(OperationKind::DeleteList, f.todo)),
        Some(OperationStatus::Failed("Failed to delete list".into()))
    );

    f.client.api().recover(OperationKind::DeleteList);
    f.client.delete_list(f.todo).await.unwrap();
    let state = f.client.snapshot().unwrap();
    assert!(state.list(f.todo).is_err());
    assert!(state.owners.card_list(f.a).is_err());
    assert_eq!(f.client.error(), None);
    assert_lockstep(&state);
}

#[tokio::test]
async fn test_unknown_card_never_reaches_remote() {
    let f = todo_done().await;
    let err = f
        .client
        .update_card(
            999,
            CardChanges {
                title: Some("ghost".into()),
                description: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(f.client.api().calls(OperationKind::UpdateCard), 0);
    assert_eq!(f.client.error().as_deref(), Some("Failed to update card"));
}

#[tokio::test]
async fn test_failures_are_kept_per_operation() {
    let f = todo_done().await;
    f.client.api().fail(OperationKind::DeleteList);
    f.client.api().fail(OperationKind::UpdateCard);

    let _ = f.client.delete_list(f.done).await;
    let _ = f
        .client
        .update_card(
            f.b,
            CardChanges {
                title: Some("B2".into()),
                description: None,
            },
        )
        .await;

    let state = f.client.snapshot().unwrap();
    let errors = state.operations.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].0, OperationKey::new(OperationKind::DeleteList, f.done));
    assert_eq!(errors[1].1, "Failed to update card");
    assert_eq!(state.error(), Some("Failed to update card"));

    f.client
        .clear_error(OperationKey::new(OperationKind::UpdateCard, f.b))
        .unwrap();
    assert_eq!(f.client.error().as_deref(), Some("Failed to delete list"));
}

#[test]
fn test_clear_error_reports_disposed_store() {
    let owner = Owner::new();
    owner.set();
    let store = Store::new(KanbanState::default());
    let client = KanbanClient::new(store, MemoryRemote::new());
    let key = OperationKey::new(OperationKind::UpdateCard, 1);
    assert_eq!(client.clear_error(key), Ok(()));

    store.dispose();
    assert_eq!(
        client.clear_error(key),
        Err(StoreError::invalid("store", "the store has been disposed"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_reorder_settling_after_board_switch_is_superseded() {
    let f = todo_done().await;
    let api = f.client.api();
    let other = api.create_board(&NewBoard::named("Ops")).await.unwrap().id;
    let backlog = api.create_list(other, &NewList { name: "Backlog".into() }).await.unwrap().id;
    api.push_latency(OperationKind::ReorderLists, Duration::from_millis(100));

    let swapped = vec![
        ListPosition { id: f.done, position: 0 },
        ListPosition { id: f.todo, position: 1 },
    ];
    let (reordered, switched) = tokio::join!(f.client.reorder_lists(swapped), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        f.client.fetch_board(other).await
    });
    assert_eq!(reordered.unwrap(), Reconciled::Superseded);
    switched.unwrap();

    let state = f.client.snapshot().unwrap();
    assert_eq!(state.lists_board_id, Some(other));
    let ids: Vec<ListId> = state.lists.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![backlog]);
    assert!(state.lists.iter().all(|l| l.board_id == other));
    assert!(state.owners.card_list(f.a).is_err());
    assert_lockstep(&state);
}

#[tokio::test(start_paused = true)]
async fn test_list_created_after_board_switch_stays_out() {
    let f = todo_done().await;
    let api = f.client.api();
    let other = api.create_board(&NewBoard::named("Ops")).await.unwrap().id;
    api.push_latency(OperationKind::CreateList, Duration::from_millis(100));

    let (created, switched) = tokio::join!(f.client.create_list(NewList { name: "Later".into() }), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        f.client.fetch_board(other).await
    });
    let created = created.unwrap();
    switched.unwrap();
    assert_eq!(created.board_id, f.board_id);

    let state = f.client.snapshot().unwrap();
    assert_eq!(state.lists_board_id, Some(other));
    assert!(state.lists.is_empty());
    assert_lockstep(&state);
}

#[tokio::test(start_paused = true)]
async fn test_late_reorder_response_is_superseded() {
    let f = todo_done().await;
    let api = f.client.api();
    api.push_latency(OperationKind::ReorderCards, Duration::from_millis(200));
    api.push_latency(OperationKind::ReorderCards, Duration::from_millis(10));

    let swapped = vec![
        CardPosition {
            id: f.b,
            position: 0,
            list_id: f.todo,
        },
        CardPosition {
            id: f.a,
            position: 1,
            list_id: f.todo,
        },
    ];
    let restored = vec![
        CardPosition {
            id: f.a,
            position: 0,
            list_id: f.todo,
        },
        CardPosition {
            id: f.b,
            position: 1,
            list_id: f.todo,
        },
    ];

    let (first, second) = tokio::join!(
        f.client.reorder_cards(f.todo, swapped),
        f.client.reorder_cards(f.todo, restored),
    );
    assert_eq!(first.unwrap(), Reconciled::Superseded);
    assert_eq!(second.unwrap(), Reconciled::Applied);

    let state = f.client.snapshot().unwrap();
    assert_eq!(card_ids(&state, f.todo), vec![(f.a, 0), (f.b, 1)]);
    assert_eq!(api.card_order(f.todo), card_ids(&state, f.todo));
    assert_eq!(
        state.status(&OperationKey::new(OperationKind::ReorderCards, f.todo)),
        Some(OperationStatus::Superseded)
    );
    assert!(!state.is_loading());
    assert_lockstep(&state);
}

#[tokio::test(start_paused = true)]
async fn test_loading_while_request_in_flight() {
    let f = todo_done().await;
    f.client
        .api()
        .push_latency(OperationKind::UpdateCard, Duration::from_millis(50));

    let update = f.client.update_card(
        f.a,
        CardChanges {
            title: Some("A2".into()),
            description: None,
        },
    );
    let probe = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        f.client.is_loading()
    };
    let (updated, loading) = tokio::join!(update, probe);

    assert!(loading);
    assert_eq!(updated.unwrap().title, "A2");
    assert!(!f.client.is_loading());
}

#[tokio::test]
async fn test_card_detail_commands() {
    let f = todo_done().await;

    let checklist = f
        .client
        .create_checklist(f.b, NewChecklist { title: "QA".into() })
        .await
        .unwrap();
    let item = f
        .client
        .create_checklist_item(checklist.id, NewChecklistItem { title: "smoke".into() })
        .await
        .unwrap();
    let toggled = f
        .client
        .update_checklist_item(item.id, ChecklistItemChanges::toggle(true))
        .await
        .unwrap();
    assert!(toggled.completed);
    assert_eq!(toggled.checklist_id, checklist.id);

    let attachment = f
        .client
        .create_attachment(
            f.b,
            NewAttachment {
                filename: "spec.pdf".into(),
                url: "https://files.example.com/spec.pdf".into(),
            },
        )
        .await
        .unwrap();
    let comment = f
        .client
        .create_comment(f.b, NewComment { content: "looks good".into() })
        .await
        .unwrap();
    assert_eq!(comment.author.as_ref().map(|u| u.id), Some(1));
    f.client
        .update_comment(comment.id, CommentChanges { content: "ship it".into() })
        .await
        .unwrap();

    let state = f.client.snapshot().unwrap();
    let card = state.card(f.b).unwrap();
    assert!(card.checklists[0].items[0].completed);
    assert_eq!(card.attachments[0].id, attachment.id);
    assert_eq!(card.comments[0].content, "ship it");
    assert_lockstep(&state);

    f.client.delete_checklist_item(item.id).await.unwrap();
    f.client.delete_checklist(checklist.id).await.unwrap();
    f.client.delete_attachment(attachment.id).await.unwrap();
    f.client.delete_comment(comment.id).await.unwrap();

    let state = f.client.snapshot().unwrap();
    let card = state.card(f.b).unwrap();
    assert!(card.checklists.is_empty());
    assert!(card.attachments.is_empty());
    assert!(card.comments.is_empty());
    assert!(state.owners.item_checklist(item.id).is_err());
    assert!(state.owners.comment_card(comment.id).is_err());
}

#[tokio::test]
async fn test_detach_unknown_label_is_not_found() {
    let f = todo_done().await;
    let err = f.client.detach_label(f.a, 4242).await.unwrap_err();

    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(f.client.api().calls(OperationKind::DetachLabel), 0);
}

#[tokio::test]
async fn test_invalid_label_colour_is_rejected() {
    let f = todo_done().await;
    let err = f
        .client
        .attach_label(
            f.a,
            NewLabel {
                name: "bug".into(),
                color: "red".into(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidInput { .. }));
    assert_eq!(f.client.error().as_deref(), Some("Failed to attach label"));
}

#[tokio::test]
async fn test_delete_active_board_clears_lists() {
    let f = todo_done().await;
    f.client.delete_board(f.board_id).await.unwrap();

    let state = f.client.snapshot().unwrap();
    assert!(state.current_board.is_none());
    assert!(state.lists.is_empty());
    assert_eq!(state.lists_board_id, None);
    assert!(state.boards.is_empty());
}

#[tokio::test]
async fn test_list_commands_keep_lockstep() {
    let f = todo_done().await;
    let created = f
        .client
        .create_list(NewList { name: "Review".into() })
        .await
        .unwrap();
    assert_eq!(created.position, 2);

    f.client
        .update_list(created.id, crate::remote::ListChanges { name: "QA".into() })
        .await
        .unwrap();
    let state = f.client.snapshot().unwrap();
    assert_eq!(state.list(created.id).unwrap().name, "QA");
    assert_lockstep(&state);

    f.client.delete_card(f.a).await.unwrap();
    let state = f.client.snapshot().unwrap();
    assert_eq!(card_ids(&state, f.todo), vec![(f.b, 0)]);
    assert_lockstep(&state);
}
