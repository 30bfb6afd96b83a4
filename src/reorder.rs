//! Reorder/Move Algorithm
//!
//! Classifies a finished drag gesture and computes the exact order to send:
//! a full list batch for the board, a full card batch for one list, or a
//! single-card move between two lists. Positions are always dense array
//! indices so the server can apply them as "set exact order".

use std::str::FromStr;

use crate::error::{Result, StoreError};
use crate::models::{BoardId, CardId, List, ListId, Positioned};
use crate::remote::{CardPosition, ListPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    List,
    Card,
}

/// A droppable region reported by the gesture layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropContainer {
    /// The row of lists on the active board
    Board,
    /// The card column of one list
    List(ListId),
}

impl FromStr for DropContainer {
    type Err = StoreError;

    /// Parses the droppable ids used by the board view: `lists` and `list-<id>`
    fn from_str(s: &str) -> Result<Self> {
        if s == "lists" || s == "board" {
            return Ok(DropContainer::Board);
        }
        s.strip_prefix("list-")
            .and_then(|id| id.parse().ok())
            .map(DropContainer::List)
            .ok_or_else(|| StoreError::invalid("droppable", format!("unknown droppable '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropLocation {
    pub container: DropContainer,
    pub index: usize,
}

impl DropLocation {
    pub fn new(container: DropContainer, index: usize) -> Self {
        Self { container, index }
    }
}

/// What the gesture layer reports when a drag ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragResult {
    pub kind: DragKind,
    pub source: DropLocation,
    /// `None` when the drag was cancelled or dropped outside any target
    pub destination: Option<DropLocation>,
}

/// The store command a drop resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPlan {
    ReorderLists {
        board_id: BoardId,
        order: Vec<ListPosition>,
    },
    ReorderCards {
        list_id: ListId,
        order: Vec<CardPosition>,
    },
    MoveCard {
        card_id: CardId,
        source_list_id: ListId,
        target_list_id: ListId,
        position: i32,
    },
}

/// Classify a drop against the board's current lists.
///
/// Returns `Ok(None)` when nothing should be sent: no destination, or the
/// item was dropped back where it started.
pub fn plan_drop(board_id: BoardId, lists: &[List], drag: &DragResult) -> Result<Option<DropPlan>> {
    let Some(destination) = drag.destination else {
        return Ok(None);
    };
    if destination == drag.source {
        return Ok(None);
    }

    match drag.kind {
        DragKind::List => {
            if drag.source.container != DropContainer::Board || destination.container != DropContainer::Board {
                return Err(StoreError::invalid("droppable", "lists can only be dropped on the board"));
            }
            if drag.source.index >= lists.len() {
                return Err(StoreError::not_found("list at index", drag.source.index as u32));
            }
            let mut ids: Vec<ListId> = lists.iter().map(|l| l.id).collect();
            move_index(&mut ids, drag.source.index, destination.index);
            let order = ids
                .into_iter()
                .enumerate()
                .map(|(position, id)| ListPosition {
                    id,
                    position: position as i32,
                })
                .collect();
            Ok(Some(DropPlan::ReorderLists { board_id, order }))
        }
        DragKind::Card => {
            let source_list_id = card_column(drag.source.container)?;
            let target_list_id = card_column(destination.container)?;
            let source = find_list(lists, source_list_id)?;
            let target = find_list(lists, target_list_id)?;
            let card = source
                .cards
                .get(drag.source.index)
                .ok_or_else(|| StoreError::not_found("card at index", drag.source.index as u32))?;

            if source_list_id == target_list_id {
                let mut ids: Vec<CardId> = source.cards.iter().map(|c| c.id).collect();
                move_index(&mut ids, drag.source.index, destination.index);
                let order = ids
                    .into_iter()
                    .enumerate()
                    .map(|(position, id)| CardPosition {
                        id,
                        position: position as i32,
                        list_id: source_list_id,
                    })
                    .collect();
                return Ok(Some(DropPlan::ReorderCards {
                    list_id: source_list_id,
                    order,
                }));
            }

            Ok(Some(DropPlan::MoveCard {
                card_id: card.id,
                source_list_id,
                target_list_id,
                position: destination.index.min(target.cards.len()) as i32,
            }))
        }
    }
}

fn card_column(container: DropContainer) -> Result<ListId> {
    match container {
        DropContainer::List(id) => Ok(id),
        DropContainer::Board => Err(StoreError::invalid("droppable", "cards can only be dropped on a list")),
    }
}

fn find_list(lists: &[List], list_id: ListId) -> Result<&List> {
    lists
        .iter()
        .find(|l| l.id == list_id)
        .ok_or_else(|| StoreError::not_found("list", list_id))
}

/// Remove the element at `from` and reinsert it at `to`; past-the-end appends
pub fn move_index<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() {
        return;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
}

// ========================
// Position helpers
// ========================

/// Set every position to its array index
pub fn densify<T: Positioned>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_position(index as i32);
    }
}

pub fn is_dense<T: Positioned>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| item.position() == index as i32)
}

/// Stable sort by position, then densify
pub fn resequence<T: Positioned>(items: &mut [T]) {
    items.sort_by_key(|item| item.position());
    densify(items);
}

/// Insert at the item's own position, clamped to the sequence, and densify
pub fn insert_at<T: Positioned>(items: &mut Vec<T>, item: T) -> usize {
    let index = item.position().clamp(0, items.len() as i32) as usize;
    items.insert(index, item);
    densify(items);
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Card;

    fn list(id: ListId, position: i32, cards: &[CardId]) -> List {
        List {
            id,
            name: format!("list {}", id),
            board_id: 1,
            position,
            cards: cards
                .iter()
                .enumerate()
                .map(|(i, card_id)| Card::new(*card_id, id, format!("card {}", card_id), i as i32))
                .collect(),
        }
    }

    fn drag(kind: DragKind, from: (DropContainer, usize), to: Option<(DropContainer, usize)>) -> DragResult {
        DragResult {
            kind,
            source: DropLocation::new(from.0, from.1),
            destination: to.map(|(container, index)| DropLocation::new(container, index)),
        }
    }

    #[test]
    fn test_parse_droppable_ids() {
        assert_eq!("lists".parse::<DropContainer>().unwrap(), DropContainer::Board);
        assert_eq!("list-42".parse::<DropContainer>().unwrap(), DropContainer::List(42));
        assert!("list-".parse::<DropContainer>().is_err());
        assert!("column-3".parse::<DropContainer>().is_err());
    }

    #[test]
    fn test_cancelled_drag_is_noop() {
        let lists = vec![list(1, 0, &[10])];
        let plan = plan_drop(1, &lists, &drag(DragKind::Card, (DropContainer::List(1), 0), None)).unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn test_drop_on_origin_is_noop() {
        let lists = vec![list(1, 0, &[10, 11])];
        let same = (DropContainer::List(1), 1);
        assert!(plan_drop(1, &lists, &drag(DragKind::Card, same, Some(same)))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_move_done_list_to_front() {
        let lists = vec![list(1, 0, &[]), list(2, 1, &[]), list(3, 2, &[])];
        let plan = plan_drop(
            7,
            &lists,
            &drag(DragKind::List, (DropContainer::Board, 2), Some((DropContainer::Board, 0))),
        )
        .unwrap();
        assert_eq!(
            plan,
            Some(DropPlan::ReorderLists {
                board_id: 7,
                order: vec![
                    ListPosition { id: 3, position: 0 },
                    ListPosition { id: 1, position: 1 },
                    ListPosition { id: 2, position: 2 },
                ],
            })
        );
    }

    #[test]
    fn test_same_list_reorder_sends_full_dense_batch() {
        let lists = vec![list(1, 0, &[10, 11, 12])];
        let plan = plan_drop(
            1,
            &lists,
            &drag(DragKind::Card, (DropContainer::List(1), 0), Some((DropContainer::List(1), 2))),
        )
        .unwrap();
        let Some(DropPlan::ReorderCards { list_id, order }) = plan else {
            panic!("expected a card reorder");
        };
        assert_eq!(list_id, 1);
        let ids: Vec<_> = order.iter().map(|p| (p.id, p.position, p.list_id)).collect();
        assert_eq!(ids, vec![(11, 0, 1), (12, 1, 1), (10, 2, 1)]);
    }

    #[test]
    fn test_cross_list_drop_is_move() {
        let lists = vec![list(1, 0, &[10, 11]), list(2, 1, &[])];
        let plan = plan_drop(
            1,
            &lists,
            &drag(DragKind::Card, (DropContainer::List(1), 0), Some((DropContainer::List(2), 0))),
        )
        .unwrap();
        assert_eq!(
            plan,
            Some(DropPlan::MoveCard {
                card_id: 10,
                source_list_id: 1,
                target_list_id: 2,
                position: 0,
            })
        );
    }

    #[test]
    fn test_move_past_end_appends() {
        let lists = vec![list(1, 0, &[10]), list(2, 1, &[20])];
        let plan = plan_drop(
            1,
            &lists,
            &drag(DragKind::Card, (DropContainer::List(1), 0), Some((DropContainer::List(2), 9))),
        )
        .unwrap();
        assert!(matches!(plan, Some(DropPlan::MoveCard { position: 1, .. })));
    }

    #[test]
    fn test_unknown_list_and_bad_index_are_not_found() {
        let lists = vec![list(1, 0, &[10])];
        let err = plan_drop(
            1,
            &lists,
            &drag(DragKind::Card, (DropContainer::List(1), 0), Some((DropContainer::List(9), 0))),
        )
        .unwrap_err();
        assert_eq!(err, StoreError::not_found("list", 9));

        let err = plan_drop(
            1,
            &lists,
            &drag(DragKind::Card, (DropContainer::List(1), 3), Some((DropContainer::List(1), 0))),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "card at index", id: 3 }));
    }

    #[test]
    fn test_list_dropped_into_card_column_is_rejected() {
        let lists = vec![list(1, 0, &[])];
        let err = plan_drop(
            1,
            &lists,
            &drag(DragKind::List, (DropContainer::Board, 0), Some((DropContainer::List(1), 0))),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput { .. }));
    }

    #[test]
    fn test_position_helpers() {
        let mut lists = vec![list(1, 4, &[]), list(2, 1, &[]), list(3, 1, &[])];
        assert!(!is_dense(&lists));
        resequence(&mut lists);
        let ids: Vec<_> = lists.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(is_dense(&lists));

        let index = insert_at(&mut lists, list(4, 99, &[]));
        assert_eq!(index, 3);
        assert!(is_dense(&lists));
    }

    #[test]
    fn test_move_index_clamps() {
        let mut ids = vec![1, 2, 3];
        move_index(&mut ids, 0, 10);
        assert_eq!(ids, vec![2, 3, 1]);
        move_index(&mut ids, 5, 0);
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
