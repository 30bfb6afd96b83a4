//! Entity Normalizer
//!
//! Turns wire payloads into store models. Absent relation collections become
//! empty sequences and every child carries the id of the container it is
//! stored under, whatever the payload claimed.

use crate::models::{
    Board, BoardId, Card, CardId, Checklist, List, ListId, Member, UserSummary,
};
use crate::remote::{BoardPayload, CardPayload, ChecklistPayload, ListPayload, MemberPayload};

pub fn board(payload: BoardPayload) -> Board {
    let id = payload.id;
    Board {
        id,
        name: payload.name,
        description: payload.description,
        owner_id: payload.user_id,
        visibility: payload.visibility.unwrap_or_default(),
        members: members(payload.members.unwrap_or_default()),
        lists: lists(payload.lists.unwrap_or_default(), id),
        created_at: payload.created_at,
        updated_at: payload.updated_at,
    }
}

pub fn lists(payloads: Vec<ListPayload>, board_id: BoardId) -> Vec<List> {
    payloads.into_iter().map(|p| list(p, board_id)).collect()
}

pub fn list(payload: ListPayload, board_id: BoardId) -> List {
    let id = payload.id;
    List {
        id,
        name: payload.name,
        board_id,
        position: payload.position,
        cards: cards(payload.cards.unwrap_or_default(), id),
    }
}

pub fn cards(payloads: Vec<CardPayload>, list_id: ListId) -> Vec<Card> {
    payloads.into_iter().map(|p| card(p, list_id)).collect()
}

pub fn card(payload: CardPayload, list_id: ListId) -> Card {
    let mut card = Card::new(payload.id, list_id, payload.title.clone(), payload.position);
    card.description = payload.description.clone();
    apply_relations(&mut card, payload);
    card
}

pub fn checklist(payload: ChecklistPayload, card_id: CardId) -> Checklist {
    let id = payload.id;
    let mut items = payload.items.unwrap_or_default();
    for item in &mut items {
        item.checklist_id = id;
    }
    Checklist {
        id,
        title: payload.title,
        card_id,
        items,
    }
}

pub fn members(payloads: Vec<MemberPayload>) -> Vec<Member> {
    payloads.into_iter().map(member).collect()
}

/// Role defaults to `member` when the pivot row is missing
pub fn member(payload: MemberPayload) -> Member {
    Member {
        role: payload.pivot.map(|p| p.role).unwrap_or_default(),
        user: UserSummary {
            id: payload.id,
            name: payload.name,
            email: payload.email,
        },
    }
}

/// Overlay a partial card response onto the known card.
///
/// Scalars always come from the response. Relations are replaced only when
/// the response carries them; the list id is the caller's business.
pub fn merge_card(existing: &mut Card, payload: CardPayload) {
    existing.title = payload.title.clone();
    existing.description = payload.description.clone();
    existing.position = payload.position;
    apply_relations(existing, payload);
}

/// Overlay a list response; local cards are never touched
pub fn merge_list(existing: &mut List, payload: ListPayload) {
    existing.name = payload.name;
    existing.position = payload.position;
}

/// Overlay a board response. The list tree is never taken from an update
/// response: it is owned by the list commands.
pub fn merge_board(existing: &mut Board, payload: BoardPayload) {
    existing.name = payload.name;
    existing.description = payload.description.or(existing.description.take());
    existing.owner_id = payload.user_id.or(existing.owner_id);
    if let Some(visibility) = payload.visibility {
        existing.visibility = visibility;
    }
    if let Some(payload_members) = payload.members {
        existing.members = members(payload_members);
    }
    existing.created_at = payload.created_at.or(existing.created_at);
    existing.updated_at = payload.updated_at.or(existing.updated_at);
}

fn apply_relations(card: &mut Card, payload: CardPayload) {
    let card_id = card.id;
    if let Some(labels) = payload.labels {
        card.labels = labels;
    }
    if let Some(checklists) = payload.checklists {
        card.checklists = checklists
            .into_iter()
            .map(|c| checklist(c, card_id))
            .collect();
    }
    if let Some(mut attachments) = payload.attachments {
        for attachment in &mut attachments {
            attachment.card_id = card_id;
        }
        card.attachments = attachments;
    }
    if let Some(mut comments) = payload.comments {
        for comment in &mut comments {
            comment.card_id = card_id;
        }
        card.comments = comments;
    }
    if let Some(members) = payload.members {
        card.members = members;
    }
}
