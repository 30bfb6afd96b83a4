//! Card merges: creation, updates, deletes, batch reorders and cross-list moves

use crate::error::{Result, StoreError};
use crate::index::OwnerIndex;
use crate::models::{remove_by_id, Card, CardId, List, ListId};
use crate::normalize;
use crate::remote::CardPayload;
use crate::reorder::{insert_at, resequence};

use super::KanbanState;

fn list_mut(lists: &mut [List], list_id: ListId) -> Result<&mut List> {
    lists
        .iter_mut()
        .find(|l| l.id == list_id)
        .ok_or_else(|| StoreError::not_found("list", list_id))
}

/// Overlay a response onto a card held by `list_id`.
///
/// The response may replace the card's children, so they are dropped from
/// the index first and the merged card is indexed again.
fn merge_indexed(owners: &mut OwnerIndex, list_id: ListId, card: &mut Card, payload: CardPayload) {
    owners.forget_card(card);
    normalize::merge_card(card, payload);
    owners.index_card(list_id, card);
}

/// Build the local card for a response entry the target list does not hold.
///
/// A card still held by another list was moved there by the server: it is
/// detached with its relations instead of being created from the bare
/// response, so it never sits in two lists.
fn adopt_card(lists: &mut [List], owners: &mut OwnerIndex, list_id: ListId, payload: CardPayload) -> Card {
    let mut elsewhere = None;
    if let Some(other) = owners.card_list(payload.id).ok().filter(|other| *other != list_id) {
        if let Some(source) = lists.iter_mut().find(|l| l.id == other) {
            elsewhere = remove_by_id(&mut source.cards, payload.id);
            resequence(&mut source.cards);
        }
    }

    match elsewhere {
        Some(mut card) => {
            card.list_id = list_id;
            merge_indexed(owners, list_id, &mut card, payload);
            card
        }
        None => {
            let card = normalize::card(payload, list_id);
            owners.index_card(list_id, &card);
            card
        }
    }
}

impl KanbanState {
    /// Replace one list's cards after a refresh
    pub fn set_cards(&mut self, list_id: ListId, mut cards: Vec<Card>) -> Result<()> {
        resequence(&mut cards);
        self.edit_lists(|lists, owners| {
            let list = list_mut(lists, list_id)?;
            owners.forget_list(list);
            list.cards = cards;
            owners.index_list(list);
            Ok(())
        })
    }

    /// Insert a created card at its server position
    pub fn insert_card(&mut self, card: Card) -> Result<Card> {
        self.edit_lists(|lists, owners| {
            let list = list_mut(lists, card.list_id)?;
            owners.index_card(list.id, &card);
            let index = insert_at(&mut list.cards, card);
            Ok(list.cards[index].clone())
        })
    }

    /// Overlay an update response onto the known card
    pub fn merge_card(&mut self, list_id: ListId, payload: CardPayload) -> Result<Card> {
        self.edit_lists(|lists, owners| {
            let list = list_mut(lists, list_id)?;
            let card = list
                .card_mut(payload.id)
                .ok_or_else(|| StoreError::not_found("card", payload.id))?;
            merge_indexed(owners, list_id, card, payload);
            let merged = card.clone();
            resequence(&mut list.cards);
            Ok(merged)
        })
    }

    pub fn remove_card(&mut self, list_id: ListId, card_id: CardId) -> Result<Card> {
        self.edit_lists(|lists, owners| {
            let list = list_mut(lists, list_id)?;
            let removed = remove_by_id(&mut list.cards, card_id).ok_or_else(|| StoreError::not_found("card", card_id))?;
            owners.forget_card(&removed);
            resequence(&mut list.cards);
            Ok(removed)
        })
    }

    /// Merge a batch reorder response for one list.
    ///
    /// Server positions win; relations are kept from local state because the
    /// response does not carry them.
    pub fn apply_card_order(&mut self, list_id: ListId, payloads: Vec<CardPayload>) -> Result<()> {
        self.edit_lists(|lists, owners| {
            list_mut(lists, list_id)?;
            for payload in payloads {
                let list = list_mut(lists, list_id)?;
                if let Some(card) = list.card_mut(payload.id) {
                    merge_indexed(owners, list_id, card, payload);
                    continue;
                }
                let card = adopt_card(lists, owners, list_id, payload);
                list_mut(lists, list_id)?.cards.push(card);
            }
            resequence(&mut list_mut(lists, list_id)?.cards);
            Ok(())
        })
    }

    /// Merge a confirmed move.
    ///
    /// The card leaves the source list with all of its relations, takes the
    /// confirmed fields from the response and lands at the confirmed
    /// position in the target. Other cards in the response only update the
    /// target's positions.
    pub fn apply_move(
        &mut self,
        card_id: CardId,
        source_list_id: ListId,
        target_list_id: ListId,
        position: i32,
        payloads: Vec<CardPayload>,
    ) -> Result<Card> {
        // Both lists must exist before anything is detached
        self.list(source_list_id)?;
        self.list(target_list_id)?;

        self.edit_lists(|lists, owners| {
            let source = list_mut(lists, source_list_id)?;
            let mut card =
                remove_by_id(&mut source.cards, card_id).ok_or_else(|| StoreError::not_found("card", card_id))?;
            resequence(&mut source.cards);

            let mut others = Vec::new();
            card.position = position;
            card.list_id = target_list_id;
            owners.move_card(card_id, target_list_id);
            for payload in payloads {
                if payload.id == card_id {
                    merge_indexed(owners, target_list_id, &mut card, payload);
                } else {
                    others.push(payload);
                }
            }

            let target = list_mut(lists, target_list_id)?;
            let index = card.position.clamp(0, target.cards.len() as i32) as usize;
            target.cards.insert(index, card);
            for payload in others {
                let target = list_mut(lists, target_list_id)?;
                if let Some(existing) = target.card_mut(payload.id) {
                    merge_indexed(owners, target_list_id, existing, payload);
                    continue;
                }
                let adopted = adopt_card(lists, owners, target_list_id, payload);
                list_mut(lists, target_list_id)?.cards.push(adopted);
            }
            let target = list_mut(lists, target_list_id)?;
            resequence(&mut target.cards);

            target
                .card(card_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("card", card_id))
        })
    }
}
