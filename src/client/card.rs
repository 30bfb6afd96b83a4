//! Card commands, including batch reorders and cross-list moves

use crate::error::{Result, StoreError};
use crate::models::{Card, CardId, ListId, UserId, UserSummary};
use crate::normalize;
use crate::remote::requests::validate_batch;
use crate::remote::{CardChanges, CardPosition, NewCard, NewCardMember, RemoteApi};
use crate::status::{OperationKey, OperationKind};
use crate::versions::Container;

use super::{rejected, KanbanClient, Reconciled};

impl<A: RemoteApi> KanbanClient<A> {
    /// Refresh one list's cards from the server
    pub async fn fetch_cards(&self, list_id: ListId) -> Result<Vec<Card>> {
        let kind = OperationKind::FetchCards;
        self.track(OperationKey::new(kind, list_id), async {
            self.resolve(|state| state.list(list_id).map(|_| ()))?;
            let payloads = self.api.list_cards(list_id).await.map_err(rejected(kind))?;
            let cards = normalize::cards(payloads, list_id);
            self.merge(|state| {
                state.set_cards(list_id, cards)?;
                Ok(state.list(list_id)?.cards.clone())
            })
        })
        .await
    }

    pub async fn create_card(&self, list_id: ListId, card: NewCard) -> Result<Card> {
        let kind = OperationKind::CreateCard;
        self.track(OperationKey::new(kind, list_id), async {
            card.validate()?;
            self.resolve(|state| state.list(list_id).map(|_| ()))?;
            let payload = self.api.create_card(list_id, &card).await.map_err(rejected(kind))?;
            let created = self.merge(|state| state.insert_card(normalize::card(payload, list_id)))?;
            tracing::info!(list_id, card_id = created.id, "card created");
            Ok(created)
        })
        .await
    }

    pub async fn update_card(&self, card_id: CardId, changes: CardChanges) -> Result<Card> {
        let kind = OperationKind::UpdateCard;
        self.track(OperationKey::new(kind, card_id), async {
            changes.validate()?;
            let list_id = self.resolve(|state| state.owners.card_list(card_id))?;
            let payload = self
                .api
                .update_card(list_id, card_id, &changes)
                .await
                .map_err(rejected(kind))?;
            let merged = self.merge(|state| {
                // the card may have moved while the update was in flight
                let list_id = state.owners.card_list(card_id)?;
                state.merge_card(list_id, payload)
            })?;
            tracing::info!(list_id, card_id, "card updated");
            Ok(merged)
        })
        .await
    }

    pub async fn delete_card(&self, card_id: CardId) -> Result<()> {
        let kind = OperationKind::DeleteCard;
        self.track(OperationKey::new(kind, card_id), async {
            let list_id = self.resolve(|state| state.owners.card_list(card_id))?;
            self.api
                .delete_card(list_id, card_id)
                .await
                .map_err(rejected(kind))?;
            self.merge(|state| {
                let list_id = state.owners.card_list(card_id)?;
                state.remove_card(list_id, card_id)
            })?;
            tracing::info!(list_id, card_id, "card deleted");
            Ok(())
        })
        .await
    }

    /// Send the full card order of one list.
    ///
    /// The batch must name every card of the list once, with positions
    /// 0..n-1 and the list's own id.
    pub async fn reorder_cards(&self, list_id: ListId, order: Vec<CardPosition>) -> Result<Reconciled> {
        let kind = OperationKind::ReorderCards;
        self.track_positional(OperationKey::new(kind, list_id), async {
            validate_batch("cards", order.iter().map(|p| (p.id, p.position)))?;
            if order.iter().any(|p| p.list_id != list_id) {
                return Err(StoreError::invalid("cards", "every entry must name the reordered list"));
            }
            self.resolve(|state| {
                let list = state.list(list_id)?;
                if order.len() != list.cards.len() {
                    return Err(StoreError::invalid("cards", "batch must name every card of the list"));
                }
                for entry in &order {
                    list.card(entry.id)
                        .ok_or_else(|| StoreError::not_found("card", entry.id))?;
                }
                Ok(())
            })?;

            let ticket = self.write(|state| state.versions.issue(Container::List(list_id)))?;
            tracing::debug!(list_id, cards = order.len(), "reordering cards");
            let payloads = self
                .api
                .reorder_cards(list_id, &order)
                .await
                .map_err(rejected(kind))?;

            self.merge(|state| {
                if !state.versions.is_current(&ticket) {
                    return Ok(Reconciled::Superseded);
                }
                state.apply_card_order(list_id, payloads)?;
                state.versions.commit(&ticket);
                tracing::info!(list_id, "card order applied");
                Ok(Reconciled::Applied)
            })
        })
        .await
    }

    /// Move a card to `position` in another list.
    ///
    /// Sent as a single-entry reorder on the target list. The card keeps all
    /// of its relations; only the confirmed fields come from the response.
    pub async fn move_card(
        &self,
        card_id: CardId,
        source_list_id: ListId,
        target_list_id: ListId,
        position: i32,
    ) -> Result<Reconciled> {
        let kind = OperationKind::MoveCard;
        self.track_positional(OperationKey::new(kind, card_id), async {
            if position < 0 {
                return Err(StoreError::invalid("position", "must not be negative"));
            }
            if source_list_id == target_list_id {
                return Err(StoreError::invalid("list", "a move needs two different lists"));
            }
            let position = self.resolve(|state| {
                if state.owners.card_list(card_id)? != source_list_id {
                    return Err(StoreError::not_found("card", card_id));
                }
                let target = state.list(target_list_id)?;
                Ok(position.min(target.cards.len() as i32))
            })?;

            let (source_ticket, target_ticket) = self.write(|state| {
                (
                    state.versions.issue(Container::List(source_list_id)),
                    state.versions.issue(Container::List(target_list_id)),
                )
            })?;
            tracing::debug!(card_id, source_list_id, target_list_id, position, "moving card");
            let entry = CardPosition {
                id: card_id,
                position,
                list_id: target_list_id,
            };
            let payloads = self
                .api
                .reorder_cards(target_list_id, &[entry])
                .await
                .map_err(rejected(kind))?;

            self.merge(|state| {
                if !state.versions.is_current(&source_ticket) || !state.versions.is_current(&target_ticket) {
                    return Ok(Reconciled::Superseded);
                }
                state.apply_move(card_id, source_list_id, target_list_id, position, payloads)?;
                state.versions.commit(&source_ticket);
                state.versions.commit(&target_ticket);
                tracing::info!(card_id, source_list_id, target_list_id, "card moved");
                Ok(Reconciled::Applied)
            })
        })
        .await
    }

    pub async fn add_card_member(&self, card_id: CardId, member: NewCardMember) -> Result<Vec<UserSummary>> {
        let kind = OperationKind::AddCardMember;
        self.track(OperationKey::new(kind, card_id), async {
            self.resolve(|state| state.card(card_id).map(|_| ()))?;
            let payload = self
                .api
                .add_card_member(card_id, &member)
                .await
                .map_err(rejected(kind))?;
            self.merge(|state| state.set_card_members(card_id, payload.members.clone()))?;
            tracing::info!(card_id, user_id = member.user_id, "card member added");
            Ok(payload.members)
        })
        .await
    }

    pub async fn remove_card_member(&self, card_id: CardId, user_id: UserId) -> Result<Vec<UserSummary>> {
        let kind = OperationKind::RemoveCardMember;
        self.track(OperationKey::new(kind, card_id), async {
            self.resolve(|state| {
                let card = state.card(card_id)?;
                if card.members.iter().any(|m| m.id == user_id) {
                    Ok(())
                } else {
                    Err(StoreError::not_found("card member", user_id))
                }
            })?;
            let payload = self
                .api
                .remove_card_member(card_id, user_id)
                .await
                .map_err(rejected(kind))?;
            self.merge(|state| state.set_card_members(card_id, payload.members.clone()))?;
            tracing::info!(card_id, user_id, "card member removed");
            Ok(payload.members)
        })
        .await
    }
}
