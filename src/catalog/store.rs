use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::builtin::builtin_cards;
use super::models::{Card, CardKind, NewCard};

/// ID-indexed card definitions, shared by every room.
///
/// The built-in set is loaded once at startup; operators may append custom
/// entries at runtime. Cards are never removed or edited in place, so a card
/// id seen by a room stays resolvable for the life of the process.
pub struct CardCatalog {
    cards: RwLock<HashMap<String, Card>>,
    base_order: Vec<String>,
}

impl CardCatalog {
    /// Catalog preloaded with the built-in card set.
    pub fn with_builtin() -> Self {
        let cards = builtin_cards();
        let base_order = cards.iter().map(|c| c.id.clone()).collect();
        let map = cards.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            cards: RwLock::new(map),
            base_order,
        }
    }

    /// Empty catalog, for tests that supply their own cards.
    pub fn empty() -> Self {
        Self {
            cards: RwLock::new(HashMap::new()),
            base_order: Vec::new(),
        }
    }

    /// Ids of the built-in set, in default deck order.
    pub fn base_order(&self) -> Vec<String> {
        self.base_order.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Card> {
        self.cards.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.cards.read().await.contains_key(id)
    }

    /// First id in `ids` with no catalog entry, if any.
    pub async fn first_unknown(&self, ids: &[String]) -> Option<String> {
        let cards = self.cards.read().await;
        ids.iter().find(|id| !cards.contains_key(*id)).cloned()
    }

    /// Resolves each id to its card type in one pass, `None` for unknowns.
    pub async fn kinds_of(&self, ids: &[String]) -> Vec<(String, Option<CardKind>)> {
        let cards = self.cards.read().await;
        ids.iter()
            .map(|id| (id.clone(), cards.get(id).map(|card| card.kind)))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.cards.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cards.read().await.is_empty()
    }

    /// Insert a card under its own id. Used by tests to stage fixtures.
    pub async fn insert(&self, card: Card) {
        let mut cards = self.cards.write().await;
        debug!(card_id = %card.id, "Card inserted into catalog");
        cards.insert(card.id.clone(), card);
    }

    /// Append an operator-submitted card under a generated `custom-` id.
    pub async fn add_custom(&self, new_card: NewCard) -> Card {
        let card = Card {
            id: format!("custom-{}", Uuid::new_v4()),
            kind: new_card.kind,
            title: new_card.title,
            text: new_card.text,
            resolution: new_card.resolution,
            special: new_card.special,
        };

        let mut cards = self.cards.write().await;
        cards.insert(card.id.clone(), card.clone());
        info!(card_id = %card.id, kind = %card.kind, "Custom card added to catalog");
        card
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::{CardKind, ResolutionKind};

    #[tokio::test]
    async fn test_with_builtin_loads_cards() {
        let catalog = CardCatalog::with_builtin();
        assert!(!catalog.is_empty().await);
        assert_eq!(catalog.base_order().len(), catalog.len().await);

        for id in catalog.base_order() {
            assert!(catalog.contains(&id).await);
        }
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let catalog = CardCatalog::with_builtin();
        assert!(catalog.get("no-such-card").await.is_none());
    }

    #[tokio::test]
    async fn test_first_unknown() {
        let catalog = CardCatalog::with_builtin();
        let mut ids = catalog.base_order();
        assert_eq!(catalog.first_unknown(&ids).await, None);

        ids.push("ghost-card".to_string());
        assert_eq!(
            catalog.first_unknown(&ids).await,
            Some("ghost-card".to_string())
        );
    }

    #[tokio::test]
    async fn test_add_custom_generates_prefixed_id() {
        let catalog = CardCatalog::empty();
        let card = catalog
            .add_custom(NewCard {
                kind: CardKind::Forfeit,
                title: "Hydrate".to_string(),
                text: "Drink a glass of water.".to_string(),
                resolution: ResolutionKind::None,
                special: None,
            })
            .await;

        assert!(card.id.starts_with("custom-"));
        assert_eq!(catalog.get(&card.id).await, Some(card));
    }
}
