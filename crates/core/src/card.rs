//! Card catalog: the immutable deck the draw engine deals from.
//!
//! The engine never stores card content, only card ids. The catalog is
//! loaded once at startup, validated, and shared read-only across the
//! coordinator and the HTTP layer.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::types::CardId;

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A single catalog entry.
///
/// Cards are immutable: the engine references them by id and never mutates
/// content. `followups` keeps its authored order; `flags` is an unordered
/// tag set (`"spicy"`, `"long"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// Intimacy level, 1-based. Zero is rejected at load.
    pub level: u8,
    pub category: String,
    pub prompt: String,
    #[serde(default)]
    pub followups: Vec<String>,
    #[serde(default)]
    pub flags: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// On-disk catalog document: `{ "cards": [ ... ] }`.
#[derive(Deserialize)]
struct CatalogDocument {
    cards: Vec<Card>,
}

/// A validated, immutable card catalog.
///
/// Keyed by card id; iteration order is the id order, so pool seeding is
/// deterministic for a given deck.
#[derive(Debug, Clone)]
pub struct Catalog {
    cards: BTreeMap<CardId, Card>,
}

impl Catalog {
    /// Parse and validate a catalog from its JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Self::from_cards(document.cards)
    }

    /// Build a catalog from already-deserialized cards, validating as it goes.
    pub fn from_cards(cards: Vec<Card>) -> Result<Self, CatalogError> {
        if cards.is_empty() {
            return Err(CatalogError::Validation(
                "catalog contains no cards".to_string(),
            ));
        }

        let mut by_id = BTreeMap::new();
        for card in cards {
            validate_card(&card)?;
            let id = card.id.clone();
            if by_id.insert(id.clone(), card).is_some() {
                return Err(CatalogError::Validation(format!(
                    "duplicate card id '{id}'"
                )));
            }
        }

        Ok(Self { cards: by_id })
    }

    /// Every card id in the catalog, sorted.
    pub fn all_card_ids(&self) -> BTreeSet<CardId> {
        self.cards.keys().cloned().collect()
    }

    /// Look up a card by id.
    pub fn resolve(&self, card_id: &str) -> Option<&Card> {
        self.cards.get(card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

fn validate_card(card: &Card) -> Result<(), CatalogError> {
    if card.id.trim().is_empty() {
        return Err(CatalogError::Validation(
            "card id must not be empty".to_string(),
        ));
    }
    if card.level == 0 {
        return Err(CatalogError::Validation(format!(
            "card '{}' has level 0; levels are 1-based",
            card.id
        )));
    }
    if card.prompt.trim().is_empty() {
        return Err(CatalogError::Validation(format!(
            "card '{}' has an empty prompt",
            card.id
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
