use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use cyberwarrior_protocol::{Card, CardCategory, CardId, CardType, SubCategory};
use rand::Rng;
use tracing::info;

use crate::CatalogError;

const COLUMNS: usize = 7;

/// Immutable card definitions plus the deck used for random draws.
///
/// Built once at startup and shared behind an `Arc`. Draws are uniform
/// over the deck and with replacement, so the same card may be dealt any
/// number of times.
#[derive(Debug, Clone)]
pub struct CardCatalog {
    cards: HashMap<CardId, Card>,
    deck: Vec<CardId>,
}

impl CardCatalog {
    /// Builds a catalog from already-parsed cards. The deck keeps the
    /// input order.
    ///
    /// # Errors
    /// `Empty` if `cards` is empty, `DuplicateId` if two cards share an id.
    pub fn new(cards: Vec<Card>) -> Result<Self, CatalogError> {
        if cards.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut deck = Vec::with_capacity(cards.len());
        let mut by_id = HashMap::with_capacity(cards.len());
        for card in cards {
            let id = card.id;
            if by_id.insert(id, card).is_some() {
                return Err(CatalogError::DuplicateId(id));
            }
            deck.push(id);
        }
        Ok(Self { cards: by_id, deck })
    }

    /// Parses tabular rows: `id, type, category, subcategories, title,
    /// description, image`. The first row is a header and is skipped.
    /// Subcategories are comma-separated. Enum names match
    /// case-insensitively.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self, CatalogError> {
        let cards = rows
            .into_iter()
            .enumerate()
            .skip(1)
            .map(|(i, row)| parse_row(&row).map_err(|reason| CatalogError::Row { row: i + 1, reason }))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(cards)
    }

    /// Reads a JSON array of rows (see [`from_rows`](Self::from_rows)).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read(path)?;
        let rows: Vec<Vec<String>> = serde_json::from_slice(&raw)?;
        let catalog = Self::from_rows(rows)?;
        info!(path = %path.display(), cards = catalog.len(), "card catalog loaded");
        Ok(catalog)
    }

    pub fn lookup(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    /// A uniformly random card from the deck.
    pub fn draw_random(&self) -> &Card {
        let idx = rand::rng().random_range(0..self.deck.len());
        // Every deck id was inserted into `cards` by `new`.
        &self.cards[&self.deck[idx]]
    }

    pub fn len(&self) -> usize {
        self.deck.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deck.is_empty()
    }
}

fn parse_row(row: &[String]) -> Result<Card, String> {
    let [id, card_type, category, subs, title, description, image] = row else {
        return Err(format!("expected {COLUMNS} columns, found {}", row.len()));
    };

    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad id {id:?}: {e}"))?;
    let card_type = CardType::from_str(card_type).map_err(|e| e.to_string())?;
    let category = CardCategory::from_str(category).map_err(|e| e.to_string())?;
    let sub_categories = subs
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| SubCategory::from_str(s).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    if sub_categories.is_empty() {
        return Err("card has no subcategories".into());
    }

    Ok(Card {
        id: CardId(id),
        title: title.clone(),
        image: image.clone(),
        description: description.clone(),
        card_type,
        category,
        sub_categories,
    })
}
