use crate::card::types::CardDefinition;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Card not found: {0}")]
    CardNotFound(String),
    #[error("Invalid card data: {0}")]
    InvalidCard(String),
}

/// Card definitions keyed by lower-cased card name.
///
/// Loaded once and shared read-only by every game of a batch.
#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    cards: HashMap<String, CardDefinition>,
}

impl CardDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load cards from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DatabaseError> {
        let cards: Vec<CardDefinition> = serde_json::from_str(json)?;
        let mut db = CardDatabase::new();
        for card in cards {
            if db.get(&card.name).is_some() {
                return Err(DatabaseError::InvalidCard(format!(
                    "duplicate card: {}",
                    card.name
                )));
            }
            db.insert(card);
        }
        Ok(db)
    }

    pub fn insert(&mut self, mut card: CardDefinition) {
        card.name = card.name.to_lowercase();
        self.cards.insert(card.name.clone(), card);
    }

    /// Builder style [`insert`](Self::insert)
    pub fn with(mut self, card: CardDefinition) -> Self {
        self.insert(card);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CardDefinition> {
        match self.cards.get(name) {
            Some(card) => Some(card),
            None => self.cards.get(&name.to_lowercase()),
        }
    }

    pub fn card(&self, name: &str) -> Result<&CardDefinition, DatabaseError> {
        self.get(name)
            .ok_or_else(|| DatabaseError::CardNotFound(name.to_string()))
    }

    /// Fails on the first name with no definition
    pub fn require_all<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), DatabaseError> {
        for name in names {
            self.card(name)?;
        }
        Ok(())
    }

    /// All cards, sorted by name so that derived catalogs are deterministic
    pub fn cards(&self) -> Vec<&CardDefinition> {
        let mut cards: Vec<&CardDefinition> = self.cards.values().collect();
        cards.sort_by(|a, b| a.name.cmp(&b.name));
        cards
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
