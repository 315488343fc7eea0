use crate::card::{CardDatabase, DatabaseError};
use crate::game::zones::Cards;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid deck format at line {line}: {reason}")]
    InvalidFormat { line: usize, reason: String },
    #[error("Card database error: {0}")]
    DatabaseError(#[from] DatabaseError),
}

/// A deck list: main deck and sideboard, card names lower-cased
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deck {
    pub name: String,
    pub main: Cards,
    pub sideboard: Cards,
}

impl Deck {
    /// Reads a deck file; the deck is named after the file stem
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeckError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut deck = Self::parse(&content)?;
        deck.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(deck)
    }

    /// Parses "4 Card Name" (or "4x Card Name") lines.
    /// Comments start with # or //; a "Sideboard" line or an "SB:" prefix
    /// switches to the sideboard.
    pub fn parse(content: &str) -> Result<Self, DeckError> {
        let mut deck = Deck::default();
        let mut in_sideboard = false;

        for (line_num, line) in content.lines().enumerate() {
            let mut trimmed = line.trim();

            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
                continue;
            }
            if trimmed.trim_end_matches(':').eq_ignore_ascii_case("sideboard") {
                in_sideboard = true;
                continue;
            }
            let mut to_sideboard = in_sideboard;
            if trimmed.len() >= 3 && trimmed[..3].eq_ignore_ascii_case("sb:") {
                to_sideboard = true;
                trimmed = trimmed[3..].trim_start();
            }

            // Parse "N Card Name" format
            let (count_str, card_name) =
                trimmed
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| DeckError::InvalidFormat {
                        line: line_num + 1,
                        reason: "Expected format: 'COUNT CARD_NAME'".to_string(),
                    })?;
            let count_str = count_str.trim_end_matches(|c| c == 'x' || c == 'X');
            let count: usize = count_str.parse().map_err(|_| DeckError::InvalidFormat {
                line: line_num + 1,
                reason: format!("'{}' is not a valid number", count_str),
            })?;
            let card_name = card_name.trim().to_lowercase();

            let zone = if to_sideboard {
                &mut deck.sideboard
            } else {
                &mut deck.main
            };
            for _ in 0..count {
                zone.add_bottom(&card_name);
            }
        }

        Ok(deck)
    }

    /// Fails on the first main deck card the database does not know
    pub fn validate(&self, database: &CardDatabase) -> Result<(), DeckError> {
        database.require_all(self.main.distinct())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deck_file() {
        let db = CardDatabase::from_file("cards.json").expect("Failed to load cards");
        let deck = Deck::from_file("deck.txt").expect("Failed to parse deck");
        assert_eq!(deck.main.len(), 60, "Deck should have 60 cards");
        assert_eq!(deck.sideboard.len(), 6);
        assert_eq!(deck.name, "deck");
        deck.validate(&db).expect("every card should be known");
    }

    #[test]
    fn test_deck_expansion() {
        let deck = Deck::from_file("deck.txt").expect("Failed to parse deck");
        assert_eq!(deck.main.count("forest"), 8, "Should have 8 Forest cards");
        assert_eq!(deck.main.count("lotus petal"), 4);
    }

    #[test]
    fn test_sideboard_markers() {
        let deck = Deck::parse(
            "// burn\n4x Lava Spike\nSB: 2 Pyroblast\n3 Mountain\n\nSideboard:\n1 Smash\n",
        )
        .unwrap();
        assert_eq!(deck.main, Cards::of(&["lava spike", "lava spike", "lava spike", "lava spike", "mountain", "mountain", "mountain"]));
        assert_eq!(deck.sideboard, Cards::of(&["pyroblast", "pyroblast", "smash"]));
    }

    #[test]
    fn test_invalid_line() {
        assert!(matches!(
            Deck::parse("4 Forest\nForest\n"),
            Err(DeckError::InvalidFormat { line: 2, .. })
        ));
        assert!(matches!(
            Deck::parse("four Forest\n"),
            Err(DeckError::InvalidFormat { line: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_card_name() {
        let db = CardDatabase::from_file("cards.json").expect("Failed to load cards");
        let deck = Deck::parse("4 Black Lotus\n").unwrap();
        assert!(matches!(deck.validate(&db), Err(DeckError::DatabaseError(_))));
    }
}
