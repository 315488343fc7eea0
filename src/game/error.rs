use thiserror::Error;

/// Errors raised by game actions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// An action was attempted while its precondition did not hold.
    /// This is a bug in the pilot, not a game outcome.
    #[error("illegal action: {0}")]
    IllegalAction(String),
    /// The library ran out; the game is lost
    #[error("can't draw {requested}: only {remaining} card(s) left in library")]
    DeckExhausted { requested: usize, remaining: usize },
}

impl GameError {
    pub fn illegal(message: impl Into<String>) -> Self {
        GameError::IllegalAction(message.into())
    }

    pub fn is_loss(&self) -> bool {
        matches!(self, GameError::DeckExhausted { .. })
    }
}
