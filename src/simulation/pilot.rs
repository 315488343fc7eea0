use crate::game::state::{GameResult, GameState};
use crate::game::zones::Cards;

/// Decision policy for one deck.
///
/// The simulator calls one handler per step of the turn; the defaults play
/// a deck that does nothing but untap, draw and discard down to seven.
pub trait Pilot: Clone {
    fn game(&self) -> &GameState;

    fn game_mut(&mut self) -> &mut GameState;

    /// Whether to keep this opening hand
    fn keep_hand(&mut self, hand: &Cards) -> bool;

    /// Called once the hand is kept: puts one card per mulligan on the bottom
    fn start(&mut self) -> GameResult<()> {
        for _ in 0..self.game().mulligans() {
            let first = self.game().hand().first().map(str::to_string);
            if let Some(card) = first {
                self.game_mut().put_on_bottom_of_library(&card)?;
            }
        }
        Ok(())
    }

    fn untap_step(&mut self) -> GameResult<()> {
        self.game_mut().untap_all();
        Ok(())
    }

    fn upkeep_step(&mut self) -> GameResult<()> {
        Ok(())
    }

    fn draw_step(&mut self) -> GameResult<()> {
        self.game_mut().draw(1)
    }

    fn first_main_phase(&mut self) -> GameResult<()> {
        Ok(())
    }

    fn combat_phase(&mut self) -> GameResult<()> {
        Ok(())
    }

    fn second_main_phase(&mut self) -> GameResult<()> {
        Ok(())
    }

    /// Discards the first cards of the hand down to seven
    fn ending_phase(&mut self) -> GameResult<()> {
        while self.game().hand().len() > 7 {
            let first = self.game().hand().first().map(str::to_string);
            match first {
                Some(card) => self.game_mut().discard(&card)?,
                None => break,
            }
        }
        Ok(())
    }

    /// Reason the goldfish is dead, if it is
    fn check_win(&self) -> Option<String> {
        default_win_check(self.game())
    }

    /// Independent copy of the pilot and its game, with a muted log
    fn fork(&self) -> Self {
        let mut fork = self.clone();
        *fork.game_mut() = self.game().fork();
        fork
    }
}

pub fn default_win_check(game: &GameState) -> Option<String> {
    if game.opponent_life() <= 0 {
        Some("opponent is dead".to_string())
    } else if game.opponent_poison() >= 10 {
        Some("opponent is deadly poisoned".to_string())
    } else {
        None
    }
}

/// A pilot that can play single cards by name, for route exploration
pub trait SpellsPlayer: Pilot {
    /// Whether the card can be played right now
    fn can_play(&self, card: &str) -> bool;

    /// Plays the card; `Ok(false)` if it turned out not to be playable
    fn play(&mut self, card: &str) -> GameResult<bool>;
}
