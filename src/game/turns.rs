use crate::game::error::GameError;
use crate::game::state::{GameResult, Phase};
use crate::simulation::pilot::Pilot;

/// Enters `phase` and lets the pilot act in it
pub fn run_phase<P: Pilot>(pilot: &mut P, phase: Phase) -> GameResult<()> {
    pilot.game_mut().start_phase(phase)?;
    match phase {
        Phase::Untap => pilot.untap_step(),
        Phase::Upkeep => pilot.upkeep_step(),
        Phase::Draw => pilot.draw_step(),
        Phase::FirstMain => pilot.first_main_phase(),
        Phase::Combat => pilot.combat_phase(),
        Phase::SecondMain => pilot.second_main_phase(),
        Phase::Ending => pilot.ending_phase(),
    }
}

/// Plays one full turn. There is no draw on the first turn on the play.
/// Fails if the pilot ends the turn with more than `max_hand_size` cards.
pub fn play_turn<P: Pilot>(pilot: &mut P, max_hand_size: usize) -> GameResult<()> {
    pilot.game_mut().start_next_turn();
    run_phase(pilot, Phase::Untap)?;
    run_phase(pilot, Phase::Upkeep)?;
    let game = pilot.game();
    if !game.on_the_play() || game.turn() > 1 {
        run_phase(pilot, Phase::Draw)?;
    }
    run_phase(pilot, Phase::FirstMain)?;
    run_phase(pilot, Phase::Combat)?;
    run_phase(pilot, Phase::SecondMain)?;
    run_phase(pilot, Phase::Ending)?;

    let in_hand = pilot.game().hand().len();
    if in_hand > max_hand_size {
        return Err(GameError::illegal(format!(
            "{} cards in hand after ending phase",
            in_hand
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::database::CardDatabase;
    use crate::game::log::GameLog;
    use crate::game::state::GameState;
    use crate::game::zones::Cards;
    use std::sync::Arc;

    #[derive(Clone)]
    struct Hoarder {
        game: GameState,
        discard: bool,
    }

    impl Pilot for Hoarder {
        fn game(&self) -> &GameState {
            &self.game
        }

        fn game_mut(&mut self) -> &mut GameState {
            &mut self.game
        }

        fn keep_hand(&mut self, _hand: &Cards) -> bool {
            true
        }

        fn ending_phase(&mut self) -> GameResult<()> {
            if self.discard {
                while self.game.hand().len() > 7 {
                    let first = self.game.hand().first().map(str::to_string);
                    if let Some(card) = first {
                        self.game.discard(&card)?;
                    }
                }
            }
            Ok(())
        }
    }

    fn hoarder(on_the_play: bool, hand: usize, library: usize, discard: bool) -> Hoarder {
        let mut game = GameState::new(Arc::new(CardDatabase::new()), GameLog::disabled());
        game.start(on_the_play);
        let hand: Cards = (0..hand).map(|i| format!("h{}", i)).collect();
        let library: Cards = (0..library).map(|i| format!("l{}", i)).collect();
        game.keep_hand_and_start(library, hand);
        Hoarder { game, discard }
    }

    #[test]
    fn test_no_draw_first_turn_on_the_play() {
        let mut pilot = hoarder(true, 7, 10, true);
        play_turn(&mut pilot, 7).unwrap();
        assert_eq!(pilot.game.library().len(), 10);
        play_turn(&mut pilot, 7).unwrap();
        assert_eq!(pilot.game.library().len(), 9);
        assert_eq!(pilot.game.turn(), 2);
        assert_eq!(pilot.game.phase(), Some(Phase::Ending));
    }

    #[test]
    fn test_draw_first_turn_on_the_draw() {
        let mut pilot = hoarder(false, 7, 10, true);
        play_turn(&mut pilot, 7).unwrap();
        assert_eq!(pilot.game.library().len(), 9);
        assert_eq!(pilot.game.graveyard().len(), 1);
    }

    #[test]
    fn test_too_many_cards_in_hand_is_illegal() {
        let mut pilot = hoarder(false, 7, 10, false);
        assert!(matches!(
            play_turn(&mut pilot, 7),
            Err(GameError::IllegalAction(_))
        ));
    }

    #[test]
    fn test_empty_library_loses_during_draw() {
        let mut pilot = hoarder(false, 7, 0, true);
        assert!(matches!(
            play_turn(&mut pilot, 7),
            Err(GameError::DeckExhausted { .. })
        ));
        assert_eq!(pilot.game.turn(), 1);
    }
}
