use crate::card::CardDatabase;
use crate::game::error::GameError;
use crate::game::log::GameLog;
use crate::game::state::{GameResult, GameState};
use crate::game::turns::play_turn;
use crate::game::zones::Cards;
use crate::rng::GameRng;
use crate::simulation::hand::select_opening_hand;
use crate::simulation::pilot::Pilot;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Who starts the games of a batch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Start {
    /// On the play
    Otp,
    /// On the draw
    Otd,
    /// Alternate between play and draw
    Both,
}

impl Start {
    /// Start of game `index`: `Both` alternates, play first
    pub fn toss(self, index: usize) -> Start {
        match self {
            Start::Both if index % 2 == 0 => Start::Otp,
            Start::Both => Start::Otd,
            start => start,
        }
    }

    pub fn is_on_the_play(self) -> bool {
        self == Start::Otp
    }
}

impl fmt::Display for Start {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Start::Otp => "OTP",
            Start::Otd => "OTD",
            Start::Both => "BOTH",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Opening hand size, also the maximum hand size at end of turn
    pub draw: usize,
    pub start: Start,
    pub iterations: usize,
    pub max_turns: u32,
    pub seed: Option<u64>,
    /// Narrate every game into its record
    pub verbose: bool,
    #[serde(skip)]
    pub progress: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            draw: 7,
            start: Start::Both,
            iterations: 50_000,
            max_turns: 20,
            seed: None,
            verbose: false,
            progress: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Won,
    /// The library ran out
    Lost,
    /// Not won within the turn limit
    Timeout,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Won => "won",
            Outcome::Lost => "lost",
            Outcome::Timeout => "timeout",
        };
        write!(f, "{}", name)
    }
}

/// Result of a single game simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub start: Start,
    pub mulligans: u32,
    pub outcome: Outcome,
    /// Turn the game ended on; one past the turn limit on a timeout
    pub end_turn: u32,
    pub reason: Option<String>,
    #[serde(skip)]
    pub log: Vec<String>,
}

#[derive(Error, Debug)]
pub enum SimulationError {
    /// The pilot broke a game rule; carries the narration of the game so far
    #[error("unexpected error in a game: {message}\n\n{}", .log.join("\n"))]
    Internal { message: String, log: Vec<String> },
}

/// Plays one game of `deck` to its end.
///
/// Losing the game is an outcome, not an error: only an illegal action
/// from the pilot stops the simulation.
pub fn run_game<P, F>(
    deck: &Cards,
    database: &Arc<CardDatabase>,
    on_the_play: bool,
    rng: &mut GameRng,
    config: &SimulatorConfig,
    new_pilot: &F,
) -> Result<GameRecord, SimulationError>
where
    P: Pilot,
    F: Fn(GameState) -> P,
{
    let mut game = GameState::new(Arc::clone(database), GameLog::new(config.verbose));
    game.start(on_the_play);
    let mut pilot = new_pilot(game);
    select_opening_hand(&mut pilot, deck, config.draw, rng);

    let played = play_game(&mut pilot, config);
    let game = pilot.game_mut();
    match played {
        Ok((outcome, end_turn, reason)) => {
            match outcome {
                Outcome::Won => game.log(|| format!("===> WIN: {}", reason.as_deref().unwrap_or(""))),
                Outcome::Lost => game.log(|| format!("===> LOST: {}", reason.as_deref().unwrap_or(""))),
                Outcome::Timeout => game.log(|| "===> MAX TURNS REACHED".to_string()),
            }
            Ok(GameRecord {
                start: if on_the_play { Start::Otp } else { Start::Otd },
                mulligans: game.mulligans(),
                outcome,
                end_turn,
                reason,
                log: game.take_log(),
            })
        }
        Err(e) => {
            game.log(|| format!("===> ERROR: {}", e));
            Err(SimulationError::Internal {
                message: e.to_string(),
                log: game.take_log(),
            })
        }
    }
}

fn play_game<P: Pilot>(
    pilot: &mut P,
    config: &SimulatorConfig,
) -> GameResult<(Outcome, u32, Option<String>)> {
    pilot.start()?;
    let game = pilot.game();
    let allowed = config.draw.saturating_sub(game.mulligans() as usize);
    if game.hand().len() > allowed {
        return Err(GameError::illegal(format!(
            "{} cards in hand after {} mulligans",
            game.hand().len(),
            game.mulligans()
        )));
    }

    while pilot.game().turn() < config.max_turns {
        match play_turn(pilot, config.draw) {
            Ok(()) => {}
            Err(e) if e.is_loss() => {
                return Ok((Outcome::Lost, pilot.game().turn(), Some(e.to_string())));
            }
            Err(e) => return Err(e),
        }
        if let Some(reason) = pilot.check_win() {
            return Ok((Outcome::Won, pilot.game().turn(), Some(reason)));
        }
    }
    Ok((Outcome::Timeout, config.max_turns + 1, None))
}

/// Runs `config.iterations` games of `deck` in parallel.
///
/// Game `i` gets its own generator derived from the base seed and `i`, so
/// a seeded batch is reproducible. Records come back in game order.
pub fn simulate<P, F>(
    deck: &Cards,
    database: Arc<CardDatabase>,
    config: &SimulatorConfig,
    new_pilot: F,
) -> Result<Vec<GameRecord>, SimulationError>
where
    P: Pilot,
    F: Fn(GameState) -> P + Sync,
{
    let base_seed = config.seed.unwrap_or_else(|| GameRng::new(None).seed());
    debug!(base_seed, iterations = config.iterations, start = %config.start, "starting batch");

    let bar = if config.progress {
        let bar = ProgressBar::new(config.iterations as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} games ({per_sec}, eta {eta})") {
            bar.set_style(style);
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let records = (0..config.iterations)
        .into_par_iter()
        .map(|index| {
            let mut rng = GameRng::for_game(base_seed, index as u64);
            let start = config.start.toss(index);
            let record = run_game(
                deck,
                &database,
                start.is_on_the_play(),
                &mut rng,
                config,
                &new_pilot,
            );
            if let Ok(record) = &record {
                trace!(game = index, outcome = %record.outcome, turn = record.end_turn, "game over");
            }
            bar.inc(1);
            record
        })
        .collect::<Result<Vec<_>, _>>();
    bar.finish_and_clear();
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Area, Side};

    /// Plays a land a turn, wins once four are out
    #[derive(Clone)]
    struct LandGo {
        game: GameState,
        cheat: bool,
    }

    impl Pilot for LandGo {
        fn game(&self) -> &GameState {
            &self.game
        }

        fn game_mut(&mut self) -> &mut GameState {
            &mut self.game
        }

        fn keep_hand(&mut self, _hand: &Cards) -> bool {
            true
        }

        fn first_main_phase(&mut self) -> GameResult<()> {
            if self.game.hand().contains("forest") {
                self.game.land("forest")?;
            }
            if self.cheat {
                self.game.move_card("forest", Area::Graveyard, Area::Hand, Side::Top)?;
            }
            Ok(())
        }

        fn check_win(&self) -> Option<String> {
            (self.game.battlefield().count("forest") >= 4).then(|| "four forests".to_string())
        }
    }

    fn database() -> Arc<CardDatabase> {
        Arc::new(CardDatabase::from_file("cards.json").expect("Failed to load cards"))
    }

    fn forests(n: usize) -> Cards {
        std::iter::repeat("forest").take(n).collect()
    }

    fn config() -> SimulatorConfig {
        SimulatorConfig {
            iterations: 10,
            seed: Some(42),
            ..SimulatorConfig::default()
        }
    }

    fn land_go(cheat: bool) -> impl Fn(GameState) -> LandGo + Sync {
        move |game| LandGo { game, cheat }
    }

    #[test]
    fn test_start_toss() {
        assert_eq!(Start::Both.toss(0), Start::Otp);
        assert_eq!(Start::Both.toss(1), Start::Otd);
        assert_eq!(Start::Otd.toss(0), Start::Otd);
    }

    #[test]
    fn test_game_won_on_turn_four() {
        let mut rng = GameRng::new(Some(1));
        let record = run_game(&forests(40), &database(), true, &mut rng, &config(), &land_go(false)).unwrap();
        assert_eq!(record.outcome, Outcome::Won);
        assert_eq!(record.end_turn, 4);
        assert_eq!(record.start, Start::Otp);
        assert_eq!(record.reason.as_deref(), Some("four forests"));
        assert!(record.log.is_empty());
    }

    #[test]
    fn test_empty_library_is_lost_at_current_turn() {
        let mut rng = GameRng::new(Some(1));
        let record = run_game(&forests(9), &database(), false, &mut rng, &config(), &land_go(false)).unwrap();
        // 7 in hand, 2 draws, the third draw fails on turn 3
        assert_eq!(record.outcome, Outcome::Lost);
        assert_eq!(record.end_turn, 3);
    }

    #[test]
    fn test_timeout_ends_past_max_turns() {
        let mut rng = GameRng::new(Some(1));
        let config = SimulatorConfig {
            max_turns: 2,
            ..config()
        };
        let record = run_game(&forests(40), &database(), true, &mut rng, &config, &land_go(false)).unwrap();
        assert_eq!(record.outcome, Outcome::Timeout);
        assert_eq!(record.end_turn, 3);
    }

    #[test]
    fn test_illegal_action_is_internal_error_with_log() {
        let mut rng = GameRng::new(Some(1));
        let config = SimulatorConfig {
            verbose: true,
            ..config()
        };
        let result = run_game(&forests(40), &database(), true, &mut rng, &config, &land_go(true));
        match result {
            Err(SimulationError::Internal { log, .. }) => {
                assert!(log.iter().any(|line| line.contains("New Game: OTP")));
                assert!(log.last().is_some_and(|line| line.starts_with("===> ERROR")));
            }
            other => panic!("expected an internal error, got {:?}", other),
        }
    }

    #[test]
    fn test_simulate_is_reproducible_and_alternates_start() {
        let deck = forests(40);
        let first = simulate(&deck, database(), &config(), land_go(false)).unwrap();
        let second = simulate(&deck, database(), &config(), land_go(false)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].start, Start::Otp);
        assert_eq!(first[1].start, Start::Otd);
        assert!(first.iter().all(|r| r.outcome == Outcome::Won && r.end_turn == 4));
    }
}
