//! Brute-force search for a sequence of spells that wins this turn.

use crate::game::error::GameError;
use crate::game::state::{GameResult, Phase};
use crate::game::turns::run_phase;
use crate::simulation::pilot::SpellsPlayer;
use std::fmt;
use tracing::debug;

/// Spells to play, in order, in each main phase of the current turn
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VictoryRoute {
    pub first_main: Vec<String>,
    pub second_main: Vec<String>,
}

impl VictoryRoute {
    /// Plays the route's spells for the pilot's current main phase
    pub fn play<P: SpellsPlayer>(&self, pilot: &mut P) -> GameResult<()> {
        let spells = match pilot.game().phase() {
            Some(Phase::FirstMain) => &self.first_main,
            Some(Phase::SecondMain) => &self.second_main,
            _ => return Ok(()),
        };
        for spell in spells {
            if !pilot.play(spell)? {
                return Err(GameError::illegal(format!(
                    "route spell [{}] could not be played",
                    spell
                )));
            }
        }
        Ok(())
    }
}

fn bracketed(spells: &[String]) -> String {
    spells
        .iter()
        .map(|s| format!("[{}]", s))
        .collect::<Vec<_>>()
        .join(" > ")
}

impl fmt::Display for VictoryRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = !self.first_main.is_empty();
        let second = !self.second_main.is_empty();
        match (first, second) {
            (true, true) => write!(
                f,
                "(1) {} & (2) {}",
                bracketed(&self.first_main),
                bracketed(&self.second_main)
            ),
            (true, false) => write!(f, "{}", bracketed(&self.first_main)),
            (false, true) => write!(f, "{}", bracketed(&self.second_main)),
            (false, false) => Ok(()),
        }
    }
}

/// Looks for an ordering of `cards` that kills the goldfish by the end of
/// this turn. Works on a fork: `pilot` is never changed.
///
/// Must be called during a main phase. Every playable card is tried at each
/// step (forking when there is more than one); once nothing is playable in
/// the first main phase the combat is played and the search continues in the
/// second main phase. Branches that lose the game are abandoned; illegal
/// actions are returned as errors.
pub fn find_route_to_victory<P: SpellsPlayer>(
    pilot: &P,
    cards: &[&str],
) -> GameResult<Option<VictoryRoute>> {
    match pilot.game().phase() {
        Some(phase) if phase.is_main() => {}
        phase => {
            return Err(GameError::illegal(format!(
                "route search started outside of a main phase ({:?})",
                phase
            )))
        }
    }
    let mut root = pilot.fork();
    let route = explore(&mut root, Vec::new(), cards)?;
    if let Some(route) = &route {
        debug!(turn = pilot.game().turn(), %route, "victory route found");
    }
    Ok(route)
}

/// Maps a lost game to a dead branch
fn alive<T>(result: GameResult<T>) -> GameResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_loss() => Ok(None),
        Err(e) => Err(e),
    }
}

fn explore<P: SpellsPlayer>(
    pilot: &mut P,
    played: Vec<String>,
    cards: &[&str],
) -> GameResult<Option<VictoryRoute>> {
    let playable: Vec<&str> = cards.iter().copied().filter(|c| pilot.can_play(c)).collect();
    match playable.as_slice() {
        [] => end_of_phase(pilot, played, cards),
        [card] => play_then_explore(pilot, played, card, cards),
        _ => {
            for card in playable {
                let mut branch = pilot.fork();
                if let Some(route) = play_then_explore(&mut branch, played.clone(), card, cards)? {
                    return Ok(Some(route));
                }
            }
            Ok(None)
        }
    }
}

fn play_then_explore<P: SpellsPlayer>(
    pilot: &mut P,
    mut played: Vec<String>,
    card: &str,
    cards: &[&str],
) -> GameResult<Option<VictoryRoute>> {
    match alive(pilot.play(card))? {
        Some(true) => {
            played.push(card.to_string());
            explore(pilot, played, cards)
        }
        _ => Ok(None),
    }
}

fn end_of_phase<P: SpellsPlayer>(
    pilot: &mut P,
    played: Vec<String>,
    cards: &[&str],
) -> GameResult<Option<VictoryRoute>> {
    if pilot.game().phase() == Some(Phase::FirstMain) {
        if alive(run_phase(pilot, Phase::Combat))?.is_none() {
            return Ok(None);
        }
        if pilot.check_win().is_some() {
            return Ok(Some(VictoryRoute {
                first_main: played,
                second_main: Vec::new(),
            }));
        }
        pilot.game_mut().start_phase(Phase::SecondMain)?;
        let second = explore(pilot, Vec::new(), cards)?;
        Ok(second.map(|route| VictoryRoute {
            first_main: played,
            second_main: route.second_main,
        }))
    } else {
        if alive(run_phase(pilot, Phase::Ending))?.is_none() {
            return Ok(None);
        }
        Ok(pilot.check_win().map(|_| VictoryRoute {
            first_main: Vec::new(),
            second_main: played,
        }))
    }
}
