//! Reference pilot for creature and burn decks.
//!
//! Every decision reads the card database: lands are what the database
//! calls lands, threats are creatures that are not mana sources from hand,
//! burn is whatever has a burn value. No card is special-cased by name.

use crate::card::CardDefinition;
use crate::game::mana::Mana;
use crate::game::planner::{maybe_produce, plan};
use crate::game::sources::{ManaSource, ManaSources};
use crate::game::state::{GameResult, GameState};
use crate::game::zones::Cards;
use crate::simulation::pilot::{Pilot, SpellsPlayer};
use crate::simulation::seer::{find_route_to_victory, VictoryRoute};
use tracing::debug;

const COLORS: [Mana; 5] = [Mana::B, Mana::U, Mana::G, Mana::R, Mana::W];

#[derive(Debug, Clone)]
pub struct AggroPilot {
    game: GameState,
    route: Option<VictoryRoute>,
}

impl AggroPilot {
    pub fn new(game: GameState) -> Self {
        AggroPilot { game, route: None }
    }

    fn definition(&self, card: &str) -> Option<&CardDefinition> {
        self.game.database().get(card)
    }

    fn is_land(&self, card: &str) -> bool {
        self.definition(card).is_some_and(CardDefinition::is_land)
    }

    fn lands_in(&self, cards: &Cards) -> usize {
        cards.iter().filter(|c| self.is_land(c)).count()
    }

    /// Creatures worth casting: discard-for-mana creatures stay in hand
    fn is_threat(&self, card: &str) -> bool {
        self.definition(card)
            .is_some_and(|d| d.is_creature() && d.discard_for.is_empty())
    }

    fn is_burn(&self, card: &str) -> bool {
        self.definition(card).is_some_and(|d| d.burn > 0)
    }

    /// Zero-cost artifacts that are sacrificed for mana
    fn is_free_mana_artifact(&self, card: &str) -> bool {
        self.definition(card)
            .is_some_and(|d| !d.is_creature() && d.is_permanent() && d.cost.is_empty() && !d.sacrifice_for.is_empty())
    }

    fn hand_cards(&self, wanted: impl Fn(&Self, &str) -> bool) -> Vec<String> {
        self.game
            .hand()
            .distinct()
            .into_iter()
            .filter(|c| wanted(self, *c))
            .map(str::to_string)
            .collect()
    }

    fn sources_for(&self, card: &str) -> Vec<ManaSource> {
        ManaSources::from_database(&self.game).reserve(card).build()
    }

    /// Land to drop: the one bringing the most colors that spells in hand
    /// need and the board can't make yet; hand order breaks ties
    fn choose_land(&self) -> Option<String> {
        let board: Vec<Mana> = self
            .game
            .battlefield()
            .iter()
            .filter_map(|p| self.definition(&p.card))
            .flat_map(|d| d.produces.iter().copied())
            .collect();
        let needed: Vec<Mana> = COLORS
            .iter()
            .copied()
            .filter(|unit| !board.iter().any(|m| m.contains(unit)))
            .filter(|unit| {
                self.game
                    .hand()
                    .iter()
                    .filter_map(|c| self.definition(c))
                    .any(|d| !d.is_land() && d.cost.contains(unit))
            })
            .collect();

        let mut best: Option<(&str, usize)> = None;
        for card in self.game.hand().distinct() {
            let Some(definition) = self.definition(card).filter(|d| d.is_land()) else {
                continue;
            };
            let gain = needed
                .iter()
                .filter(|unit| definition.produces.iter().any(|m| m.contains(unit)))
                .count();
            if best.map_or(true, |(_, best_gain)| gain > best_gain) {
                best = Some((card, gain));
            }
        }
        best.map(|(card, _)| card.to_string())
    }

    /// Damage and poison the cards at hand could deal this turn, ignoring mana
    fn could_kill(&self) -> bool {
        let mut damage = 0;
        let mut poison = 0;
        for permanent in self.game.battlefield().iter().filter(|p| p.can_attack()) {
            if let Some(d) = self.definition(&permanent.card) {
                if d.infect {
                    poison += d.power;
                } else {
                    damage += d.power;
                }
            }
        }
        for d in self.game.hand().iter().filter_map(|c| self.definition(c)) {
            damage += d.burn;
            if d.is_creature() && d.haste && d.discard_for.is_empty() {
                if d.infect {
                    poison += d.power;
                } else {
                    damage += d.power;
                }
            }
        }
        damage as i32 >= self.game.opponent_life()
            || poison >= 10u32.saturating_sub(self.game.opponent_poison())
    }

    fn cast_free_artifacts(&mut self) -> GameResult<()> {
        for card in self.hand_cards(Self::is_free_mana_artifact) {
            while self.game.hand().contains(&card) {
                if !self.play(&card)? {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Plays each wanted card as many times as possible, cheapest first
    fn play_all(&mut self, wanted: impl Fn(&Self, &str) -> bool) -> GameResult<()> {
        let mut cards = self.hand_cards(&wanted);
        cards.sort_by_key(|c| self.definition(c).map_or(0, |d| d.cost.ccm()));
        for card in cards {
            while self.game.hand().contains(&card) {
                if !self.play(&card)? {
                    break;
                }
            }
        }
        Ok(())
    }
}

impl Pilot for AggroPilot {
    fn game(&self) -> &GameState {
        &self.game
    }

    fn game_mut(&mut self) -> &mut GameState {
        &mut self.game
    }

    /// Two to five lands, or anything after the second mulligan
    fn keep_hand(&mut self, hand: &Cards) -> bool {
        self.game.mulligans() >= 2 || (2..=5).contains(&self.lands_in(hand))
    }

    /// Bottoms extra lands beyond three, then the most expensive spells
    fn start(&mut self) -> GameResult<()> {
        for _ in 0..self.game.mulligans() {
            let hand = self.game.hand().clone();
            let card = if self.lands_in(&hand) > 3 {
                hand.iter().find(|c| self.is_land(c))
            } else {
                hand.iter()
                    .filter(|c| !self.is_land(c))
                    .max_by_key(|c| self.definition(c).map_or(0, |d| d.cost.ccm()))
                    .or_else(|| hand.first())
            };
            match card {
                Some(card) => self.game.put_on_bottom_of_library(card)?,
                None => break,
            }
        }
        Ok(())
    }

    fn first_main_phase(&mut self) -> GameResult<()> {
        self.route = None;
        if let Some(land) = self.choose_land() {
            self.game.land(&land)?;
        }
        self.cast_free_artifacts()?;

        if self.could_kill() {
            let mut candidates = self.hand_cards(Self::is_burn);
            candidates.extend(
                self.hand_cards(|p, c| p.is_threat(c) && p.definition(c).is_some_and(|d| d.haste)),
            );
            let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
            if let Some(route) = find_route_to_victory(&*self, &candidates)? {
                debug!(turn = self.game.turn(), %route, "going for the kill");
                self.game.log(|| format!("> victory route: {}", route));
                route.play(self)?;
                self.route = Some(route);
                return Ok(());
            }
        }
        self.play_all(Self::is_threat)
    }

    fn combat_phase(&mut self) -> GameResult<()> {
        let attackers: Vec<(String, u32, bool)> = self
            .game
            .battlefield()
            .iter()
            .filter(|p| p.can_attack())
            .filter_map(|p| {
                self.definition(&p.card)
                    .filter(|d| d.power > 0)
                    .map(|d| (p.card.clone(), d.power, d.infect))
            })
            .collect();
        for (card, power, infect) in attackers {
            if infect {
                self.game.tap_for_attack(&card, 0)?;
                self.game.poison_opponent(power);
            } else {
                self.game.tap_for_attack(&card, power)?;
            }
        }
        Ok(())
    }

    fn second_main_phase(&mut self) -> GameResult<()> {
        if let Some(route) = self.route.take() {
            return route.play(self);
        }
        self.play_all(Self::is_threat)?;
        self.play_all(Self::is_burn)
    }
}

impl SpellsPlayer for AggroPilot {
    fn can_play(&self, card: &str) -> bool {
        if !self.game.phase().is_some_and(|p| p.is_main()) || !self.game.hand().contains(card) {
            return false;
        }
        match self.definition(card) {
            Some(d) if d.is_land() => self.game.can_land(),
            Some(d) => plan(&self.game, &self.sources_for(card), d.cost).is_some(),
            None => false,
        }
    }

    fn play(&mut self, card: &str) -> GameResult<bool> {
        let Some(definition) = self.definition(card).cloned() else {
            return Ok(false);
        };
        if !self.game.hand().contains(card) {
            return Ok(false);
        }
        if definition.is_land() {
            if !self.game.can_land() {
                return Ok(false);
            }
            self.game.land(card)?;
            return Ok(true);
        }

        let sources = self.sources_for(card);
        if !maybe_produce(&mut self.game, &sources, definition.cost)? {
            return Ok(false);
        }
        if definition.is_permanent() {
            self.game.cast_permanent(card, definition.cost)?;
        } else if definition.is_instant() {
            self.game.cast_instant(card, definition.cost)?;
        } else {
            self.game.cast_sorcery(card, definition.cost)?;
        }
        if definition.burn > 0 {
            self.game.damage_opponent(definition.burn);
        }
        if let Some(mana) = definition.ritual.first() {
            self.game.add(*mana);
        }
        Ok(true)
    }
}
