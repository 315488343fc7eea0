use crate::game::mana::Mana;
use crate::game::sources::{ManaSource, SourceKind};
use crate::game::state::{GameResult, GameState};
use crate::game::zones::PermanentId;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::trace;

/// One activation of a plan: which source, producing which alternative
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    pub source: ManaSource,
    pub mana: Mana,
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to produce {}", self.source, self.mana)
    }
}

/// Ordered mana source activations sufficient to pay a cost
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductionPlan {
    pub steps: Vec<PlanStep>,
}

impl ProductionPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Replays every step on the real game
    pub fn execute(&self, game: &mut GameState) -> GameResult<()> {
        for step in &self.steps {
            step.source.commit(game, step.mana)?;
        }
        Ok(())
    }
}

impl fmt::Display for ProductionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.steps.iter().map(|s| s.to_string()).collect();
        write!(f, "[{}]", steps.join(", "))
    }
}

/// Unit of mana the planner looks for next: the first missing color in
/// B, R, G, U, W order, else one generic
pub fn wanted_unit(missing: &Mana) -> Mana {
    if missing.b > 0 {
        Mana::B
    } else if missing.r > 0 {
        Mana::R
    } else if missing.g > 0 {
        Mana::G
    } else if missing.u > 0 {
        Mana::U
    } else if missing.w > 0 {
        Mana::W
    } else {
        Mana::ONE
    }
}

/// Finds a plan to get `cost` into the mana pool, without touching the game.
///
/// Sources are tried first-fit in catalog order. A source with an activation
/// cost is used when the simulated pool can pay for it, or when the remaining
/// sources can produce that cost first.
pub fn plan(game: &GameState, sources: &[ManaSource], cost: Mana) -> Option<ProductionPlan> {
    let mut search = Search {
        game,
        sources,
        available: vec![true; sources.len()],
        used_permanents: BTreeSet::new(),
        used_cards: BTreeMap::new(),
        landings: 0,
    };
    let mut steps = Vec::new();
    match search.solve(game.pool(), cost, &mut steps) {
        Some(_) => {
            let plan = ProductionPlan { steps };
            trace!(%cost, %plan, "mana plan found");
            Some(plan)
        }
        None => {
            trace!(%cost, pool = %game.pool(), "no mana plan");
            None
        }
    }
}

/// Plans and executes; `Ok(false)` when the cost can't be produced
pub fn maybe_produce(game: &mut GameState, sources: &[ManaSource], cost: Mana) -> GameResult<bool> {
    match plan(game, sources, cost) {
        Some(plan) => {
            plan.execute(game)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Produces then pays `cost`; `Ok(false)` (and no change) when it can't be produced
pub fn maybe_pay(game: &mut GameState, sources: &[ManaSource], cost: Mana) -> GameResult<bool> {
    if maybe_produce(game, sources, cost)? {
        game.pay(cost)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

#[derive(Clone)]
struct Reservations {
    available: Vec<bool>,
    used_permanents: BTreeSet<PermanentId>,
    used_cards: BTreeMap<String, usize>,
    landings: u32,
}

struct Search<'a> {
    game: &'a GameState,
    sources: &'a [ManaSource],
    available: Vec<bool>,
    used_permanents: BTreeSet<PermanentId>,
    used_cards: BTreeMap<String, usize>,
    landings: u32,
}

impl<'a> Search<'a> {
    fn snapshot(&self) -> Reservations {
        Reservations {
            available: self.available.clone(),
            used_permanents: self.used_permanents.clone(),
            used_cards: self.used_cards.clone(),
            landings: self.landings,
        }
    }

    fn restore(&mut self, snapshot: Reservations) {
        self.available = snapshot.available;
        self.used_permanents = snapshot.used_permanents;
        self.used_cards = snapshot.used_cards;
        self.landings = snapshot.landings;
    }

    fn card_left(&self, card: &str, copies: usize) -> bool {
        self.used_cards.get(card).copied().unwrap_or(0) < copies
    }

    /// The source as it can still be used given what the plan already
    /// consumed, or `None` if it can't be used any more
    fn usable(&self, source: &ManaSource) -> Option<ManaSource> {
        if let Some(id) = source.permanent() {
            if self.used_permanents.contains(&id) {
                return None;
            }
        }
        if let Some((card, copies)) = source.hand_card() {
            if !self.card_left(card, copies) {
                return None;
            }
        }
        if let SourceKind::Landing { options } = &source.kind {
            if self.landings >= self.game.land_drops_left() {
                return None;
            }
            let options: Vec<_> = options
                .iter()
                .filter(|o| self.card_left(&o.card, o.copies))
                .cloned()
                .collect();
            if options.is_empty() {
                return None;
            }
            let produces: Vec<Mana> = source
                .produces
                .iter()
                .filter(|m| options.iter().any(|o| o.produces.contains(m)))
                .copied()
                .collect();
            return Some(ManaSource {
                kind: SourceKind::Landing { options },
                activation_cost: source.activation_cost,
                produces,
            });
        }
        Some(source.clone())
    }

    /// Marks what producing `mana` with `source` consumes, and returns the
    /// step to record
    fn consume(&mut self, index: usize, source: &ManaSource, mana: Mana) -> PlanStep {
        self.available[index] = false;
        if let Some(id) = source.permanent() {
            self.used_permanents.insert(id);
        }
        if let Some((card, _)) = source.hand_card() {
            *self.used_cards.entry(card.to_string()).or_insert(0) += 1;
        }
        let source = match &source.kind {
            SourceKind::Landing { options } => {
                self.landings += 1;
                match options.iter().find(|o| o.produces.contains(&mana)) {
                    Some(option) => {
                        *self.used_cards.entry(option.card.clone()).or_insert(0) += 1;
                        source.narrowed_to(option)
                    }
                    None => source.clone(),
                }
            }
            _ => source.clone(),
        };
        PlanStep { source, mana }
    }

    /// Adds steps until `pool` contains `cost`; returns the resulting pool
    fn solve(&mut self, mut pool: Mana, cost: Mana, steps: &mut Vec<PlanStep>) -> Option<Mana> {
        while !pool.contains(&cost) {
            let missing = pool.extract(&cost).not_extracted;
            pool = self.produce_one(pool, wanted_unit(&missing), steps)?;
        }
        Some(pool)
    }

    /// Finds the first source able to produce `unit` and adds it to the plan
    fn produce_one(&mut self, pool: Mana, unit: Mana, steps: &mut Vec<PlanStep>) -> Option<Mana> {
        for index in 0..self.sources.len() {
            if !self.available[index] {
                continue;
            }
            let source = match self.usable(&self.sources[index]) {
                Some(source) => source,
                None => continue,
            };
            let mana = match source.produces.iter().find(|m| m.contains(&unit)) {
                Some(mana) => *mana,
                None => continue,
            };
            let activation = source.activation_cost;

            if activation.is_empty() {
                steps.push(self.consume(index, &source, mana));
                return Some(pool.plus(&mana));
            }

            if let Some(rest) = pool.minus(&activation) {
                steps.push(self.consume(index, &source, mana));
                return Some(rest.plus(&mana));
            }

            // produce the activation cost with the other sources first
            let snapshot = self.snapshot();
            let step = self.consume(index, &source, mana);
            let mut before = Vec::new();
            match self
                .solve(pool, activation, &mut before)
                .and_then(|p| p.minus(&activation))
            {
                Some(rest) => {
                    trace!(source = %source, "activation cost planned recursively");
                    steps.extend(before);
                    steps.push(step);
                    return Some(rest.plus(&mana));
                }
                None => self.restore(snapshot),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::database::CardDatabase;
    use crate::card::types::{CardDefinition, CardType};
    use crate::game::log::GameLog;
    use crate::game::sources::{LandingOption, ManaSources};
    use crate::game::zones::Cards;
    use std::sync::Arc;

    fn mana(s: &str) -> Mana {
        s.parse().unwrap()
    }

    fn database() -> Arc<CardDatabase> {
        Arc::new(
            CardDatabase::new()
                .with(CardDefinition::new("forest", &[CardType::Land]).producing(&[Mana::G]))
                .with(CardDefinition::new("mountain", &[CardType::Land]).producing(&[Mana::R]))
                .with(CardDefinition::new("swamp", &[CardType::Land]).producing(&[Mana::B]))
                .with(
                    CardDefinition::new("elf", &[CardType::Creature])
                        .with_cost(Mana::G)
                        .with_power(1),
                )
                .with(
                    CardDefinition::new("petal", &[CardType::Artifact])
                        .sacrificed_for(&[Mana::B, Mana::R, Mana::G]),
                )
                .with(
                    CardDefinition::new("spirit guide", &[CardType::Creature])
                        .with_cost(mana("2R"))
                        .discarded_for(&[Mana::R]),
                )
                .with(
                    CardDefinition::new("ritual", &[CardType::Instant])
                        .with_cost(Mana::B)
                        .as_ritual(&[mana("BBB")]),
                )
                .with(
                    CardDefinition::new("song", &[CardType::Instant])
                        .with_cost(mana("2R"))
                        .as_ritual(&[mana("RRRRR")]),
                ),
        )
    }

    fn game(hand: &[&str], board: &[&str]) -> GameState {
        let mut game = GameState::new(database(), GameLog::disabled());
        let all: Vec<&str> = hand.iter().chain(board.iter()).copied().collect();
        game.keep_hand_and_start(Cards::new(), Cards::of(&all));
        for card in board {
            game.put_onto_battlefield(card, crate::game::state::Area::Hand)
                .unwrap();
        }
        game.start_next_turn();
        game
    }

    #[test]
    fn test_pool_already_contains_cost() {
        let mut game = game(&[], &[]);
        game.add(Mana::G);
        let plan = plan(&game, &[], Mana::G).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_single_land_single_step() {
        let mut game = game(&["elf"], &["forest"]);
        let sources = ManaSources::new(&game)
            .tap("forest", Mana::ZERO, &[Mana::G])
            .build();
        let plan = plan(&game, &sources, Mana::G).unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.to_string(), "[tap [forest] to produce G]");

        plan.execute(&mut game).unwrap();
        assert!(game.has(&Mana::G));
        game.cast_permanent("elf", Mana::G).unwrap();
        assert!(game.battlefield().contains("elf"));
    }

    #[test]
    fn test_no_sources_is_infeasible() {
        let game = game(&[], &[]);
        assert!(plan(&game, &[], Mana::ONE).is_none());
    }

    #[test]
    fn test_colors_searched_before_generic() {
        let game = game(&[], &["forest", "mountain"]);
        let sources = ManaSources::new(&game)
            .tap("forest", Mana::ZERO, &[Mana::G])
            .tap("mountain", Mana::ZERO, &[Mana::R])
            .build();
        let plan = plan(&game, &sources, mana("1R")).unwrap();
        let produced: Vec<Mana> = plan.steps.iter().map(|s| s.mana).collect();
        assert_eq!(produced, vec![Mana::R, Mana::G]);
    }

    #[test]
    fn test_one_card_does_not_feed_two_sources() {
        let game = game(&["spirit guide"], &[]);
        let sources = ManaSources::new(&game)
            .discard("spirit guide", Mana::ZERO, &[Mana::R])
            .cast("spirit guide", Mana::ZERO, &[Mana::R])
            .build();
        assert!(plan(&game, &sources, Mana::R).is_some());
        assert!(plan(&game, &sources, mana("RR")).is_none());
    }

    #[test]
    fn test_landing_uses_the_land_drop_once() {
        let game = game(&["forest", "mountain"], &[]);
        let sources = ManaSources::new(&game)
            .landing(&[
                LandingOption::new("forest", &[Mana::G]),
                LandingOption::new("mountain", &[Mana::R]),
            ])
            .build();
        let plan_r = plan(&game, &sources, Mana::R).unwrap();
        assert_eq!(plan_r.to_string(), "[land one of [mountain] to produce R]");
        assert!(plan(&game, &sources, mana("RG")).is_none());
    }

    #[test]
    fn test_activation_cost_borrowed_from_pool() {
        let mut game = game(&["song"], &[]);
        game.add(mana("2R"));
        let sources = ManaSources::new(&game)
            .cast("song", mana("2R"), &[mana("RRRRR")])
            .build();
        let plan = plan(&game, &sources, mana("RRRR")).unwrap();
        assert_eq!(plan.steps.len(), 1);
        plan.execute(&mut game).unwrap();
        assert!(game.has(&mana("RRRR")));
    }

    #[test]
    fn test_activation_cost_planned_recursively() {
        let mut game = game(&["ritual"], &["swamp"]);
        let sources = ManaSources::new(&game)
            .cast("ritual", Mana::B, &[mana("BBB")])
            .tap("swamp", Mana::ZERO, &[Mana::B])
            .build();
        let plan = plan(&game, &sources, mana("BB")).unwrap();
        assert_eq!(
            plan.to_string(),
            "[tap [swamp] to produce B, cast [ritual] for B to produce BBB]"
        );
        plan.execute(&mut game).unwrap();
        assert_eq!(game.pool(), mana("BBB"));
        assert!(game.graveyard().contains("ritual"));
    }

    #[test]
    fn test_failed_recursion_releases_sources() {
        let game = game(&["song"], &["forest"]);
        let sources = ManaSources::new(&game)
            .cast("song", mana("2R"), &[mana("RRRRR")])
            .tap("forest", Mana::ZERO, &[Mana::G])
            .build();
        // song can't be paid for, so the forest must still be usable
        let plan = plan(&game, &sources, Mana::ONE).unwrap();
        assert_eq!(plan.to_string(), "[tap [forest] to produce G]");
    }

    #[test]
    fn test_reserved_spell_not_used_for_mana() {
        let game = game(&["spirit guide"], &[]);
        let sources = ManaSources::new(&game)
            .discard("spirit guide", Mana::ZERO, &[Mana::R])
            .reserve("spirit guide")
            .build();
        assert!(plan(&game, &sources, Mana::R).is_none());
    }

    #[test]
    fn test_maybe_pay() {
        let mut game = game(&["elf"], &["petal"]);
        let sources = ManaSources::new(&game)
            .sacrifice("petal", Mana::ZERO, &[Mana::B, Mana::R, Mana::G])
            .build();
        assert!(!maybe_pay(&mut game, &sources, mana("GG")).unwrap());
        assert!(game.battlefield().contains("petal"));
        assert!(maybe_pay(&mut game, &sources, Mana::G).unwrap());
        assert!(game.pool().is_empty());
        assert!(game.graveyard().contains("petal"));
    }

    #[test]
    fn test_executed_plan_leaves_cost_in_pool() {
        let mut game = game(&["spirit guide", "song", "mountain"], &["forest", "petal"]);
        let cost = mana("4RR");
        let sources = ManaSources::from_database(&game).build();
        let plan = plan(&game, &sources, cost).unwrap();
        plan.execute(&mut game).unwrap();
        assert!(game.has(&cost));
    }
}
