use crate::card::database::CardDatabase;
use crate::card::types::{CardType, CardTypes};
use crate::game::error::GameError;
use crate::game::log::GameLog;
use crate::game::mana::Mana;
use crate::game::zones::{Battlefield, Cards, Permanent, PermanentId};
use crate::rng::GameRng;
use std::fmt;
use std::sync::Arc;

pub type GameResult<T> = Result<T, GameError>;

/// Steps of a turn, in the order they happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Untap,
    Upkeep,
    Draw,
    FirstMain,
    Combat,
    SecondMain,
    Ending,
}

impl Phase {
    pub fn is_main(&self) -> bool {
        matches!(self, Phase::FirstMain | Phase::SecondMain)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Untap => "untap",
            Phase::Upkeep => "upkeep",
            Phase::Draw => "draw",
            Phase::FirstMain => "first main",
            Phase::Combat => "combat",
            Phase::SecondMain => "second main",
            Phase::Ending => "ending",
        };
        write!(f, "{}", name)
    }
}

/// Places a card can be moved from or to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Hand,
    Library,
    Battlefield,
    Graveyard,
    Exile,
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Area::Hand => "hand",
            Area::Library => "library",
            Area::Battlefield => "battlefield",
            Area::Graveyard => "graveyard",
            Area::Exile => "exile",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
}

/// Complete state of one goldfish game.
///
/// Every mutation goes through an action that checks its precondition and
/// returns [`GameError::IllegalAction`] when it does not hold. Cloning is
/// cheap: zones are persistent vectors and the card database is shared.
#[derive(Debug, Clone)]
pub struct GameState {
    on_the_play: bool,
    mulligans: u32,
    turn: u32,
    phase: Option<Phase>,
    opponent_life: i32,
    opponent_poison: u32,
    land_drops: u32,

    library: Cards,
    hand: Cards,
    battlefield: Battlefield,
    graveyard: Cards,
    exile: Cards,

    pool: Mana,
    next_permanent_id: u32,

    database: Arc<CardDatabase>,
    log: GameLog,
}

impl GameState {
    pub fn new(database: Arc<CardDatabase>, log: GameLog) -> Self {
        GameState {
            on_the_play: true,
            mulligans: 0,
            turn: 0,
            phase: None,
            opponent_life: 20,
            opponent_poison: 0,
            land_drops: 1,
            library: Cards::new(),
            hand: Cards::new(),
            battlefield: Battlefield::new(),
            graveyard: Cards::new(),
            exile: Cards::new(),
            pool: Mana::ZERO,
            next_permanent_id: 1,
            database,
            log,
        }
    }

    // --- read access ---

    pub fn on_the_play(&self) -> bool {
        self.on_the_play
    }

    pub fn mulligans(&self) -> u32 {
        self.mulligans
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn opponent_life(&self) -> i32 {
        self.opponent_life
    }

    pub fn opponent_poison(&self) -> u32 {
        self.opponent_poison
    }

    /// Whether a land can still be played this turn
    pub fn can_land(&self) -> bool {
        self.land_drops > 0
    }

    pub fn land_drops_left(&self) -> u32 {
        self.land_drops
    }

    pub fn library(&self) -> &Cards {
        &self.library
    }

    pub fn hand(&self) -> &Cards {
        &self.hand
    }

    pub fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    pub fn graveyard(&self) -> &Cards {
        &self.graveyard
    }

    pub fn exile(&self) -> &Cards {
        &self.exile
    }

    pub fn pool(&self) -> Mana {
        self.pool
    }

    pub fn database(&self) -> &CardDatabase {
        &self.database
    }

    pub fn is_logging(&self) -> bool {
        self.log.is_enabled()
    }

    /// Appends a line to the game narration (no-op when muted)
    pub fn log(&mut self, message: impl FnOnce() -> String) {
        self.log.log(message);
    }

    pub fn log_lines(&self) -> &[String] {
        self.log.lines()
    }

    pub fn take_log(&mut self) -> Vec<String> {
        std::mem::replace(&mut self.log, GameLog::disabled()).into_lines()
    }

    /// Fully independent copy with a muted log, for speculative play
    pub fn fork(&self) -> GameState {
        let mut fork = self.clone();
        fork.log = self.log.muted();
        fork
    }

    // --- game setup ---

    pub fn start(&mut self, on_the_play: bool) {
        self.on_the_play = on_the_play;
        self.log(|| "=====================".to_string());
        self.log(|| format!("=== New Game: {} ===", if on_the_play { "OTP" } else { "OTD" }));
        self.log(|| "=====================".to_string());
    }

    pub fn reject_hand(&mut self, hand: &Cards) {
        let mulligans = self.mulligans;
        self.log(|| format!("hand #{} {} rejected: take mulligan", mulligans, hand));
        self.mulligans += 1;
    }

    pub fn keep_hand_and_start(&mut self, library: Cards, hand: Cards) {
        let mulligans = self.mulligans;
        self.log(|| format!("hand #{} {} kept", mulligans, hand));
        self.library = library;
        self.hand = hand;
    }

    // --- turn structure ---

    /// Begins the next turn: resets the land drop, the pool and the phase,
    /// and cleans every permanent up
    pub fn start_next_turn(&mut self) {
        self.turn += 1;
        self.land_drops = 1;
        self.pool = Mana::ZERO;
        self.phase = None;
        self.battlefield.for_each_mut(Permanent::cleanup);
        if self.is_logging() {
            let header = vec![
                format!("=== Turn {} ===", self.turn),
                format!("> opponent life: {}", self.opponent_life),
                format!("> opponent poison counters: {}", self.opponent_poison),
                format!("> hand: {}", self.hand),
                format!("> board: {}", self.battlefield),
                format!("> graveyard: {}", self.graveyard),
            ];
            for line in header {
                self.log(|| line);
            }
        }
    }

    /// Enters `phase`; phases only move forward within a turn. Empties the pool.
    pub fn start_phase(&mut self, phase: Phase) -> GameResult<()> {
        if let Some(current) = self.phase {
            if phase <= current {
                return Err(GameError::illegal(format!(
                    "can't start {} phase: already in {} phase",
                    phase, current
                )));
            }
        }
        self.phase = Some(phase);
        self.pool = Mana::ZERO;
        Ok(())
    }

    pub fn grant_extra_land_drop(&mut self) {
        self.land_drops += 1;
        self.log(|| "- extra land drop".to_string());
    }

    // --- mana ---

    pub fn has(&self, cost: &Mana) -> bool {
        self.pool.contains(cost)
    }

    pub fn pay(&mut self, cost: Mana) -> GameResult<()> {
        self.pay_quietly(cost)?;
        self.log(|| format!("- pay {}", cost));
        Ok(())
    }

    fn pay_quietly(&mut self, cost: Mana) -> GameResult<()> {
        match self.pool.minus(&cost) {
            Some(rest) => {
                self.pool = rest;
                Ok(())
            }
            None => Err(GameError::illegal(format!(
                "can't pay {}: not enough mana in pool ({})",
                cost, self.pool
            ))),
        }
    }

    pub fn add(&mut self, mana: Mana) {
        self.pool = self.pool.plus(&mana);
        self.log(|| format!("- add {} to mana pool", mana));
    }

    // --- tapping ---

    fn untapped_named(&self, card: &str) -> GameResult<PermanentId> {
        if !self.battlefield.contains(card) {
            return Err(GameError::illegal(format!("can't tap [{}]: not on board", card)));
        }
        self.battlefield
            .find_first(|p| p.card == card && !p.tapped)
            .map(|p| p.id)
            .ok_or_else(|| GameError::illegal(format!("can't tap [{}]: all tapped", card)))
    }

    fn permanent(&self, id: PermanentId) -> GameResult<&Permanent> {
        self.battlefield
            .get(id)
            .ok_or_else(|| GameError::illegal(format!("no permanent {} on board", id)))
    }

    fn permanent_mut(&mut self, id: PermanentId) -> GameResult<&mut Permanent> {
        self.battlefield
            .get_mut(id)
            .ok_or_else(|| GameError::illegal(format!("no permanent {} on board", id)))
    }

    fn set_tapped(&mut self, id: PermanentId) -> GameResult<String> {
        let permanent = self.permanent_mut(id)?;
        if permanent.tapped {
            return Err(GameError::illegal(format!(
                "can't tap [{}]: already tapped",
                permanent.card
            )));
        }
        permanent.tapped = true;
        Ok(permanent.card.clone())
    }

    /// Taps the first untapped permanent with this name
    pub fn tap(&mut self, card: &str) -> GameResult<PermanentId> {
        let id = self.untapped_named(card)?;
        self.tap_permanent(id)?;
        Ok(id)
    }

    pub fn tap_permanent(&mut self, id: PermanentId) -> GameResult<()> {
        let card = self.set_tapped(id)?;
        self.log(|| format!("- tap [{}]", card));
        Ok(())
    }

    pub fn tap_land_for_mana(&mut self, card: &str, mana: Mana) -> GameResult<PermanentId> {
        let id = self.untapped_named(card)?;
        if !self.permanent(id)?.is_land() {
            return Err(GameError::illegal(format!("can't tap [{}] for mana: not a land", card)));
        }
        self.tap_permanent_for_mana(id, mana)?;
        Ok(id)
    }

    pub fn tap_permanent_for_mana(&mut self, id: PermanentId, mana: Mana) -> GameResult<()> {
        let permanent = self.permanent(id)?;
        if permanent.is_creature() && permanent.has_sickness() {
            return Err(GameError::illegal(format!(
                "can't tap [{}] for mana: summoning sickness",
                permanent.card
            )));
        }
        let card = self.set_tapped(id)?;
        self.pool = self.pool.plus(&mana);
        self.log(|| format!("- tap [{}] and add {} to mana pool", card, mana));
        Ok(())
    }

    /// Taps a creature to attack; the goldfish takes `strength` damage
    pub fn tap_for_attack(&mut self, card: &str, strength: u32) -> GameResult<PermanentId> {
        let id = self
            .battlefield
            .find_first(|p| p.card == card && p.can_attack())
            .map(|p| p.id)
            .ok_or_else(|| {
                GameError::illegal(format!("can't attack with [{}]: no untapped ready creature", card))
            })?;
        self.set_tapped(id)?;
        self.opponent_life -= strength as i32;
        self.log(|| format!("- attack with [{}] for {}", card, strength));
        Ok(id)
    }

    /// Untaps the first tapped permanent with this name
    pub fn untap(&mut self, card: &str) -> GameResult<()> {
        if !self.battlefield.contains(card) {
            return Err(GameError::illegal(format!("can't untap [{}]: not on board", card)));
        }
        let id = self
            .battlefield
            .find_first(|p| p.card == card && p.tapped)
            .map(|p| p.id)
            .ok_or_else(|| GameError::illegal(format!("can't untap [{}]: not tapped", card)))?;
        self.permanent_mut(id)?.tapped = false;
        self.log(|| format!("- untap [{}]", card));
        Ok(())
    }

    pub fn untap_all(&mut self) {
        self.battlefield.for_each_mut(|p| p.tapped = false);
        self.log(|| "- untap all".to_string());
    }

    // --- permanent marks ---

    pub fn tag(&mut self, id: PermanentId, tag: &str) -> GameResult<()> {
        self.permanent_mut(id)?.tag(tag);
        Ok(())
    }

    pub fn add_counter(&mut self, id: PermanentId, counter: &str, count: i32) -> GameResult<()> {
        self.permanent_mut(id)?.add_counter(counter, count);
        Ok(())
    }

    // --- opponent ---

    pub fn damage_opponent(&mut self, damage: u32) {
        self.opponent_life -= damage as i32;
        let life = self.opponent_life;
        self.log(|| format!("- damage: {} (remains: {})", damage, life));
    }

    pub fn poison_opponent(&mut self, counters: u32) {
        self.opponent_poison += counters;
        let total = self.opponent_poison;
        self.log(|| format!("- poison: {} (total: {})", counters, total));
    }

    // --- library ---

    pub fn shuffle_library(&mut self, rng: &mut GameRng) {
        self.library.shuffle(rng);
        self.log(|| "- shuffle library".to_string());
    }

    /// Draws `cards` cards; running out of library loses the game
    pub fn draw(&mut self, cards: usize) -> GameResult<()> {
        if self.library.len() < cards {
            return Err(GameError::DeckExhausted {
                requested: cards,
                remaining: self.library.len(),
            });
        }
        let drawn = self.library.take_top(cards);
        self.log(|| format!("- draw {}: {}", cards, drawn));
        self.hand.append(drawn);
        Ok(())
    }

    /// Puts up to `cards` cards from the top of the library into the graveyard
    pub fn mill(&mut self, cards: usize) -> Cards {
        let milled = self.library.take_top(cards);
        self.log(|| format!("- mill {}: {}", cards, milled));
        for card in milled.iter() {
            self.graveyard.add_top(card);
        }
        milled
    }

    pub fn look_at_top(&mut self, cards: usize) -> Cards {
        let top = self.library.look(cards);
        self.log(|| format!("- look at top {}: {}", cards, top));
        top
    }

    // --- moving cards ---

    fn card_types(&self, card: &str) -> GameResult<CardTypes> {
        self.database
            .get(card)
            .map(|c| c.types.clone())
            .ok_or_else(|| GameError::illegal(format!("unknown card [{}]", card)))
    }

    fn zone_mut(&mut self, area: Area) -> Option<&mut Cards> {
        match area {
            Area::Hand => Some(&mut self.hand),
            Area::Library => Some(&mut self.library),
            Area::Graveyard => Some(&mut self.graveyard),
            Area::Exile => Some(&mut self.exile),
            Area::Battlefield => None,
        }
    }

    fn enter_battlefield(&mut self, card: &str, types: CardTypes) -> PermanentId {
        let haste = self.database.get(card).map_or(false, |c| c.haste);
        let sick = types.contains(&CardType::Creature) && !haste;
        let tapped = self.database.get(card).map_or(false, |c| c.enters_tapped);
        let id = PermanentId(self.next_permanent_id);
        self.next_permanent_id += 1;
        self.battlefield.add(
            Permanent::new(id, card, types)
                .with_sickness(sick)
                .with_tapped(tapped),
        );
        id
    }

    fn take(&mut self, card: &str, from: Area) -> GameResult<()> {
        let found = if from == Area::Battlefield {
            let id = self.battlefield.named(card).next().map(|p| p.id);
            id.and_then(|id| self.battlefield.remove(id)).is_some()
        } else {
            self.zone_mut(from).map_or(false, |zone| zone.remove(card))
        };
        if found {
            Ok(())
        } else {
            Err(GameError::illegal(format!(
                "can't move [{}]: not in {}",
                card, from
            )))
        }
    }

    fn put(&mut self, card: &str, to: Area, side: Side) -> GameResult<Option<PermanentId>> {
        if to == Area::Battlefield {
            let types = self.card_types(card)?;
            return Ok(Some(self.enter_battlefield(card, types)));
        }
        if let Some(zone) = self.zone_mut(to) {
            match side {
                Side::Top => zone.add_top(card),
                Side::Bottom => zone.add_bottom(card),
            }
        }
        Ok(None)
    }

    /// Atomic move: the card is removed from `from` then added to `to`.
    /// Returns the new permanent when the card enters the battlefield.
    pub fn move_card(
        &mut self,
        card: &str,
        from: Area,
        to: Area,
        side: Side,
    ) -> GameResult<Option<PermanentId>> {
        if to == Area::Battlefield {
            self.card_types(card)?;
        }
        self.take(card, from)?;
        let id = self.put(card, to, side)?;
        self.log(|| {
            format!(
                "- move [{}] from {} to {}{}",
                card,
                from,
                if side == Side::Top { "" } else { "bottom of " },
                to
            )
        });
        Ok(id)
    }

    /// Plays a land from hand, using the turn's land drop
    pub fn land(&mut self, card: &str) -> GameResult<PermanentId> {
        if !self.hand.contains(card) {
            return Err(GameError::illegal(format!("can't land [{}]: not in hand", card)));
        }
        if !self.can_land() {
            return Err(GameError::illegal(format!(
                "can't land [{}]: no land drop left this turn",
                card
            )));
        }
        let types = self.card_types(card)?;
        if !types.contains(&CardType::Land) {
            return Err(GameError::illegal(format!("can't land [{}]: not a land", card)));
        }
        self.hand.remove(card);
        self.land_drops -= 1;
        let id = self.enter_battlefield(card, types);
        self.log(|| format!("- land [{}]", card));
        Ok(id)
    }

    /// Pays `cost` and moves the card between any two areas (e.g. flashback)
    pub fn cast(
        &mut self,
        card: &str,
        from: Area,
        to: Area,
        cost: Mana,
    ) -> GameResult<Option<PermanentId>> {
        if !self.has(&cost) {
            return Err(GameError::illegal(format!(
                "can't cast [{}] for {}: not enough mana in pool ({})",
                card, cost, self.pool
            )));
        }
        let present = match from {
            Area::Battlefield => self.battlefield.contains(card),
            Area::Hand => self.hand.contains(card),
            Area::Library => self.library.contains(card),
            Area::Graveyard => self.graveyard.contains(card),
            Area::Exile => self.exile.contains(card),
        };
        if !present {
            return Err(GameError::illegal(format!("can't cast [{}]: not in {}", card, from)));
        }
        if to == Area::Battlefield {
            self.card_types(card)?;
        }
        self.pay_quietly(cost)?;
        self.take(card, from)?;
        let id = self.put(card, to, Side::Top)?;
        self.log(|| {
            format!(
                "- cast [{}]{}{} for {}",
                card,
                if from == Area::Hand { String::new() } else { format!(" from {}", from) },
                if to == Area::Graveyard { String::new() } else { format!(" to {}", to) },
                cost
            )
        });
        Ok(id)
    }

    /// Casts a permanent spell from hand onto the battlefield
    pub fn cast_permanent(&mut self, card: &str, cost: Mana) -> GameResult<PermanentId> {
        self.cast(card, Area::Hand, Area::Battlefield, cost)?
            .ok_or_else(|| GameError::illegal(format!("[{}] did not enter the battlefield", card)))
    }

    /// Casts a spell from hand into the graveyard
    pub fn cast_non_permanent(&mut self, card: &str, cost: Mana) -> GameResult<()> {
        self.cast(card, Area::Hand, Area::Graveyard, cost)?;
        Ok(())
    }

    pub fn cast_instant(&mut self, card: &str, cost: Mana) -> GameResult<()> {
        self.cast_non_permanent(card, cost)
    }

    /// Like [`cast_instant`](Self::cast_instant), but only during a main phase
    pub fn cast_sorcery(&mut self, card: &str, cost: Mana) -> GameResult<()> {
        match self.phase {
            Some(phase) if phase.is_main() => self.cast_non_permanent(card, cost),
            phase => Err(GameError::illegal(format!(
                "can't cast sorcery [{}] outside of a main phase ({})",
                card,
                phase.map_or_else(|| "no phase".to_string(), |p| p.to_string())
            ))),
        }
    }

    pub fn put_onto_battlefield(&mut self, card: &str, from: Area) -> GameResult<PermanentId> {
        self.move_card(card, from, Area::Battlefield, Side::Top)?
            .ok_or_else(|| GameError::illegal(format!("[{}] did not enter the battlefield", card)))
    }

    pub fn create_token(&mut self, card: &str, types: &[CardType]) -> PermanentId {
        let id = self.enter_battlefield(card, types.iter().copied().collect());
        self.log(|| format!("- create token [{}]", card));
        id
    }

    pub fn discard(&mut self, card: &str) -> GameResult<()> {
        self.take(card, Area::Hand)?;
        self.graveyard.add_top(card);
        self.log(|| format!("- discard [{}]", card));
        Ok(())
    }

    /// Discards the first of `cards` (by preference) found in hand
    pub fn discard_one_of(&mut self, cards: &[&str]) -> GameResult<Option<String>> {
        match self.hand.find_first(cards) {
            Some(card) => {
                self.discard(card)?;
                Ok(Some(card.to_string()))
            }
            None => Ok(None),
        }
    }

    fn leave_battlefield(&mut self, id: PermanentId, verb: &str) -> GameResult<()> {
        let permanent = self
            .battlefield
            .remove(id)
            .ok_or_else(|| GameError::illegal(format!("can't {} {}: not on board", verb, id)))?;
        self.graveyard.add_top(&permanent.card);
        self.log(|| format!("- {} [{}]", verb, permanent.card));
        Ok(())
    }

    fn first_named(&self, card: &str, verb: &str) -> GameResult<PermanentId> {
        self.battlefield
            .named(card)
            .next()
            .map(|p| p.id)
            .ok_or_else(|| GameError::illegal(format!("can't {} [{}]: not on board", verb, card)))
    }

    pub fn sacrifice(&mut self, card: &str) -> GameResult<()> {
        let id = self.first_named(card, "sacrifice")?;
        self.sacrifice_permanent(id)
    }

    pub fn sacrifice_permanent(&mut self, id: PermanentId) -> GameResult<()> {
        self.leave_battlefield(id, "sacrifice")
    }

    pub fn destroy(&mut self, card: &str) -> GameResult<()> {
        let id = self.first_named(card, "destroy")?;
        self.leave_battlefield(id, "destroy")
    }

    pub fn put_on_bottom_of_library(&mut self, card: &str) -> GameResult<()> {
        self.move_card(card, Area::Hand, Area::Library, Side::Bottom)?;
        Ok(())
    }

    pub fn put_on_bottom_of_library_one_of(&mut self, cards: &[&str]) -> GameResult<Option<String>> {
        match self.hand.find_first(cards) {
            Some(card) => {
                self.put_on_bottom_of_library(card)?;
                Ok(Some(card.to_string()))
            }
            None => Ok(None),
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "turn {} ({}) opponent {} life {} poison, pool {}, hand {}, board {}",
            self.turn,
            self.phase.map_or_else(|| "-".to_string(), |p| p.to_string()),
            self.opponent_life,
            self.opponent_poison,
            self.pool,
            self.hand,
            self.battlefield
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::types::CardDefinition;

    fn database() -> Arc<CardDatabase> {
        Arc::new(
            CardDatabase::new()
                .with(CardDefinition::new("forest", &[CardType::Land]).producing(&[Mana::G]))
                .with(
                    CardDefinition::new("elf", &[CardType::Creature])
                        .with_cost(Mana::G)
                        .with_power(1),
                )
                .with(
                    CardDefinition::new("guide", &[CardType::Creature])
                        .with_cost(Mana::R)
                        .with_power(2)
                        .with_haste(),
                )
                .with(CardDefinition::new("spike", &[CardType::Sorcery]).with_cost(Mana::R)),
        )
    }

    fn game(hand: &[&str], library: &[&str]) -> GameState {
        let mut game = GameState::new(database(), GameLog::enabled());
        game.start(true);
        game.keep_hand_and_start(Cards::of(library), Cards::of(hand));
        game.start_next_turn();
        game
    }

    #[test]
    fn test_land_once_per_turn() {
        let mut game = game(&["forest", "forest"], &[]);
        game.land("forest").unwrap();
        assert!(!game.can_land());
        assert!(game.land("forest").is_err());
        game.grant_extra_land_drop();
        game.land("forest").unwrap();
        assert_eq!(game.battlefield().count("forest"), 2);
        game.start_next_turn();
        assert!(game.can_land());
    }

    #[test]
    fn test_land_rejects_non_land() {
        let mut game = game(&["elf"], &[]);
        assert!(matches!(game.land("elf"), Err(GameError::IllegalAction(_))));
        assert!(game.hand().contains("elf"));
    }

    #[test]
    fn test_pay_requires_mana() {
        let mut game = game(&[], &[]);
        assert!(game.pay(Mana::G).is_err());
        game.add(Mana::G);
        game.pay(Mana::ONE).unwrap();
        assert!(game.pool().is_empty());
    }

    #[test]
    fn test_tap_land_for_mana() {
        let mut game = game(&["forest"], &[]);
        game.land("forest").unwrap();
        game.tap_land_for_mana("forest", Mana::G).unwrap();
        assert!(game.has(&Mana::G));
        assert!(game.tap("forest").is_err());
        game.untap("forest").unwrap();
        assert!(game.untap("forest").is_err());
        assert!(game.tap("mountain").is_err());
    }

    #[test]
    fn test_tap_land_for_mana_rejects_non_land() {
        let mut game = game(&[], &[]);
        let elf = game.create_token("elf", &[CardType::Creature]);
        game.start_next_turn();
        assert!(matches!(
            game.tap_land_for_mana("elf", Mana::G),
            Err(GameError::IllegalAction(_))
        ));
        assert!(game.battlefield().get(elf).is_some_and(|p| !p.tapped));
        assert!(game.pool().is_empty());
    }

    #[test]
    fn test_creature_enters_sick_unless_haste() {
        let mut game = game(&["elf", "guide"], &[]);
        game.add(Mana::new(0, 0, 1, 1, 0, 0));
        let elf = game.cast_permanent("elf", Mana::G).unwrap();
        let guide = game.cast_permanent("guide", Mana::R).unwrap();
        assert!(game.battlefield().get(elf).map_or(false, |p| p.has_sickness()));
        assert!(game.tap_for_attack("elf", 1).is_err());
        game.tap_for_attack("guide", 2).unwrap();
        assert_eq!(game.opponent_life(), 18);
        assert!(game.battlefield().get(guide).map_or(false, |p| p.tapped));

        game.start_next_turn();
        assert_eq!(game.battlefield().get(elf).and_then(|p| p.sickness), None);
    }

    #[test]
    fn test_cast_sorcery_only_in_main_phase() {
        let mut game = game(&["spike"], &[]);
        game.start_phase(Phase::Upkeep).unwrap();
        game.add(Mana::R);
        assert!(game.cast_sorcery("spike", Mana::R).is_err());
        game.start_phase(Phase::FirstMain).unwrap();
        game.add(Mana::R);
        game.cast_sorcery("spike", Mana::R).unwrap();
        assert!(game.graveyard().contains("spike"));
    }

    #[test]
    fn test_phases_move_forward_and_empty_pool() {
        let mut game = game(&[], &[]);
        game.start_phase(Phase::FirstMain).unwrap();
        game.add(Mana::G);
        game.start_phase(Phase::Combat).unwrap();
        assert!(game.pool().is_empty());
        assert!(game.start_phase(Phase::FirstMain).is_err());
        assert!(game.start_phase(Phase::Combat).is_err());
        game.start_next_turn();
        game.start_phase(Phase::Untap).unwrap();
    }

    #[test]
    fn test_start_next_turn_empties_pool() {
        let mut game = game(&[], &[]);
        game.add(Mana::generic(3));
        game.start_next_turn();
        assert!(game.pool().is_empty());
        assert_eq!(game.turn(), 2);
        assert_eq!(game.phase(), None);
    }

    #[test]
    fn test_draw_from_empty_library_loses() {
        let mut game = game(&[], &["forest"]);
        game.draw(1).unwrap();
        assert_eq!(
            game.draw(1),
            Err(GameError::DeckExhausted {
                requested: 1,
                remaining: 0
            })
        );
        assert_eq!(game.hand().len(), 1);
    }

    #[test]
    fn test_move_card_is_atomic() {
        let mut game = game(&["forest"], &["elf"]);
        assert!(game
            .move_card("elf", Area::Hand, Area::Graveyard, Side::Top)
            .is_err());
        assert!(game.hand().contains("forest"));
        game.move_card("forest", Area::Hand, Area::Library, Side::Bottom)
            .unwrap();
        assert_eq!(game.library(), &Cards::of(&["elf", "forest"]));
        assert!(game
            .move_card("unknown", Area::Library, Area::Battlefield, Side::Top)
            .is_err());
    }

    #[test]
    fn test_discard_and_bottom_one_of() {
        let mut game = game(&["elf", "forest", "spike"], &[]);
        assert_eq!(
            game.discard_one_of(&["spike", "elf"]).unwrap(),
            Some("spike".to_string())
        );
        assert_eq!(game.discard_one_of(&["island"]).unwrap(), None);
        assert_eq!(
            game.put_on_bottom_of_library_one_of(&["forest"]).unwrap(),
            Some("forest".to_string())
        );
        assert_eq!(game.library().first(), Some("forest"));
        assert_eq!(game.hand(), &Cards::of(&["elf"]));
    }

    #[test]
    fn test_sacrifice_and_tokens() {
        let mut game = game(&[], &[]);
        let token = game.create_token("saproling", &[CardType::Creature]);
        assert!(game.battlefield().get(token).map_or(false, |p| p.has_sickness()));
        game.sacrifice("saproling").unwrap();
        assert!(game.battlefield().is_empty());
        assert!(game.graveyard().contains("saproling"));
        assert!(game.destroy("saproling").is_err());
    }

    #[test]
    fn test_mill_and_look() {
        let mut game = game(&[], &["elf", "forest", "spike"]);
        assert_eq!(game.look_at_top(2), Cards::of(&["elf", "forest"]));
        assert_eq!(game.library().len(), 3);
        let milled = game.mill(5);
        assert_eq!(milled.len(), 3);
        assert!(game.library().is_empty());
        assert_eq!(game.graveyard().len(), 3);
    }

    #[test]
    fn test_fork_is_independent_and_muted() {
        let mut game = game(&["forest", "elf"], &["spike"]);
        let mut fork = game.fork();
        fork.land("forest").unwrap();
        fork.draw(1).unwrap();
        fork.damage_opponent(5);
        assert!(!fork.is_logging());
        assert!(game.hand().contains("forest"));
        assert!(game.battlefield().is_empty());
        assert_eq!(game.library().len(), 1);
        assert_eq!(game.opponent_life(), 20);
        assert!(game.can_land());
        game.land("forest").unwrap();
        assert_eq!(fork.battlefield().len(), 1);
    }

    #[test]
    fn test_flashback_cast_from_graveyard() {
        let mut game = game(&["spike"], &[]);
        game.discard("spike").unwrap();
        game.add(Mana::R);
        game.cast("spike", Area::Graveyard, Area::Exile, Mana::R).unwrap();
        assert!(game.exile().contains("spike"));
        assert!(game.graveyard().is_empty());
    }

    #[test]
    fn test_log_narrates_actions() {
        let mut game = game(&["forest"], &[]);
        game.land("forest").unwrap();
        assert!(game.log_lines().iter().any(|l| l == "- land [forest]"));
        let lines = game.take_log();
        assert!(lines.iter().any(|l| l.starts_with("=== Turn 1")));
    }
}
