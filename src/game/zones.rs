use crate::card::types::{CardType, CardTypes};
use crate::rng::GameRng;
use im::Vector;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Ordered multiset of card names (library, hand, graveyard, exile).
///
/// The head is the top of the zone. Backed by a persistent vector so cloning
/// a zone for a fork is cheap and never aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cards {
    cards: Vector<String>,
}

impl Cards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(names: &[&str]) -> Self {
        names.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cards.iter().any(|c| c == name)
    }

    pub fn count(&self, name: &str) -> usize {
        self.cards.iter().filter(|c| *c == name).count()
    }

    pub fn first(&self) -> Option<&str> {
        self.cards.front().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.cards.iter().map(String::as_str)
    }

    /// First of `names` (in preference order) present in this zone
    pub fn find_first<'a>(&self, names: &[&'a str]) -> Option<&'a str> {
        names.iter().copied().find(|name| self.contains(name))
    }

    /// Every card of `names` present in this zone, once each, in preference order
    pub fn find_all<'a>(&self, names: &[&'a str]) -> Vec<&'a str> {
        let mut found: Vec<&'a str> = Vec::new();
        for name in names {
            if self.contains(name) && !found.contains(name) {
                found.push(name);
            }
        }
        found
    }

    /// Distinct names in zone order
    pub fn distinct(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.iter().filter(|c| seen.insert(*c)).collect()
    }

    /// Top `n` cards, without removing them
    pub fn look(&self, n: usize) -> Cards {
        Cards {
            cards: self.cards.iter().take(n).cloned().collect(),
        }
    }

    /// Removes and returns the top `n` cards; the caller checks there are enough
    pub fn take_top(&mut self, n: usize) -> Cards {
        let n = n.min(self.cards.len());
        let rest = self.cards.split_off(n);
        let top = std::mem::replace(&mut self.cards, rest);
        Cards { cards: top }
    }

    /// Removes the first occurrence of `name`; returns whether one was found
    pub fn remove(&mut self, name: &str) -> bool {
        match self.cards.iter().position(|c| c == name) {
            Some(index) => {
                self.cards.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn add_top(&mut self, name: &str) {
        self.cards.push_front(name.to_string());
    }

    pub fn add_bottom(&mut self, name: &str) {
        self.cards.push_back(name.to_string());
    }

    pub fn append(&mut self, other: Cards) {
        self.cards.append(other.cards);
    }

    pub fn shuffle(&mut self, rng: &mut GameRng) {
        let mut cards: Vec<String> = self.cards.iter().cloned().collect();
        rng.shuffle(&mut cards);
        self.cards = cards.into_iter().collect();
    }
}

impl<'a> FromIterator<&'a str> for Cards {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Cards {
            cards: iter.into_iter().map(str::to_string).collect(),
        }
    }
}

impl FromIterator<String> for Cards {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Cards {
            cards: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Cards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, card) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", card)?;
        }
        write!(f, "]")
    }
}

/// Handle of a permanent, unique within one game and kept by forks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermanentId(pub u32);

impl fmt::Display for PermanentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A card on the battlefield with its play state
#[derive(Debug, Clone, PartialEq)]
pub struct Permanent {
    pub id: PermanentId,
    pub card: String,
    pub types: CardTypes,
    pub tapped: bool,
    /// `None` once cleaned up at the start of a turn
    pub sickness: Option<bool>,
    pub tags: BTreeSet<String>,
    pub counters: BTreeMap<String, i32>,
}

/// Tags and counters starting with `*` only last until the next turn
fn is_temporary(name: &str) -> bool {
    name.starts_with('*')
}

impl Permanent {
    pub fn new(id: PermanentId, card: &str, types: CardTypes) -> Self {
        Permanent {
            id,
            card: card.to_string(),
            types,
            tapped: false,
            sickness: Some(false),
            tags: BTreeSet::new(),
            counters: BTreeMap::new(),
        }
    }

    pub fn with_sickness(mut self, sickness: bool) -> Self {
        self.sickness = Some(sickness);
        self
    }

    pub fn with_tapped(mut self, tapped: bool) -> Self {
        self.tapped = tapped;
        self
    }

    pub fn has_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.has_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.has_type(CardType::Land)
    }

    pub fn has_sickness(&self) -> bool {
        self.sickness == Some(true)
    }

    /// Untapped creature without summoning sickness
    pub fn can_attack(&self) -> bool {
        self.is_creature() && !self.tapped && !self.has_sickness()
    }

    pub fn counter(&self, name: &str) -> i32 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn has_counter(&self, name: &str) -> bool {
        self.counters.contains_key(name)
    }

    /// Adds (or removes, with a negative count) counters; a counter at 0 disappears
    pub fn add_counter(&mut self, name: &str, count: i32) {
        let total = self.counter(name) + count;
        if total == 0 {
            self.counters.remove(name);
        } else {
            self.counters.insert(name.to_string(), total);
        }
    }

    pub fn incr_counter(&mut self, name: &str) {
        self.add_counter(name, 1);
    }

    pub fn decr_counter(&mut self, name: &str) {
        self.add_counter(name, -1);
    }

    pub fn tag(&mut self, name: &str) {
        self.tags.insert(name.to_string());
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    /// Start-of-turn cleanup: drops temporary tags and counters, unsets sickness
    pub fn cleanup(&mut self) {
        self.tags.retain(|t| !is_temporary(t));
        self.counters.retain(|c, _| !is_temporary(c));
        self.sickness = None;
    }
}

impl fmt::Display for Permanent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tapped {
            write!(f, "(T)")?;
        }
        if self.has_sickness() {
            write!(f, "(S)")?;
        }
        write!(f, "{}", self.card)?;
        if !self.tags.is_empty() || !self.counters.is_empty() {
            let marks: Vec<String> = self
                .tags
                .iter()
                .map(|t| format!("#{}", t))
                .chain(self.counters.iter().map(|(c, n)| format!("{}: {}", c, n)))
                .collect();
            write!(f, " <{}>", marks.join(", "))?;
        }
        Ok(())
    }
}

/// Permanents in play, in the order they entered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Battlefield {
    permanents: Vector<Permanent>,
}

impl Battlefield {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.permanents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permanents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permanent> + '_ {
        self.permanents.iter()
    }

    pub fn add(&mut self, permanent: Permanent) {
        self.permanents.push_back(permanent);
    }

    pub fn get(&self, id: PermanentId) -> Option<&Permanent> {
        self.permanents.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PermanentId) -> Option<&mut Permanent> {
        self.permanents.iter_mut().find(|p| p.id == id)
    }

    pub fn remove(&mut self, id: PermanentId) -> Option<Permanent> {
        let index = self.permanents.iter().position(|p| p.id == id)?;
        Some(self.permanents.remove(index))
    }

    pub fn contains(&self, card: &str) -> bool {
        self.permanents.iter().any(|p| p.card == card)
    }

    pub fn count(&self, card: &str) -> usize {
        self.named(card).count()
    }

    pub fn named<'a>(&'a self, card: &'a str) -> impl Iterator<Item = &'a Permanent> + 'a {
        self.permanents.iter().filter(move |p| p.card == card)
    }

    pub fn find_first(&self, predicate: impl Fn(&Permanent) -> bool) -> Option<&Permanent> {
        self.permanents.iter().find(|p| predicate(p))
    }

    pub fn for_each_mut(&mut self, mut action: impl FnMut(&mut Permanent)) {
        for permanent in self.permanents.iter_mut() {
            action(permanent);
        }
    }
}

impl fmt::Display for Battlefield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let all: Vec<String> = self.permanents.iter().map(|p| p.to_string()).collect();
        write!(f, "[{}]", all.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creature(id: u32, name: &str) -> Permanent {
        Permanent::new(PermanentId(id), name, [CardType::Creature].into_iter().collect())
    }

    #[test]
    fn test_cards_remove_first_occurrence() {
        let mut hand = Cards::of(&["forest", "bolt", "forest"]);
        assert!(hand.remove("forest"));
        assert_eq!(hand, Cards::of(&["bolt", "forest"]));
        assert!(!hand.remove("mountain"));
        assert_eq!(hand.count("forest"), 1);
    }

    #[test]
    fn test_cards_top_and_bottom() {
        let mut library = Cards::of(&["a", "b"]);
        library.add_top("top");
        library.add_bottom("bottom");
        assert_eq!(library.first(), Some("top"));
        assert_eq!(library.look(2), Cards::of(&["top", "a"]));
        let drawn = library.take_top(3);
        assert_eq!(drawn, Cards::of(&["top", "a", "b"]));
        assert_eq!(library, Cards::of(&["bottom"]));
    }

    #[test]
    fn test_find_first_uses_preference_order() {
        let hand = Cards::of(&["mountain", "bolt", "forest"]);
        assert_eq!(hand.find_first(&["forest", "mountain"]), Some("forest"));
        assert_eq!(hand.find_first(&["island"]), None);
        assert_eq!(hand.find_all(&["forest", "island", "bolt"]), vec!["forest", "bolt"]);
        assert_eq!(hand.to_string(), "[mountain, bolt, forest]");
    }

    #[test]
    fn test_shuffle_keeps_cards() {
        let mut library: Cards = (0..40).map(|i| format!("card {}", i)).collect();
        let before = library.clone();
        library.shuffle(&mut GameRng::new(Some(3)));
        assert_eq!(library.len(), 40);
        assert_ne!(library, before);
        for card in before.iter() {
            assert!(library.contains(card));
        }
    }

    #[test]
    fn test_counter_removed_at_zero() {
        let mut elf = creature(1, "elf");
        elf.add_counter("+1/+1", 2);
        assert_eq!(elf.counter("+1/+1"), 2);
        elf.decr_counter("+1/+1");
        elf.decr_counter("+1/+1");
        assert!(!elf.has_counter("+1/+1"));
    }

    #[test]
    fn test_cleanup_drops_temporary_marks() {
        let mut elf = creature(1, "elf").with_sickness(true);
        elf.tag("*pumped");
        elf.tag("kicked");
        elf.incr_counter("*charge");
        elf.incr_counter("charge");
        elf.cleanup();
        assert!(elf.has_tag("kicked"));
        assert!(!elf.has_tag("*pumped"));
        assert!(elf.has_counter("charge"));
        assert!(!elf.has_counter("*charge"));
        assert_eq!(elf.sickness, None);
        assert!(elf.can_attack());
    }

    #[test]
    fn test_battlefield_clone_is_independent() {
        let mut board = Battlefield::new();
        board.add(creature(1, "elf"));
        let snapshot = board.clone();
        if let Some(elf) = board.get_mut(PermanentId(1)) {
            elf.tapped = true;
        }
        assert!(board.get(PermanentId(1)).map_or(false, |p| p.tapped));
        assert!(!snapshot.get(PermanentId(1)).map_or(true, |p| p.tapped));
    }
}
