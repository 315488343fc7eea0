use crate::game::error::GameError;
use crate::game::mana::Mana;
use crate::game::state::{GameResult, GameState};
use crate::game::zones::PermanentId;
use std::collections::BTreeMap;
use std::fmt;

/// A land that may be played from hand and tapped right away
#[derive(Debug, Clone, PartialEq)]
pub struct LandingOption {
    pub card: String,
    pub produces: Vec<Mana>,
    pub(crate) copies: usize,
}

impl LandingOption {
    pub fn new(card: &str, produces: &[Mana]) -> Self {
        LandingOption {
            card: card.to_string(),
            produces: produces.to_vec(),
            copies: 0,
        }
    }
}

impl fmt::Display for LandingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.card)
    }
}

/// How a source turns into mana
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Tap a permanent (land or mana creature)
    Tap { id: PermanentId, card: String },
    /// Sacrifice a permanent
    Sacrifice { id: PermanentId, card: String },
    /// Discard a card from hand; `copies` is how many the plan may use
    Discard { card: String, copies: usize },
    /// Cast a spell from hand that adds mana
    Cast { card: String, copies: usize },
    /// Play one of these lands and tap it
    Landing { options: Vec<LandingOption> },
}

/// One way to get mana right now, with what it costs to activate
#[derive(Debug, Clone, PartialEq)]
pub struct ManaSource {
    pub kind: SourceKind,
    pub activation_cost: Mana,
    /// Disjoint alternatives, in preference order
    pub produces: Vec<Mana>,
}

impl ManaSource {
    pub fn new(kind: SourceKind, activation_cost: Mana, produces: &[Mana]) -> Self {
        ManaSource {
            kind,
            activation_cost,
            produces: produces.to_vec(),
        }
    }

    /// Permanent consumed by this source, if any
    pub fn permanent(&self) -> Option<PermanentId> {
        match &self.kind {
            SourceKind::Tap { id, .. } | SourceKind::Sacrifice { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Hand card consumed by this source with the number of usable copies
    pub fn hand_card(&self) -> Option<(&str, usize)> {
        match &self.kind {
            SourceKind::Discard { card, copies } | SourceKind::Cast { card, copies } => {
                Some((card.as_str(), *copies))
            }
            _ => None,
        }
    }

    /// Landing source restricted to a single option
    pub(crate) fn narrowed_to(&self, option: &LandingOption) -> ManaSource {
        ManaSource {
            kind: SourceKind::Landing {
                options: vec![option.clone()],
            },
            activation_cost: self.activation_cost,
            produces: option.produces.clone(),
        }
    }

    /// Performs the game actions that produce `mana` with this source
    pub fn commit(&self, game: &mut GameState, mana: Mana) -> GameResult<()> {
        if !self.produces.contains(&mana) {
            return Err(GameError::illegal(format!("{} can't produce {}", self, mana)));
        }
        match &self.kind {
            SourceKind::Tap { id, .. } => {
                pay_activation(game, self.activation_cost)?;
                game.tap_permanent_for_mana(*id, mana)
            }
            SourceKind::Sacrifice { id, .. } => {
                pay_activation(game, self.activation_cost)?;
                game.sacrifice_permanent(*id)?;
                game.add(mana);
                Ok(())
            }
            SourceKind::Discard { card, .. } => {
                pay_activation(game, self.activation_cost)?;
                game.discard(card)?;
                game.add(mana);
                Ok(())
            }
            SourceKind::Cast { card, .. } => {
                game.cast_instant(card, self.activation_cost)?;
                game.add(mana);
                Ok(())
            }
            SourceKind::Landing { options } => {
                let option = options
                    .iter()
                    .find(|o| o.produces.contains(&mana) && game.hand().contains(&o.card))
                    .ok_or_else(|| {
                        GameError::illegal(format!(
                            "could not produce {} with any of the lands in hand",
                            mana
                        ))
                    })?;
                pay_activation(game, self.activation_cost)?;
                let id = game.land(&option.card)?;
                game.tap_permanent_for_mana(id, mana)
            }
        }
    }
}

fn pay_activation(game: &mut GameState, cost: Mana) -> GameResult<()> {
    if cost.is_empty() {
        Ok(())
    } else {
        game.pay(cost)
    }
}

impl fmt::Display for ManaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SourceKind::Tap { card, .. } => write!(f, "tap [{}]", card),
            SourceKind::Sacrifice { card, .. } => write!(f, "sacrifice [{}]", card),
            SourceKind::Discard { card, .. } => write!(f, "discard [{}]", card),
            SourceKind::Cast { card, .. } => write!(f, "cast [{}]", card),
            SourceKind::Landing { options } => {
                let names: Vec<&str> = options.iter().map(|o| o.card.as_str()).collect();
                write!(f, "land one of [{}]", names.join(", "))
            }
        }?;
        if !self.activation_cost.is_empty() {
            write!(f, " for {}", self.activation_cost)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Tap { card: String, cost: Mana, produces: Vec<Mana> },
    Sacrifice { card: String, cost: Mana, produces: Vec<Mana> },
    Discard { card: String, cost: Mana, produces: Vec<Mana> },
    Cast { card: String, cost: Mana, produces: Vec<Mana> },
    Landing(Vec<LandingOption>),
}

/// Builds the list of mana sources available in a game, in the order the
/// planner should try them.
///
/// ```ignore
/// let sources = ManaSources::new(&game)
///     .tap("forest", Mana::ZERO, &[Mana::G])
///     .landing(&[LandingOption::new("forest", &[Mana::G])])
///     .discard("simian spirit guide", Mana::ZERO, &[Mana::R])
///     .reserve("goblin guide")
///     .build();
/// ```
pub struct ManaSources<'g> {
    game: &'g GameState,
    entries: Vec<Entry>,
    reserved: BTreeMap<String, usize>,
}

impl<'g> ManaSources<'g> {
    pub fn new(game: &'g GameState) -> Self {
        ManaSources {
            game,
            entries: Vec::new(),
            reserved: BTreeMap::new(),
        }
    }

    /// One source per untapped permanent with this name; summoning-sick creatures are skipped
    pub fn tap(mut self, card: &str, cost: Mana, produces: &[Mana]) -> Self {
        self.entries.push(Entry::Tap {
            card: card.to_string(),
            cost,
            produces: produces.to_vec(),
        });
        self
    }

    /// One source per untapped permanent with this name
    pub fn sacrifice(mut self, card: &str, cost: Mana, produces: &[Mana]) -> Self {
        self.entries.push(Entry::Sacrifice {
            card: card.to_string(),
            cost,
            produces: produces.to_vec(),
        });
        self
    }

    /// One source per copy in hand
    pub fn discard(mut self, card: &str, cost: Mana, produces: &[Mana]) -> Self {
        self.entries.push(Entry::Discard {
            card: card.to_string(),
            cost,
            produces: produces.to_vec(),
        });
        self
    }

    /// One source per copy in hand; `cost` is the spell's mana cost
    pub fn cast(mut self, card: &str, cost: Mana, produces: &[Mana]) -> Self {
        self.entries.push(Entry::Cast {
            card: card.to_string(),
            cost,
            produces: produces.to_vec(),
        });
        self
    }

    /// A single source while a land drop is left and one of the lands is in hand
    pub fn landing(mut self, options: &[LandingOption]) -> Self {
        self.entries.push(Entry::Landing(options.to_vec()));
        self
    }

    /// Holds one copy of `card` back from hand sources (e.g. the spell being paid for)
    pub fn reserve(mut self, card: &str) -> Self {
        *self.reserved.entry(card.to_string()).or_insert(0) += 1;
        self
    }

    /// Every source the card database describes, cheapest first: tapping
    /// lands, tapping creatures, landing, sacrificing, discarding, then rituals
    pub fn from_database(game: &'g GameState) -> Self {
        let cards = game.database().cards();
        let mut sources = ManaSources::new(game);
        for card in cards.iter().filter(|c| !c.produces.is_empty() && !c.is_creature()) {
            sources = sources.tap(&card.name, Mana::ZERO, &card.produces);
        }
        for card in cards.iter().filter(|c| !c.produces.is_empty() && c.is_creature()) {
            sources = sources.tap(&card.name, Mana::ZERO, &card.produces);
        }
        let lands: Vec<LandingOption> = cards
            .iter()
            .filter(|c| c.is_land() && !c.produces.is_empty() && !c.enters_tapped)
            .map(|c| LandingOption::new(&c.name, &c.produces))
            .collect();
        if !lands.is_empty() {
            sources = sources.landing(&lands);
        }
        for card in cards.iter().filter(|c| !c.sacrifice_for.is_empty()) {
            sources = sources.sacrifice(&card.name, Mana::ZERO, &card.sacrifice_for);
        }
        for card in cards.iter().filter(|c| !c.discard_for.is_empty()) {
            sources = sources.discard(&card.name, Mana::ZERO, &card.discard_for);
        }
        for card in cards.iter().filter(|c| !c.ritual.is_empty()) {
            sources = sources.cast(&card.name, card.cost, &card.ritual);
        }
        sources
    }

    fn copies_in_hand(&self, card: &str) -> usize {
        let reserved = self.reserved.get(card).copied().unwrap_or(0);
        self.game.hand().count(card).saturating_sub(reserved)
    }

    pub fn build(self) -> Vec<ManaSource> {
        let mut sources = Vec::new();
        for entry in &self.entries {
            match entry {
                Entry::Tap {
                    card,
                    cost,
                    produces,
                } => {
                    for permanent in self
                        .game
                        .battlefield()
                        .named(card)
                        .filter(|p| !p.tapped && !(p.is_creature() && p.has_sickness()))
                    {
                        sources.push(ManaSource::new(
                            SourceKind::Tap {
                                id: permanent.id,
                                card: card.clone(),
                            },
                            *cost,
                            produces,
                        ));
                    }
                }
                Entry::Sacrifice {
                    card,
                    cost,
                    produces,
                } => {
                    for permanent in self.game.battlefield().named(card).filter(|p| !p.tapped) {
                        sources.push(ManaSource::new(
                            SourceKind::Sacrifice {
                                id: permanent.id,
                                card: card.clone(),
                            },
                            *cost,
                            produces,
                        ));
                    }
                }
                Entry::Discard {
                    card,
                    cost,
                    produces,
                } => {
                    let copies = self.copies_in_hand(card);
                    for _ in 0..copies {
                        sources.push(ManaSource::new(
                            SourceKind::Discard {
                                card: card.clone(),
                                copies,
                            },
                            *cost,
                            produces,
                        ));
                    }
                }
                Entry::Cast {
                    card,
                    cost,
                    produces,
                } => {
                    let copies = self.copies_in_hand(card);
                    for _ in 0..copies {
                        sources.push(ManaSource::new(
                            SourceKind::Cast {
                                card: card.clone(),
                                copies,
                            },
                            *cost,
                            produces,
                        ));
                    }
                }
                Entry::Landing(options) => {
                    if !self.game.can_land() {
                        continue;
                    }
                    let landable: Vec<LandingOption> = options
                        .iter()
                        .filter_map(|o| {
                            let copies = self.copies_in_hand(&o.card);
                            (copies > 0).then(|| LandingOption {
                                copies,
                                ..o.clone()
                            })
                        })
                        .collect();
                    if landable.is_empty() {
                        continue;
                    }
                    let mut produces: Vec<Mana> = Vec::new();
                    for mana in landable.iter().flat_map(|o| o.produces.iter()) {
                        if !produces.contains(mana) {
                            produces.push(*mana);
                        }
                    }
                    sources.push(ManaSource {
                        kind: SourceKind::Landing { options: landable },
                        activation_cost: Mana::ZERO,
                        produces,
                    });
                }
            }
        }
        sources
    }
}
