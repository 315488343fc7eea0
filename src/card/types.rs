use crate::game::mana::Mana;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Card types the simulator distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Land,
    Creature,
    Instant,
    Sorcery,
    Enchantment,
    Artifact,
}

impl CardType {
    /// Whether a card of this type stays on the battlefield once resolved
    pub fn is_permanent(&self) -> bool {
        !matches!(self, CardType::Instant | CardType::Sorcery)
    }
}

pub type CardTypes = BTreeSet<CardType>;

/// One row of the card database.
///
/// Besides the printed characteristics, a row says how the card helps the
/// pilot: which mana it makes and in what way, and how much damage it deals
/// when cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub name: String,
    pub types: CardTypes,
    #[serde(default)]
    pub cost: Mana,
    #[serde(default)]
    pub power: u32,
    /// Combat damage is dealt as poison counters
    #[serde(default)]
    pub infect: bool,
    #[serde(default)]
    pub haste: bool,
    #[serde(default)]
    pub enters_tapped: bool,
    /// Alternatives produced by tapping the permanent
    #[serde(default)]
    pub produces: Vec<Mana>,
    /// Alternatives produced by sacrificing the permanent
    #[serde(default)]
    pub sacrifice_for: Vec<Mana>,
    /// Alternatives produced by discarding the card from hand
    #[serde(default)]
    pub discard_for: Vec<Mana>,
    /// Alternatives produced by casting the card (rituals)
    #[serde(default)]
    pub ritual: Vec<Mana>,
    /// Damage dealt to the opponent when the spell resolves
    #[serde(default)]
    pub burn: u32,
}

impl CardDefinition {
    pub fn new(name: &str, types: &[CardType]) -> Self {
        CardDefinition {
            name: name.to_lowercase(),
            types: types.iter().copied().collect(),
            cost: Mana::ZERO,
            power: 0,
            infect: false,
            haste: false,
            enters_tapped: false,
            produces: Vec::new(),
            sacrifice_for: Vec::new(),
            discard_for: Vec::new(),
            ritual: Vec::new(),
            burn: 0,
        }
    }

    pub fn with_cost(mut self, cost: Mana) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_power(mut self, power: u32) -> Self {
        self.power = power;
        self
    }

    pub fn with_haste(mut self) -> Self {
        self.haste = true;
        self
    }

    pub fn with_infect(mut self) -> Self {
        self.infect = true;
        self
    }

    pub fn producing(mut self, produces: &[Mana]) -> Self {
        self.produces = produces.to_vec();
        self
    }

    pub fn sacrificed_for(mut self, produces: &[Mana]) -> Self {
        self.sacrifice_for = produces.to_vec();
        self
    }

    pub fn discarded_for(mut self, produces: &[Mana]) -> Self {
        self.discard_for = produces.to_vec();
        self
    }

    pub fn as_ritual(mut self, produces: &[Mana]) -> Self {
        self.ritual = produces.to_vec();
        self
    }

    pub fn with_burn(mut self, damage: u32) -> Self {
        self.burn = damage;
        self
    }

    pub fn has_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_land(&self) -> bool {
        self.has_type(CardType::Land)
    }

    pub fn is_creature(&self) -> bool {
        self.has_type(CardType::Creature)
    }

    pub fn is_instant(&self) -> bool {
        self.has_type(CardType::Instant)
    }

    pub fn is_permanent(&self) -> bool {
        self.types.iter().any(CardType::is_permanent)
    }
}
