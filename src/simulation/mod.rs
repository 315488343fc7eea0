pub mod aggro;
pub mod deck;
pub mod engine;
pub mod hand;
pub mod pilot;
pub mod seer;
pub mod stats;

pub use aggro::AggroPilot;
pub use deck::{Deck, DeckError};
pub use engine::{run_game, simulate, GameRecord, Outcome, SimulationError, SimulatorConfig, Start};
pub use hand::select_opening_hand;
pub use pilot::{default_win_check, Pilot, SpellsPlayer};
pub use seer::{find_route_to_victory, VictoryRoute};
pub use stats::{DeckReport, DeckStats, SimulationReport, Summary};
