pub mod error;
pub mod log;
pub mod mana;
pub mod planner;
pub mod sources;
pub mod state;
pub mod turns;
pub mod zones;

pub use error::GameError;
pub use log::GameLog;
pub use mana::Mana;
pub use planner::{maybe_pay, maybe_produce, plan, ProductionPlan};
pub use sources::{LandingOption, ManaSource, ManaSources};
pub use state::{Area, GameResult, GameState, Phase, Side};
pub use turns::{play_turn, run_phase};
pub use zones::{Battlefield, Cards, Permanent, PermanentId};
