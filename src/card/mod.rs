pub mod database;
pub mod types;

pub use database::{CardDatabase, DatabaseError};
pub use types::{CardDefinition, CardType, CardTypes};
