pub mod entity;
pub mod game;
pub mod priors;

pub use self::entity::{Entity, Position};
pub use self::game::GameContext;
pub use self::priors::{EntityPrior, PriorIndex, PriorStore, TeamPrior};
