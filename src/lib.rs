pub mod catalog;
pub mod config;
pub mod console;
pub mod engine;
pub mod farm;
pub mod persistence;
pub mod render;
pub mod web;

pub use config::Config;
pub use engine::{Action, Engine, EngineBuilder, EngineError, Outcome};
pub use farm::{Farm, FarmError, FarmRules, GameState, PlacedCreature, TapOutcome};
pub use persistence::{FileStore, MemoryStore, PersistenceError, StateStore};
