//! Realistic scenario benchmarks: a synthetic "game world" exercising joined iteration over a
//! mixed population, feature/event dispatch, and sparse-set churn under representative entity
//! counts.

pub mod game_world;

pub use game_world::{GameWorldConfig, GameWorldScenario};

/// Common shape every scenario benchmark follows: set up a population once, then repeatedly
/// measure one "frame" of work against it.
pub trait Scenario {
    fn name(&self) -> &'static str;
    fn entity_count(&self) -> usize;
    fn setup(&mut self);
    fn update(&mut self);
}
