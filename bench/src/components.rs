//! Component and feature-tag types shared by the micro and scenario benchmarks, sized and shaped
//! to be representative of a real game's component set rather than synthetic noise.

use rusty_ecs::Component;

/// 3D position (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 3D velocity (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Health pool (8 bytes).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// Simple AI state used by the game-world scenario to bias its movement system.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct AiState {
    pub state: u32,
    pub timer: f32,
    pub target_x: f32,
    pub target_y: f32,
}

/// A stateless tag marking an entity as a projectile. Exercises the zero-sized storage path.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Projectile;

/// Feature tag grouping the scenario's movement/AI systems.
pub struct GameplayFeature;

/// Event fired once per simulated frame.
#[derive(rusty_ecs::Event, Clone, Copy, Debug)]
pub struct Tick {
    pub dt: f32,
}
