//! A mixed-archetype game world: NPCs (position, velocity, AI, health), static scenery
//! (position only), and projectiles (position, velocity, the zero-sized `Projectile` tag).
//!
//! Grounded in the reference engine's own `bench::scenarios::game_world` shape (entity mix,
//! `ChaCha8Rng` seeding for reproducibility) but driven through this crate's
//! `Registry`/`Aspect`/`Feature` surface rather than the teacher's archetype `World`/`Query`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use rusty_ecs::Registry;
use rusty_ecs::aspect::Aspect;
use rusty_ecs::feature::System;

use crate::components::{AiState, GameplayFeature, Health, Position, Projectile, Tick, Velocity};
use crate::scenarios::Scenario;

#[derive(Debug, Clone, Copy)]
pub struct GameWorldConfig {
    pub npc_count: usize,
    pub scenery_count: usize,
    pub projectile_count: usize,
    pub seed: u64,
}

impl Default for GameWorldConfig {
    fn default() -> Self {
        Self {
            npc_count: 8_000,
            scenery_count: 1_500,
            projectile_count: 500,
            seed: 7,
        }
    }
}

pub struct GameWorldScenario {
    config: GameWorldConfig,
    registry: Registry,
}

impl GameWorldScenario {
    pub fn new() -> Self {
        Self::with_config(GameWorldConfig::default())
    }

    pub fn with_config(config: GameWorldConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
        }
    }
}

impl Default for GameWorldScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for GameWorldScenario {
    fn name(&self) -> &'static str {
        "game_world"
    }

    fn entity_count(&self) -> usize {
        self.config.npc_count + self.config.scenery_count + self.config.projectile_count
    }

    fn setup(&mut self) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        for _ in 0..self.config.npc_count {
            self.registry
                .fill_entity()
                .component(Position {
                    x: rng.gen_range(-500.0..500.0),
                    y: rng.gen_range(-500.0..500.0),
                    z: 0.0,
                })
                .component(Velocity::default())
                .component(AiState {
                    state: 0,
                    timer: rng.gen_range(0.5..2.0),
                    target_x: rng.gen_range(-500.0..500.0),
                    target_y: rng.gen_range(-500.0..500.0),
                })
                .component(Health {
                    current: 100.0,
                    max: 100.0,
                })
                .build();
        }

        for _ in 0..self.config.scenery_count {
            self.registry
                .fill_entity()
                .component(Position {
                    x: rng.gen_range(-500.0..500.0),
                    y: rng.gen_range(-500.0..500.0),
                    z: 0.0,
                })
                .build();
        }

        for _ in 0..self.config.projectile_count {
            self.registry
                .fill_entity()
                .component(Position::default())
                .component(Velocity {
                    x: rng.gen_range(-20.0..20.0),
                    y: rng.gen_range(-20.0..20.0),
                    z: 0.0,
                })
                .component(Projectile)
                .build();
        }

        self.registry.fill().feature::<GameplayFeature>().system::<GameplayFeature>(
            System::builder()
                .handles::<Tick>(|registry, tick| {
                    Aspect::<(Position, AiState, Velocity)>::for_joined_components(
                        registry,
                        |entity, (_pos, mut ai, _vel)| {
                            ai.timer -= tick.dt;
                            entity.component::<AiState>().assign(ai);
                        },
                        rusty_ecs::option::Always,
                    );
                })
                .build(),
        );
    }

    fn update(&mut self) {
        self.registry.process_event(&Tick { dt: 1.0 / 60.0 });

        Aspect::<(Position, Velocity)>::for_joined_components(
            &self.registry,
            |_, (pos, vel)| {
                let _ = (pos.x + vel.x, pos.y + vel.y, pos.z + vel.z);
            },
            rusty_ecs::option::Always,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_populates_the_configured_entity_mix() {
        // Given
        let mut scenario = GameWorldScenario::with_config(GameWorldConfig {
            npc_count: 10,
            scenery_count: 5,
            projectile_count: 2,
            seed: 1,
        });

        // When
        scenario.setup();

        // Then
        assert_eq!(scenario.entity_count(), 17);
        assert_eq!(scenario.registry.component_count::<AiState>(), 10);
        assert_eq!(scenario.registry.component_count::<Projectile>(), 2);
    }

    #[test]
    fn update_runs_without_panicking_over_several_frames() {
        // Given
        let mut scenario = GameWorldScenario::with_config(GameWorldConfig {
            npc_count: 20,
            scenery_count: 5,
            projectile_count: 5,
            seed: 2,
        });
        scenario.setup();

        // When / Then
        for _ in 0..5 {
            scenario.update();
        }
    }
}
