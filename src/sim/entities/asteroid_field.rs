//! Spawns asteroids ahead of the moving camera

use std::any::Any;

use glam::Vec2;
use rand::Rng;

use super::Asteroid;
use crate::consts::SPAWN_DISTANCE;
use crate::error::SimError;
use crate::sim::Scene;
use crate::sim::registry::{Entity, EntityId};

/// Places new asteroids just outside the view, on the side the camera is
/// heading toward. Spawn chance per axis scales with camera speed on that axis.
#[derive(Debug, Default)]
pub struct AsteroidField;

impl AsteroidField {
    /// Spawn at `position` unless a live asteroid, or one already placed
    /// this tick, is too close. Accepted positions are added to `placed`.
    fn try_spawn(scene: &mut Scene, position: Vec2, placed: &mut Vec<Vec2>) -> bool {
        let radius = scene.settings.asteroid_radius;
        let min_dist_sq = radius * radius * scene.settings.asteroid_spacing;
        let too_close = |p: Vec2| (p - position).length_squared() < min_dist_sq;
        let crowded = placed.iter().any(|&p| too_close(p))
            || scene.registry.find::<Asteroid>().any(|(_, rock)| {
                scene
                    .physics
                    .body(rock.body_handle())
                    .is_some_and(|body| too_close(body.position))
            });
        if crowded {
            return false;
        }
        let rock = Asteroid::new(scene, radius, position);
        scene.spawn(rock);
        placed.push(position);
        true
    }
}

impl Entity for AsteroidField {
    fn name(&self) -> &'static str {
        "asteroid_field"
    }

    fn advance(&mut self, _id: EntityId, scene: &mut Scene, dt: f32) -> Result<(), SimError> {
        let center = scene.camera.center;
        let velocity = scene.camera.center_velocity;
        let size = scene.camera.view_size();
        let mut placed = Vec::new();

        if scene.rng.random::<f32>() < velocity.x.abs() * dt {
            let across = scene.rng.random::<f32>() * 2.0 - 1.0;
            let offset = Vec2::new(size * velocity.x.signum(), across * size);
            Self::try_spawn(scene, center + SPAWN_DISTANCE * offset, &mut placed);
        }

        if scene.rng.random::<f32>() < velocity.y.abs() * dt {
            let across = scene.rng.random::<f32>() * 2.0 - 1.0;
            let offset = Vec2::new(across * size, size * velocity.y.signum());
            Self::try_spawn(scene, center + SPAWN_DISTANCE * offset, &mut placed);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
