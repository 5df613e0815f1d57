//! Drives the physics world

use std::any::Any;

use crate::error::SimError;
use crate::sim::Scene;
use crate::sim::registry::{Entity, EntityId};

/// Steps the physics world once per tick.
///
/// Spawned first on reset so every later entity reads post-step positions.
#[derive(Debug, Default)]
pub struct PhysicsStepper;

impl Entity for PhysicsStepper {
    fn name(&self) -> &'static str {
        "physics_stepper"
    }

    fn advance(&mut self, _id: EntityId, scene: &mut Scene, dt: f32) -> Result<(), SimError> {
        if dt > 0.0 {
            scene.physics.step(dt);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
