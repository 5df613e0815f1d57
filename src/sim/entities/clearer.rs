//! Marker that clears the whole scene

use std::any::Any;

use crate::error::SimError;
use crate::sim::Scene;
use crate::sim::registry::{Entity, EntityId};

/// Queues every live entity for death, itself included
#[derive(Debug, Default)]
pub struct SceneClearer;

impl Entity for SceneClearer {
    fn name(&self) -> &'static str {
        "scene_clearer"
    }

    fn advance(&mut self, id: EntityId, scene: &mut Scene, _dt: f32) -> Result<(), SimError> {
        for other in scene.registry.ids() {
            scene.queue_death(other);
        }
        // Our own slot is empty while we advance, but the id is still live
        scene.queue_death(id);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
