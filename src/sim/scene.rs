//! Simulation context and tick driver
//!
//! `Scene` owns everything a tick touches: the entity registry, the camera,
//! the physics world, held keys, settings and the RNG. It is passed to every
//! entity call instead of living in a global.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::camera::Camera;
use super::entities::{AsteroidField, DistanceTracker, PhysicsStepper, Player, SceneClearer};
use super::physics::PhysicsWorld;
use super::registry::{Entity, EntityId, Registry};
use crate::error::SimError;
use crate::platform::InputState;
use crate::settings::Settings;

/// Complete simulation state
#[derive(Debug)]
pub struct Scene {
    pub registry: Registry,
    pub camera: Camera,
    pub physics: PhysicsWorld,
    pub input: InputState,
    pub settings: Settings,
    pub rng: Pcg32,
    /// Seed the RNG was created from
    pub seed: u64,
}

impl Scene {
    /// Empty scene. Call `reset` to populate it.
    pub fn new(settings: Settings) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        log::info!("Scene seed: {seed}");
        Self {
            registry: Registry::new(),
            camera: Camera::new(settings.screen_size, settings.origin_shift_threshold),
            physics: PhysicsWorld::new(),
            input: InputState::default(),
            rng: Pcg32::seed_from_u64(seed),
            seed,
            settings,
        }
    }

    pub fn spawn(&mut self, entity: impl Entity) -> EntityId {
        self.registry.spawn(entity)
    }

    pub fn queue_death(&mut self, id: EntityId) {
        self.registry.queue_death(id);
    }

    /// Run one simulation step
    pub fn tick(&mut self, dt: f32) -> Result<(), SimError> {
        let admitted = self.registry.admit_pending();
        for index in admitted {
            if let Some((id, mut entity)) = self.registry.take(index) {
                entity.on_admitted(id, self);
                self.registry.restore(index, entity);
            }
        }

        // Snapshot of the live set: anything admitted from here on waits
        // for the next tick.
        let count = self.registry.len();
        for index in 0..count {
            let Some((id, mut entity)) = self.registry.take(index) else {
                continue;
            };
            if self.registry.is_dying(id) {
                self.registry.restore(index, entity);
                continue;
            }
            let result = entity.advance(id, self, dt);
            self.registry.restore(index, entity);
            result?;
        }

        self.flush_deaths();
        Ok(())
    }

    /// Remove and notify everything queued for death, including deaths
    /// requested by the notifications themselves
    fn flush_deaths(&mut self) {
        while let Some(id) = self.registry.pop_death() {
            let Some(mut entity) = self.registry.remove_live(id) else {
                continue;
            };
            entity.on_removed(id, self);
            if let Some(body) = entity.body() {
                self.physics.remove_body(body);
            }
        }
    }

    /// Rebase the world on the camera if it has drifted past the threshold.
    ///
    /// The camera listeners and the physics world receive the same delta.
    pub fn shift_origin_if_needed(&mut self) -> Option<Vec2> {
        let shift = self.camera.maybe_shift_origin()?;
        self.physics.shift_origin(shift);
        Some(shift)
    }

    /// Clear every entity and start a new run
    pub fn reset(&mut self) -> Result<(), SimError> {
        self.spawn(SceneClearer);
        self.tick(0.0)?;
        let remaining = self.registry.len() + self.registry.pending_spawns();
        if remaining != 0 {
            let names: Vec<&str> = self.registry.iter().map(|(_, e)| e.name()).collect();
            log::error!("Reset left entities alive: {names:?}");
            return Err(SimError::ResetIncomplete { remaining });
        }
        log::debug!("Scene cleared, {} bodies left in physics", self.physics.len());

        self.camera.reset_session();
        self.spawn(PhysicsStepper);
        self.spawn(AsteroidField);
        self.spawn(DistanceTracker::new());
        let player = Player::new(self);
        self.spawn(player);
        self.tick(0.0)?;
        log::debug!("Scene reset with {} entities", self.registry.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    type Action = Box<dyn FnMut(EntityId, &mut Scene)>;

    /// Records every call it receives and optionally runs a scripted action
    struct Probe {
        label: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        action: Option<Action>,
    }

    impl Probe {
        fn new(label: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                label,
                log: log.clone(),
                action: None,
            }
        }

        fn with_action(mut self, action: impl FnMut(EntityId, &mut Scene) + 'static) -> Self {
            self.action = Some(Box::new(action));
            self
        }
    }

    impl Entity for Probe {
        fn name(&self) -> &'static str {
            self.label
        }

        fn advance(&mut self, id: EntityId, scene: &mut Scene, _dt: f32) -> Result<(), SimError> {
            self.log.borrow_mut().push(format!("advance {}", self.label));
            if let Some(action) = self.action.as_mut() {
                action(id, scene);
            }
            Ok(())
        }

        fn on_removed(&mut self, _id: EntityId, _scene: &mut Scene) {
            self.log.borrow_mut().push(format!("removed {}", self.label));
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn scene() -> Scene {
        Scene::new(Settings {
            seed: Some(7),
            ..Settings::default()
        })
    }

    fn count(log: &Rc<RefCell<Vec<String>>>, entry: &str) -> usize {
        log.borrow().iter().filter(|e| *e == entry).count()
    }

    #[test]
    fn test_kill_two_inside_another_advance() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scene = scene();
        let ids: Rc<RefCell<HashMap<&str, EntityId>>> = Rc::default();

        let a = scene.spawn(Probe::new("A", &log));
        let id_map = ids.clone();
        let b = scene.spawn(Probe::new("B", &log).with_action(move |_, scene| {
            let map = id_map.borrow();
            if let (Some(a), Some(c)) = (map.get("A"), map.get("C")) {
                scene.queue_death(*a);
                scene.queue_death(*c);
            }
        }));
        let c = scene.spawn(Probe::new("C", &log));

        scene.tick(0.1).unwrap();
        assert_eq!(scene.registry.ids(), vec![a, b, c]);

        ids.borrow_mut().insert("A", a);
        ids.borrow_mut().insert("C", c);
        scene.tick(0.1).unwrap();

        assert_eq!(scene.registry.ids(), vec![b]);
        assert_eq!(count(&log, "removed A"), 1);
        assert_eq!(count(&log, "removed C"), 1);
        // C was queued before its turn in the second tick, so it was skipped
        assert_eq!(count(&log, "advance C"), 1);
        assert_eq!(count(&log, "advance A"), 2);
    }

    #[test]
    fn test_spawned_during_advance_waits_a_tick() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scene = scene();
        let child_log = log.clone();
        let mut spawned = false;
        scene.spawn(Probe::new("parent", &log).with_action(move |_, scene| {
            if !spawned {
                spawned = true;
                scene.spawn(Probe::new("child", &child_log));
            }
        }));

        scene.tick(0.1).unwrap();
        assert_eq!(scene.registry.len(), 1);
        assert_eq!(count(&log, "advance child"), 0);

        scene.tick(0.1).unwrap();
        assert_eq!(scene.registry.len(), 2);
        assert_eq!(count(&log, "advance child"), 1);
    }

    #[test]
    fn test_double_death_request_notifies_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scene = scene();
        let a = scene.spawn(Probe::new("A", &log));
        scene.tick(0.1).unwrap();

        scene.queue_death(a);
        scene.queue_death(a);
        scene.tick(0.1).unwrap();
        assert_eq!(count(&log, "removed A"), 1);

        // A stale request after removal is a no-op
        scene.queue_death(a);
        scene.tick(0.1).unwrap();
        assert_eq!(count(&log, "removed A"), 1);
        assert!(scene.registry.is_empty());
    }

    #[test]
    fn test_self_kill_still_completes_own_advance() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scene = scene();
        scene.spawn(Probe::new("A", &log).with_action(|id, scene| scene.queue_death(id)));
        scene.tick(0.1).unwrap();
        assert!(scene.registry.is_empty());
        assert_eq!(*log.borrow(), vec!["advance A", "removed A"]);
    }

    #[test]
    fn test_entity_is_absent_when_notified() {
        struct Witness {
            seen_self: Rc<RefCell<Option<bool>>>,
        }
        impl Entity for Witness {
            fn name(&self) -> &'static str {
                "witness"
            }
            fn advance(&mut self, id: EntityId, scene: &mut Scene, _: f32) -> Result<(), SimError> {
                scene.queue_death(id);
                Ok(())
            }
            fn on_removed(&mut self, id: EntityId, scene: &mut Scene) {
                *self.seen_self.borrow_mut() = Some(scene.registry.contains(id));
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let seen = Rc::new(RefCell::new(None));
        let mut scene = scene();
        scene.spawn(Witness {
            seen_self: seen.clone(),
        });
        scene.tick(0.0).unwrap();
        assert_eq!(*seen.borrow(), Some(false));
    }

    #[test]
    fn test_reset_populates_and_clears() {
        let mut scene = scene();
        scene.reset().unwrap();
        assert_eq!(scene.registry.len(), 4);
        assert!(scene.registry.first::<Player>().is_some());
        // Player admits its trail tracers on the next tick
        scene.tick(0.0).unwrap();
        assert_eq!(scene.registry.len(), 7);
        let bodies = scene.physics.len();
        assert_eq!(bodies, 1);

        scene.reset().unwrap();
        assert_eq!(scene.registry.len(), 4);
        assert_eq!(scene.physics.len(), 1);
    }

    #[test]
    fn test_reset_fails_on_resurrection() {
        struct Phoenix;
        impl Entity for Phoenix {
            fn name(&self) -> &'static str {
                "phoenix"
            }
            fn advance(&mut self, _: EntityId, _: &mut Scene, _: f32) -> Result<(), SimError> {
                Ok(())
            }
            fn on_removed(&mut self, _: EntityId, scene: &mut Scene) {
                scene.spawn(Phoenix);
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let mut scene = scene();
        scene.spawn(Phoenix);
        scene.tick(0.0).unwrap();
        assert!(matches!(
            scene.reset(),
            Err(SimError::ResetIncomplete { remaining: 1 })
        ));
    }

    #[test]
    fn test_origin_shift_moves_physics_with_camera() {
        use crate::sim::physics::BodyDef;

        let mut scene = scene();
        let body = scene.physics.create_body(BodyDef::edge(
            Vec2::ZERO,
            Vec2::X,
            Vec2::new(200.0, 0.0),
        ));
        scene.camera.center = Vec2::new(150.0, 0.0);
        assert_eq!(scene.shift_origin_if_needed(), Some(Vec2::new(150.0, 0.0)));
        assert_eq!(scene.physics.body(body).unwrap().position, Vec2::new(50.0, 0.0));
        assert_eq!(scene.shift_origin_if_needed(), None);
    }
}
