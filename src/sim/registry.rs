//! Entity registry with deferred admission and removal
//!
//! Entities never enter or leave the live set while it is being iterated.
//! `spawn` and `queue_death` only append to FIFO queues; the tick driver in
//! `scene` flushes them at fixed points:
//! 1. admit every pending spawn
//! 2. advance the live set as it stood after step 1
//! 3. remove every entity queued for death, then notify it
//!
//! While an entity is being advanced it is taken out of its slot, so it can
//! hold `&mut Scene` and still look up every other live entity.

use std::any::Any;
use std::collections::{HashSet, VecDeque};

use crate::capture::Canvas;
use crate::error::SimError;
use crate::sim::Scene;
use crate::sim::physics::BodyHandle;

/// Identifier of a spawned entity. Never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

/// A simulated object
pub trait Entity: Any {
    /// Short name for diagnostics
    fn name(&self) -> &'static str;

    /// Advance by `dt` seconds
    fn advance(&mut self, id: EntityId, scene: &mut Scene, dt: f32) -> Result<(), SimError>;

    /// Called once, right after the entity joins the live set
    fn on_admitted(&mut self, _id: EntityId, _scene: &mut Scene) {}

    /// Called once, right after the entity has left the live set
    fn on_removed(&mut self, _id: EntityId, _scene: &mut Scene) {}

    /// Physics body owned by this entity. Removed from the world with it.
    fn body(&self) -> Option<BodyHandle> {
        None
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Entities that render themselves
pub trait Drawable {
    fn draw(&self, scene: &Scene, canvas: &mut dyn Canvas);
}

struct Slot {
    id: EntityId,
    /// `None` while the entity is being advanced or notified
    entity: Option<Box<dyn Entity>>,
}

/// The live entity set plus its spawn and death queues
#[derive(Default)]
pub struct Registry {
    live: Vec<Slot>,
    spawns: VecDeque<(EntityId, Box<dyn Entity>)>,
    deaths: VecDeque<EntityId>,
    /// Mirror of `deaths` for constant-time lookups
    dying: HashSet<EntityId>,
    next_id: u64,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("live", &self.live.len())
            .field("spawns", &self.spawns.len())
            .field("deaths", &self.deaths)
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entity for admission at the start of the next tick
    pub fn spawn(&mut self, entity: impl Entity) -> EntityId {
        self.spawn_boxed(Box::new(entity))
    }

    pub fn spawn_boxed(&mut self, entity: Box<dyn Entity>) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.spawns.push_back((id, entity));
        id
    }

    /// Queue an entity for removal at the end of the current tick.
    ///
    /// Repeated requests before the flush collapse into the first one. A
    /// request made after the entity was removed finds nothing to remove.
    pub fn queue_death(&mut self, id: EntityId) {
        if self.dying.insert(id) {
            self.deaths.push_back(id);
        }
    }

    /// Whether a death request is pending for `id`
    pub fn is_dying(&self, id: EntityId) -> bool {
        self.dying.contains(&id)
    }

    /// Whether `id` is in the live set
    pub fn contains(&self, id: EntityId) -> bool {
        self.live.iter().any(|s| s.id == id)
    }

    /// Size of the live set
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Spawns waiting for admission
    pub fn pending_spawns(&self) -> usize {
        self.spawns.len()
    }

    /// Live entity ids in admission order
    pub fn ids(&self) -> Vec<EntityId> {
        self.live.iter().map(|s| s.id).collect()
    }

    /// Live entities in admission order (skips the one currently advancing)
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &dyn Entity)> {
        self.live
            .iter()
            .filter_map(|s| s.entity.as_deref().map(|e| (s.id, e)))
    }

    pub fn get(&self, id: EntityId) -> Option<&dyn Entity> {
        self.live
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| s.entity.as_deref())
    }

    /// Live entities of concrete type `T`
    pub fn find<T: Entity>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.iter()
            .filter_map(|(id, e)| e.as_any().downcast_ref::<T>().map(|t| (id, t)))
    }

    /// First live entity of type `T`
    pub fn first<T: Entity>(&self) -> Option<(EntityId, &T)> {
        self.find::<T>().next()
    }

    /// Live entities with a draw capability
    pub fn drawables(&self) -> impl Iterator<Item = &dyn Drawable> {
        self.iter().filter_map(|(_, e)| e.as_drawable())
    }

    /// Move every pending spawn into the live set, FIFO.
    ///
    /// Returns the slot range that was admitted.
    pub(crate) fn admit_pending(&mut self) -> std::ops::Range<usize> {
        let start = self.live.len();
        while let Some((id, entity)) = self.spawns.pop_front() {
            self.live.push(Slot {
                id,
                entity: Some(entity),
            });
        }
        start..self.live.len()
    }

    /// Borrow the entity at `index` out of its slot
    pub(crate) fn take(&mut self, index: usize) -> Option<(EntityId, Box<dyn Entity>)> {
        let slot = self.live.get_mut(index)?;
        slot.entity.take().map(|e| (slot.id, e))
    }

    /// Return an entity taken with `take`
    pub(crate) fn restore(&mut self, index: usize, entity: Box<dyn Entity>) {
        if let Some(slot) = self.live.get_mut(index) {
            slot.entity = Some(entity);
        }
    }

    pub(crate) fn pop_death(&mut self) -> Option<EntityId> {
        let id = self.deaths.pop_front()?;
        self.dying.remove(&id);
        Some(id)
    }

    /// Drop `id` from the live set, preserving the order of the rest
    pub(crate) fn remove_live(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        let index = self.live.iter().position(|s| s.id == id)?;
        self.live.remove(index).entity
    }
}
