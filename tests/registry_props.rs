/// Property tests for deferred spawn/death bookkeeping across a tick
use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use proptest::prelude::*;
use proptest::sample::Index;

use spacerunner::SimError;
use spacerunner::settings::Settings;
use spacerunner::sim::{Entity, EntityId, Scene};

#[derive(Default)]
struct Journal {
    advanced: HashMap<EntityId, u32>,
    removed: HashMap<EntityId, u32>,
    /// Spawned from inside an advance call
    spawned_late: Vec<EntityId>,
}

type Shared = Rc<RefCell<Journal>>;

/// Counts its own calls
struct Counter(Shared);

impl Entity for Counter {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn advance(&mut self, id: EntityId, _: &mut Scene, _: f32) -> Result<(), SimError> {
        *self.0.borrow_mut().advanced.entry(id).or_default() += 1;
        Ok(())
    }

    fn on_removed(&mut self, id: EntityId, _: &mut Scene) {
        *self.0.borrow_mut().removed.entry(id).or_default() += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Issues a scripted batch of deaths and spawns on its next advance
struct Driver {
    journal: Shared,
    script: Rc<RefCell<Option<(Vec<EntityId>, usize)>>>,
}

impl Entity for Driver {
    fn name(&self) -> &'static str {
        "driver"
    }

    fn advance(&mut self, id: EntityId, scene: &mut Scene, _: f32) -> Result<(), SimError> {
        *self.journal.borrow_mut().advanced.entry(id).or_default() += 1;
        if let Some((kills, spawns)) = self.script.borrow_mut().take() {
            for victim in kills {
                scene.queue_death(victim);
            }
            for _ in 0..spawns {
                let child = scene.spawn(Counter(self.journal.clone()));
                self.journal.borrow_mut().spawned_late.push(child);
            }
        }
        Ok(())
    }

    fn on_removed(&mut self, id: EntityId, _: &mut Scene) {
        *self.journal.borrow_mut().removed.entry(id).or_default() += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

proptest! {
    #[test]
    fn prop_tick_applies_admissions_then_deaths(
        initial in 0usize..8,
        queued in 0usize..4,
        kills in prop::collection::vec(any::<Index>(), 0..10),
        spawns in 0usize..4,
    ) {
        let journal: Shared = Rc::default();
        let script = Rc::new(RefCell::new(None));
        let mut scene = Scene::new(Settings { seed: Some(0), ..Settings::default() });

        scene.spawn(Driver { journal: journal.clone(), script: script.clone() });
        for _ in 0..initial {
            scene.spawn(Counter(journal.clone()));
        }
        scene.tick(0.1).unwrap();
        let before: Vec<EntityId> = scene.registry.ids();

        // Pending before the tick, admitted at its start
        let admitted: Vec<EntityId> = (0..queued)
            .map(|_| scene.spawn(Counter(journal.clone())))
            .collect();

        // Victims may repeat, including the driver itself
        let victims: Vec<EntityId> = kills.iter().map(|i| *i.get(&before)).collect();
        *script.borrow_mut() = Some((victims.clone(), spawns));
        let advanced_before = journal.borrow().advanced.clone();
        scene.tick(0.1).unwrap();

        let victims: BTreeSet<EntityId> = victims.into_iter().collect();
        let expected: BTreeSet<EntityId> = before
            .iter()
            .chain(admitted.iter())
            .copied()
            .filter(|id| !victims.contains(id))
            .collect();
        let live: BTreeSet<EntityId> = scene.registry.ids().into_iter().collect();
        prop_assert_eq!(live, expected);

        let journal = journal.borrow();
        for id in &victims {
            prop_assert_eq!(journal.removed.get(id), Some(&1));
        }
        for id in &admitted {
            prop_assert_eq!(journal.advanced.get(id), Some(&1));
        }
        prop_assert_eq!(journal.spawned_late.len(), spawns);
        for id in &journal.spawned_late {
            prop_assert!(!journal.advanced.contains_key(id));
            prop_assert!(!scene.registry.contains(*id));
        }
        prop_assert_eq!(scene.registry.pending_spawns(), spawns);
        // Survivors from the previous tick advanced exactly once more
        for id in before.iter().filter(|id| !victims.contains(id)) {
            prop_assert_eq!(
                journal.advanced.get(id).copied().unwrap_or(0),
                advanced_before.get(id).copied().unwrap_or(0) + 1
            );
        }
    }
}
