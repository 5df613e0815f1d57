//! Run distance bookkeeping

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use glam::DVec2;

use super::Player;
use crate::error::SimError;
use crate::sim::Scene;
use crate::sim::camera::SubscriptionId;
use crate::sim::registry::{Entity, EntityId};

/// Tracks how far the ship has flown from where the run started.
///
/// Accumulated origin shifts are kept in `f64` so the absolute position stays
/// accurate long after the `f32` world coordinates have been rebased.
#[derive(Debug, Default)]
pub struct DistanceTracker {
    shifted: Rc<Cell<DVec2>>,
    subscription: Option<SubscriptionId>,
    position: DVec2,
    distance: f64,
    time: f64,
}

impl DistanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Straight-line distance from the start
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Seconds the ship has been alive
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Absolute ship position
    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn speed(&self) -> f64 {
        if self.time > 0.0 {
            self.distance / self.time
        } else {
            0.0
        }
    }

    /// Short `distance@speed` tag used to name saved captures
    pub fn describe(&self) -> String {
        format!("{:.2}@{:.2}", self.distance, self.speed())
    }
}

impl Entity for DistanceTracker {
    fn name(&self) -> &'static str {
        "distance_tracker"
    }

    fn on_admitted(&mut self, _id: EntityId, scene: &mut Scene) {
        let shifted = self.shifted.clone();
        self.subscription = Some(
            scene
                .camera
                .subscribe(move |shift| shifted.set(shifted.get() + shift.as_dvec2())),
        );
    }

    fn advance(&mut self, _id: EntityId, scene: &mut Scene, dt: f32) -> Result<(), SimError> {
        let Some((_, player)) = scene.registry.first::<Player>() else {
            return Ok(());
        };
        let Some(body) = scene.physics.body(player.body_handle()) else {
            return Ok(());
        };
        self.position = body.position.as_dvec2() + self.shifted.get();
        self.distance = self.position.length();
        self.time += f64::from(dt);
        Ok(())
    }

    fn on_removed(&mut self, _id: EntityId, scene: &mut Scene) {
        if let Some(subscription) = self.subscription.take() {
            scene.camera.unsubscribe(subscription);
        }
        log::info!(
            "Run over: distance {:.2}, time {:.2}s, speed {:.2}",
            self.distance,
            self.time,
            self.speed()
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
