//! Trail lines behind the ship's hull vertices

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::capture::Canvas;
use crate::consts::{TRACE_COLOR, TRACE_INTERVAL, TRACE_POINTS};
use crate::error::SimError;
use crate::platform::Rgb;
use crate::sim::Scene;
use crate::sim::camera::SubscriptionId;
use crate::sim::physics::{Body, BodyHandle};
use crate::sim::registry::{Drawable, Entity, EntityId};

type History = Rc<RefCell<[Vec2; TRACE_POINTS]>>;

/// Samples one hull vertex every `TRACE_INTERVAL` seconds and draws the
/// recent path as a polyline.
///
/// The history is in world space, so it is shared with a camera listener that
/// rebases it on every origin shift.
#[derive(Debug)]
pub struct PlayerTrace {
    body: BodyHandle,
    vertex: usize,
    history: History,
    counter: f32,
    subscription: Option<SubscriptionId>,
}

impl PlayerTrace {
    pub fn new(body: BodyHandle, vertex: usize) -> Self {
        Self {
            body,
            vertex,
            history: Rc::new(RefCell::new([Vec2::ZERO; TRACE_POINTS])),
            counter: 0.0,
            subscription: None,
        }
    }

    /// Recorded points, newest first
    pub fn history(&self) -> [Vec2; TRACE_POINTS] {
        *self.history.borrow()
    }

    /// World position of the traced vertex
    fn vertex_position(&self, body: &Body) -> Vec2 {
        match body.shape.vertices().get(self.vertex) {
            Some(&local) => body.world_point(local),
            None => body.position,
        }
    }
}

impl Entity for PlayerTrace {
    fn name(&self) -> &'static str {
        "player_trace"
    }

    fn on_admitted(&mut self, _id: EntityId, scene: &mut Scene) {
        if let Some(body) = scene.physics.body(self.body) {
            let start = self.vertex_position(&body);
            self.history.borrow_mut().fill(start);
        }
        let history = self.history.clone();
        self.subscription = Some(scene.camera.subscribe(move |shift| {
            for point in history.borrow_mut().iter_mut() {
                *point -= shift;
            }
        }));
    }

    fn advance(&mut self, _id: EntityId, scene: &mut Scene, dt: f32) -> Result<(), SimError> {
        let body = scene
            .physics
            .body(self.body)
            .ok_or(SimError::MissingBody(self.body))?;
        self.counter += dt;
        if self.counter > TRACE_INTERVAL {
            self.counter %= TRACE_INTERVAL;
            let point = self.vertex_position(&body);
            let mut history = self.history.borrow_mut();
            history.rotate_right(1);
            history[0] = point;
        }
        Ok(())
    }

    fn on_removed(&mut self, _id: EntityId, scene: &mut Scene) {
        if let Some(subscription) = self.subscription.take() {
            scene.camera.unsubscribe(subscription);
        }
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drawable for PlayerTrace {
    fn draw(&self, scene: &Scene, canvas: &mut dyn Canvas) {
        let Some(body) = scene.physics.body(self.body) else {
            return;
        };
        let camera = &scene.camera;
        let current = self.vertex_position(&body);
        let future = current + body.linear_velocity * scene.settings.future_prediction;

        let history = self.history.borrow();
        let points: Vec<Vec2> = [future, current]
            .into_iter()
            .chain(history.iter().copied())
            .map(|p| camera.world_to_screen(p))
            .collect();
        let color = Rgb::from(TRACE_COLOR);
        for pair in points.windows(2) {
            canvas.line(pair[0], pair[1], color);
        }
    }
}
