//! Randomly shaped drifting rocks

use std::any::Any;

use glam::Vec2;
use rand::Rng;

use super::draw_body;
use crate::capture::Canvas;
use crate::consts::DESPAWN_DISTANCE;
use crate::error::SimError;
use crate::platform::Rgb;
use crate::sim::Scene;
use crate::sim::physics::{BodyDef, BodyHandle};
use crate::sim::registry::{Drawable, Entity, EntityId};

/// A convex rock body
#[derive(Debug)]
pub struct Asteroid {
    body: BodyHandle,
    radius: f32,
}

impl Asteroid {
    /// Create an asteroid body around `position` with a randomised size
    /// and outline
    pub fn new(scene: &mut Scene, base_radius: f32, position: Vec2) -> Self {
        let s = &scene.settings;
        let rng = &mut scene.rng;

        let radius = (s.asteroid_size_variety * (rng.random::<f32>() - 0.5)).exp() * base_radius;
        let count = rng.random_range(s.asteroid_min_verts..s.asteroid_max_verts);
        let mut points = Vec::with_capacity(count as usize);
        while points.len() < count as usize {
            let p = Vec2::new(
                (rng.random::<f32>() * 2.0 - 1.0) * radius,
                (rng.random::<f32>() * 2.0 - 1.0) * radius,
            );
            if p.length_squared() <= radius * radius {
                points.push(p);
            }
        }

        let mut def = BodyDef::polygon(points, position);
        def.restitution = s.object_restitution;
        if s.asteroid_initial_vel > 0.0 {
            let dir = loop {
                let v = Vec2::new(
                    rng.random::<f32>() * 2.0 - 1.0,
                    rng.random::<f32>() * 2.0 - 1.0,
                );
                if v.length_squared() <= 1.0 {
                    break v;
                }
            };
            def.linear_velocity = dir * s.asteroid_initial_vel;
        }
        if s.asteroid_initial_rot > 0.0 {
            let u = rng.random::<f32>();
            def.angular_velocity = u * u * s.asteroid_initial_rot;
        }

        let body = scene.physics.create_body(def);
        Self { body, radius }
    }

    pub fn body_handle(&self) -> BodyHandle {
        self.body
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Entity for Asteroid {
    fn name(&self) -> &'static str {
        "asteroid"
    }

    fn advance(&mut self, id: EntityId, scene: &mut Scene, _dt: f32) -> Result<(), SimError> {
        let body = scene
            .physics
            .body(self.body)
            .ok_or(SimError::MissingBody(self.body))?;
        let reach = scene.camera.fixed_size() * DESPAWN_DISTANCE;
        let offset = (body.position - scene.camera.center) / reach;
        if offset.x.abs() > 1.0 || offset.y.abs() > 1.0 {
            scene.queue_death(id);
        }
        Ok(())
    }

    fn body(&self) -> Option<BodyHandle> {
        Some(self.body)
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drawable for Asteroid {
    fn draw(&self, scene: &Scene, canvas: &mut dyn Canvas) {
        if let Some(body) = scene.physics.body(self.body) {
            draw_body(&body, &scene.camera, canvas, Rgb::WHITE);
        }
    }
}
