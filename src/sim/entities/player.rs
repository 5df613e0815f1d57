//! The player ship

use std::any::Any;
use std::f32::consts::TAU;

use glam::Vec2;

use super::{PlayerTrace, draw_body};
use crate::capture::Canvas;
use crate::consts::CAMERA_LEAD;
use crate::error::SimError;
use crate::platform::Rgb;
use crate::sim::Scene;
use crate::sim::physics::{BodyDef, BodyHandle};
use crate::sim::registry::{Drawable, Entity, EntityId};

/// Hull vertices tracked by trail tracers
const TRACED_VERTICES: usize = 3;

/// Triangular ship steered by thrust and torque.
///
/// The ship is the camera-authoritative entity: after steering it moves the
/// camera toward a point ahead of itself and triggers the origin shift check.
#[derive(Debug)]
pub struct Player {
    body: BodyHandle,
    traces: Vec<EntityId>,
    /// Exhaust flame length, 0 when not thrusting
    exhaust: f32,
    /// Starts at 1, the ship dies once it drops below 0
    health: f32,
}

impl Player {
    pub fn new(scene: &mut Scene) -> Self {
        let s = &scene.settings;
        let (size, angle) = (s.ship_size, s.ship_shape_angle);
        let hull = vec![
            Vec2::new(0.0, size),
            Vec2::new(angle.sin() * -size, angle.cos() * -size),
            Vec2::new((-angle).sin() * -size, (-angle).cos() * -size),
        ];

        let mut def = BodyDef::polygon(hull, Vec2::ZERO);
        def.angular_damping = s.ship_angular_damping;
        def.restitution = s.object_restitution;
        def.report_impacts = true;

        Self {
            body: scene.physics.create_body(def),
            traces: Vec::new(),
            exhaust: 0.0,
            health: 1.0,
        }
    }

    pub fn body_handle(&self) -> BodyHandle {
        self.body
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn is_thrusting(&self) -> bool {
        self.exhaust > 0.0
    }

    fn steer(&mut self, scene: &mut Scene) -> Result<(), SimError> {
        let input = &scene.input;
        let s = &scene.settings;
        let thrusting = input.is_pressed(s.key_thrust);
        let turn_right = input.is_pressed(s.key_turn_right);
        let turn_left = input.is_pressed(s.key_turn_left);
        let (thrust, torque) = (s.ship_thrust, s.ship_torque);

        let body = scene
            .physics
            .body(self.body)
            .ok_or(SimError::MissingBody(self.body))?;
        if thrusting {
            let force = body.world_vector(Vec2::new(0.0, thrust));
            scene.physics.apply_force(self.body, force);
            self.exhaust = 1.0;
        } else {
            self.exhaust = 0.0;
        }
        if turn_right {
            scene.physics.apply_torque(self.body, torque);
        }
        if turn_left {
            scene.physics.apply_torque(self.body, -torque);
        }
        Ok(())
    }
}

impl Entity for Player {
    fn name(&self) -> &'static str {
        "player"
    }

    fn on_admitted(&mut self, _id: EntityId, scene: &mut Scene) {
        for vertex in 0..TRACED_VERTICES {
            let trace = scene.spawn(PlayerTrace::new(self.body, vertex));
            self.traces.push(trace);
        }
    }

    fn advance(&mut self, id: EntityId, scene: &mut Scene, dt: f32) -> Result<(), SimError> {
        let ship_health = scene.settings.ship_health;
        for impulse in scene.physics.take_impacts(self.body) {
            self.health -= impulse * impulse / ship_health;
        }
        if self.health < 0.0 {
            log::info!("Ship destroyed");
            scene.queue_death(id);
            return Ok(());
        }
        if dt <= 0.0 {
            return Ok(());
        }

        self.steer(scene)?;

        let body = scene
            .physics
            .body(self.body)
            .ok_or(SimError::MissingBody(self.body))?;
        let target = body.position + body.linear_velocity * CAMERA_LEAD;
        scene.camera.track(target, dt);
        if !scene.camera.center.is_finite() {
            return Err(SimError::NonFiniteCamera);
        }
        scene.shift_origin_if_needed();
        Ok(())
    }

    fn on_removed(&mut self, _id: EntityId, scene: &mut Scene) {
        for trace in self.traces.drain(..) {
            scene.queue_death(trace);
        }
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

impl Drawable for Player {
    fn draw(&self, scene: &Scene, canvas: &mut dyn Canvas) {
        let Some(body) = scene.physics.body(self.body) else {
            return;
        };
        let camera = &scene.camera;

        if self.exhaust > 0.0 {
            let size = scene.settings.ship_size;
            let angle = scene.settings.ship_shape_angle / 2.0;
            let flame = [
                Vec2::new(angle.sin() * -size, angle.cos() * -size),
                Vec2::new((-angle).sin() * -size, (-angle).cos() * -size),
                Vec2::new(0.0, -size - size * self.exhaust),
            ]
            .map(|p| camera.world_to_screen(body.world_point(p)));
            for i in 0..flame.len() {
                canvas.line(flame[i], flame[(i + 1) % flame.len()], Rgb::RED);
            }
        }

        draw_body(&body, camera, canvas, Rgb::YELLOW);
        canvas.arc(
            Vec2::new(50.0, 50.0),
            50.0,
            0.0,
            self.health * TAU,
            Rgb::RED,
        );
    }
}
