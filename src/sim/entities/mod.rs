//! Concrete game entities

pub mod asteroid;
pub mod asteroid_field;
pub mod clearer;
pub mod distance;
pub mod physics_stepper;
pub mod player;
pub mod trace;

pub use asteroid::Asteroid;
pub use asteroid_field::AsteroidField;
pub use clearer::SceneClearer;
pub use distance::DistanceTracker;
pub use physics_stepper::PhysicsStepper;
pub use player::Player;
pub use trace::PlayerTrace;

use std::f32::consts::TAU;

use crate::capture::Canvas;
use crate::platform::Rgb;
use crate::sim::camera::Camera;
use crate::sim::physics::{Body, Shape};

/// Outline a body's shape
pub fn draw_body(body: &Body, camera: &Camera, canvas: &mut dyn Canvas, color: Rgb) {
    match &body.shape {
        Shape::Polygon(verts) => {
            for i in 0..verts.len() {
                let a = camera.world_to_screen(body.world_point(verts[i]));
                let b = camera.world_to_screen(body.world_point(verts[(i + 1) % verts.len()]));
                canvas.line(a, b, color);
            }
        }
        Shape::Edge(a, b) => {
            let a = camera.world_to_screen(body.world_point(*a));
            let b = camera.world_to_screen(body.world_point(*b));
            canvas.line(a, b, color);
        }
        Shape::Circle(radius) => {
            let center = camera.world_to_screen(body.position);
            canvas.arc(center, camera.scale(*radius), 0.0, TAU, color);
        }
    }
}
