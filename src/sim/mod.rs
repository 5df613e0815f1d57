//! Simulation module
//!
//! Everything that happens inside a tick lives here:
//! - Entity registry with deferred spawn/death queues
//! - Floating-origin camera
//! - Rigid-body physics
//! - The concrete game entities

pub mod camera;
pub mod entities;
pub mod geometry;
pub mod physics;
pub mod registry;
pub mod scene;

pub use camera::{Camera, SubscriptionId};
pub use physics::{Body, BodyDef, BodyHandle, PhysicsWorld, Shape};
pub use registry::{Drawable, Entity, EntityId, Registry};
pub use scene::Scene;
