//! Rigid-body world on top of Rapier
//!
//! The rest of the simulation only needs a narrow contract:
//! - `create_body` / `remove_body`
//! - body position, velocity, forces and torques
//! - `step(dt)` and `shift_origin(delta)`
//! - impact impulses for bodies that ask for them
//!
//! Bodies are read back as `Body` snapshots in glam types, so callers never
//! touch nalgebra.

use std::collections::HashMap;
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::prelude::*;

use crate::rotate;

/// Stable handle to a body in a `PhysicsWorld`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

/// Collision shape in body-local coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Convex polygon, counter-clockwise
    Polygon(Vec<Vec2>),
    /// Two-sided line segment (always static)
    Edge(Vec2, Vec2),
    /// Stand-in for point sets with no area
    Circle(f32),
}

impl Shape {
    /// Vertices in body-local space (none for a circle)
    pub fn vertices(&self) -> Vec<Vec2> {
        match self {
            Shape::Polygon(v) => v.clone(),
            Shape::Edge(a, b) => vec![*a, *b],
            Shape::Circle(_) => Vec::new(),
        }
    }
}

/// Parameters for a new body
#[derive(Debug, Clone)]
pub struct BodyDef {
    pub shape: Shape,
    pub position: Vec2,
    pub angle: f32,
    /// Zero or less makes the body static
    pub density: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    /// Record impact impulses for `take_impacts`
    pub report_impacts: bool,
}

impl BodyDef {
    /// Polygon body from any point set, reduced to its convex hull
    pub fn polygon(points: Vec<Vec2>, position: Vec2) -> Self {
        Self::new(Shape::Polygon(points), position)
    }

    pub fn edge(a: Vec2, b: Vec2, position: Vec2) -> Self {
        Self::new(Shape::Edge(a, b), position)
    }

    fn new(shape: Shape, position: Vec2) -> Self {
        Self {
            shape,
            position,
            angle: 0.0,
            density: 1.0,
            restitution: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            report_impacts: false,
        }
    }

    fn is_static(&self) -> bool {
        self.density <= 0.0 || matches!(self.shape, Shape::Edge(..))
    }

    fn collider(&self) -> ColliderBuilder {
        let builder = match &self.shape {
            Shape::Polygon(points) => {
                let points: Vec<Point<Real>> = points.iter().map(|p| point![p.x, p.y]).collect();
                ColliderBuilder::convex_hull(&points).unwrap_or_else(|| {
                    let radius = points.iter().map(|p| p.coords.norm()).fold(0.0, f32::max);
                    log::warn!("Degenerate polygon, using a circle of radius {radius}");
                    ColliderBuilder::ball(radius.max(f32::EPSILON))
                })
            }
            Shape::Edge(a, b) => ColliderBuilder::segment(point![a.x, a.y], point![b.x, b.y]),
            Shape::Circle(radius) => ColliderBuilder::ball(*radius),
        };
        let builder = builder
            .density(self.density.max(0.0))
            .restitution(self.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max);
        if self.report_impacts {
            builder
                .active_events(ActiveEvents::CONTACT_FORCE_EVENTS)
                .contact_force_event_threshold(0.0)
        } else {
            builder
        }
    }
}

/// Snapshot of a body's state
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub shape: Shape,
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub is_dynamic: bool,
}

impl Body {
    /// Local point to world space
    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.position + rotate(local, self.angle)
    }

    /// Local direction to world space
    pub fn world_vector(&self, local: Vec2) -> Vec2 {
        rotate(local, self.angle)
    }
}

/// Collects contact force events raised during a step
#[derive(Default)]
struct ImpactCollector {
    contacts: Mutex<Vec<(ColliderHandle, ColliderHandle, f32)>>,
}

impl ImpactCollector {
    fn drain(&self) -> Vec<(ColliderHandle, ColliderHandle, f32)> {
        self.contacts
            .lock()
            .map(|mut c| std::mem::take(&mut *c))
            .unwrap_or_default()
    }
}

impl EventHandler for ImpactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
    }

    fn handle_contact_force_event(
        &self,
        dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        contact_pair: &ContactPair,
        total_force_magnitude: Real,
    ) {
        if let Ok(mut contacts) = self.contacts.lock() {
            // Back from force to the impulse applied over the step
            contacts.push((
                contact_pair.collider1,
                contact_pair.collider2,
                total_force_magnitude * dt,
            ));
        }
    }
}

/// Owner of every body in a simulation
pub struct PhysicsWorld {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collector: ImpactCollector,
    /// Impulses per reporting body since its last `take_impacts`
    impacts: HashMap<BodyHandle, Vec<f32>>,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("bodies", &self.rigid_body_set.len())
            .field("colliders", &self.collider_set.len())
            .finish()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Empty world without gravity
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, 0.0],
            integration_params: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collector: ImpactCollector::default(),
            impacts: HashMap::new(),
        }
    }

    pub fn create_body(&mut self, def: BodyDef) -> BodyHandle {
        let builder = if def.is_static() {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
                .linvel(to_vector(def.linear_velocity))
                .angvel(def.angular_velocity)
                .linear_damping(def.linear_damping)
                .angular_damping(def.angular_damping)
        };
        let rigid_body = builder
            .translation(to_vector(def.position))
            .rotation(def.angle)
            .build();
        let rb_handle = self.rigid_body_set.insert(rigid_body);
        self.collider_set
            .insert_with_parent(def.collider().build(), rb_handle, &mut self.rigid_body_set);

        let handle = BodyHandle(rb_handle);
        if def.report_impacts {
            self.impacts.insert(handle, Vec::new());
        }
        handle
    }

    /// Remove a body and its collider. Returns whether it existed.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.impacts.remove(&handle);
        self.rigid_body_set
            .remove(
                handle.0,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    pub fn body(&self, handle: BodyHandle) -> Option<Body> {
        let rb = self.rigid_body_set.get(handle.0)?;
        let shape = rb
            .colliders()
            .first()
            .and_then(|&h| self.collider_set.get(h))
            .map(|c| read_shape(c.shape()))
            .unwrap_or(Shape::Polygon(Vec::new()));
        Some(Body {
            shape,
            position: to_vec2(rb.translation()),
            angle: rb.rotation().angle(),
            linear_velocity: to_vec2(rb.linvel()),
            angular_velocity: rb.angvel(),
            is_dynamic: rb.is_dynamic(),
        })
    }

    pub fn len(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a world-space force for the next step
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(rb) = self.rigid_body_set.get_mut(handle.0) {
            rb.add_force(to_vector(force), true);
        }
    }

    /// Add a torque for the next step
    pub fn apply_torque(&mut self, handle: BodyHandle, torque: f32) {
        if let Some(rb) = self.rigid_body_set.get_mut(handle.0) {
            rb.add_torque(torque, true);
        }
    }

    /// Teleport a body, keeping its velocity
    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) {
        if let Some(rb) = self.rigid_body_set.get_mut(handle.0) {
            rb.set_translation(to_vector(position), true);
        }
    }

    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(rb) = self.rigid_body_set.get_mut(handle.0) {
            rb.set_linvel(to_vector(velocity), true);
        }
    }

    /// Drain the impulses recorded for `handle` since the last call
    pub fn take_impacts(&mut self, handle: BodyHandle) -> Vec<f32> {
        self.impacts
            .get_mut(&handle)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Move every body by `-delta`
    pub fn shift_origin(&mut self, delta: Vec2) {
        let delta = to_vector(delta);
        for (_, rb) in self.rigid_body_set.iter_mut() {
            let translation = rb.translation() - delta;
            rb.set_translation(translation, false);
        }
    }

    /// Advance dynamics by `dt` seconds. Non-positive `dt` does nothing.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.integration_params.dt = dt;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &self.collector,
        );

        // Forces and torques only last one step
        for (_, rb) in self.rigid_body_set.iter_mut() {
            rb.reset_forces(false);
            rb.reset_torques(false);
        }

        for (c1, c2, impulse) in self.collector.drain() {
            for collider in [c1, c2] {
                let Some(parent) = self.collider_set.get(collider).and_then(|c| c.parent()) else {
                    continue;
                };
                if let Some(impacts) = self.impacts.get_mut(&BodyHandle(parent)) {
                    impacts.push(impulse);
                }
            }
        }
    }
}

fn read_shape(shape: &dyn rapier2d::parry::shape::Shape) -> Shape {
    if let Some(polygon) = shape.as_convex_polygon() {
        Shape::Polygon(polygon.points().iter().map(|p| Vec2::new(p.x, p.y)).collect())
    } else if let Some(segment) = shape.as_segment() {
        Shape::Edge(
            Vec2::new(segment.a.x, segment.a.y),
            Vec2::new(segment.b.x, segment.b.y),
        )
    } else if let Some(ball) = shape.as_ball() {
        Shape::Circle(ball.radius)
    } else {
        Shape::Polygon(Vec::new())
    }
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}
