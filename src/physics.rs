//! The physics world: a thin layer over the `rapier2d` pipeline.
//!
//! Rapier does all integration and collision resolution.
//! This module only adds what the simulation needs on top:
//! bodies with fixed mass properties, colliders that can be swapped in place,
//! and contact-begin reporting in terms of the entities that own the colliders.

use parking_lot::Mutex;
use rapier2d::parry::mass_properties::MassProperties;
use rapier2d::prelude::*;
use std::collections::HashMap;
use thunderdome::Index;

use crate::math as m;

/// Shape of a collider in body-local coordinates, centered on the body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColliderShape {
    Circle { r: f32 },
    Rect { hw: f32, hh: f32 },
    /// Isosceles triangle with its base at `-hh` and apex at `+hh`.
    Triangle { hw: f32, hh: f32 },
}

/// Surface properties of a collider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub elasticity: f32,
    pub friction: f32,
}

/// Mass properties of a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mass {
    pub mass: f32,
    pub moment_of_inertia: f32,
}

/// Handle pair identifying a body and the single collider attached to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodyHandle {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

/// World-space geometry of a collider, for drawing.
#[derive(Clone, Debug, PartialEq)]
pub enum Outline {
    Circle { center: m::Vec2, r: f32 },
    Polygon(Vec<m::Vec2>),
}

/// Two entities whose colliders started touching during a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityContact(pub Index, pub Index);

//
// Event collection
//

// rapier requires event handlers to be Sync
#[derive(Default)]
struct ContactCollector {
    started: Mutex<Vec<CollisionEvent>>,
}

impl ContactCollector {
    fn drain(&self) -> Vec<CollisionEvent> {
        std::mem::take(&mut *self.started.lock())
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if event.started() {
            self.started.lock().push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

//
// World
//

pub struct World {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    contacts: ContactCollector,
    // which entity owns each collider
    owners: HashMap<ColliderHandle, Index>,
}

impl World {
    /// Create an empty world.
    ///
    /// `dt` is the length of every step in seconds.
    /// `length_unit` is the typical object size, which rapier uses to scale its tolerances
    /// (we simulate in pixels, not metres).
    pub fn new(gravity: m::Vec2, dt: f32, length_unit: f32) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = dt;
        integration_parameters.length_unit = length_unit;

        Self {
            gravity: m::to_vector(gravity),
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            contacts: ContactCollector::default(),
            owners: HashMap::new(),
        }
    }

    /// Length of a step in seconds.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Add a dynamic body with one collider.
    /// Contacts involving it are only reported once it has an owner, see [`set_owner`][Self::set_owner].
    pub fn insert(
        &mut self,
        position: m::Vec2,
        velocity: m::Vec2,
        shape: ColliderShape,
        mass: Mass,
        material: Material,
    ) -> BodyHandle {
        let rb = RigidBodyBuilder::dynamic()
            .translation(m::to_vector(position))
            .linvel(m::to_vector(velocity))
            // mass lives on the body so that swapping colliders doesn't change it
            .additional_mass_properties(MassProperties::new(
                Point::origin(),
                mass.mass,
                mass.moment_of_inertia,
            ))
            .can_sleep(false)
            .build();
        let body = self.bodies.insert(rb);

        let collider = self.colliders.insert_with_parent(
            build_collider(shape, material),
            body,
            &mut self.bodies,
        );

        BodyHandle { body, collider }
    }

    /// Attach the entity that owns a body's collider.
    pub fn set_owner(&mut self, handle: &BodyHandle, owner: Index) {
        self.owners.insert(handle.collider, owner);
    }

    /// Replace the collider attached to a body with one of a different shape.
    ///
    /// The old collider is removed before the new one is added,
    /// so the body never has two colliders registered for contacts.
    /// `handle` is updated to point to the new collider.
    pub fn replace_collider(
        &mut self,
        handle: &mut BodyHandle,
        shape: ColliderShape,
        material: Material,
    ) {
        let owner = self.owners.remove(&handle.collider);
        self.colliders
            .remove(handle.collider, &mut self.islands, &mut self.bodies, true);

        let collider = self.colliders.insert_with_parent(
            build_collider(shape, material),
            handle.body,
            &mut self.bodies,
        );
        if let Some(owner) = owner {
            self.owners.insert(collider, owner);
        }
        handle.collider = collider;
    }

    /// Advance the simulation by one timestep.
    /// Returns the pairs of entities that started touching during the step,
    /// in the order rapier reported them.
    pub fn step(&mut self) -> Vec<EntityContact> {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.contacts,
        );

        self.contacts
            .drain()
            .into_iter()
            .filter_map(|evt| {
                let a = self.owners.get(&evt.collider1())?;
                let b = self.owners.get(&evt.collider2())?;
                Some(EntityContact(*a, *b))
            })
            .collect()
    }

    //
    // Body state access
    //

    pub fn position(&self, handle: &BodyHandle) -> m::Vec2 {
        self.bodies
            .get(handle.body)
            .map(|rb| m::from_vector(rb.translation()))
            .unwrap_or_else(m::Vec2::zero)
    }

    pub fn set_position(&mut self, handle: &BodyHandle, position: m::Vec2) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_translation(m::to_vector(position), true);
        }
    }

    pub fn velocity(&self, handle: &BodyHandle) -> m::Vec2 {
        self.bodies
            .get(handle.body)
            .map(|rb| m::from_vector(rb.linvel()))
            .unwrap_or_else(m::Vec2::zero)
    }

    pub fn set_velocity(&mut self, handle: &BodyHandle, velocity: m::Vec2) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_linvel(m::to_vector(velocity), true);
        }
    }

    pub fn angular_velocity(&self, handle: &BodyHandle) -> f32 {
        self.bodies
            .get(handle.body)
            .map(|rb| rb.angvel())
            .unwrap_or(0.0)
    }

    pub fn set_angular_velocity(&mut self, handle: &BodyHandle, angvel: f32) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_angvel(angvel, true);
        }
    }

    /// World-space geometry of the body's collider at the body's current pose.
    pub fn outline(&self, handle: &BodyHandle) -> Option<Outline> {
        let rb = self.bodies.get(handle.body)?;
        let coll = self.colliders.get(handle.collider)?;
        // use the body's pose rather than the collider's,
        // which is only synced with the body during a step
        let pose = rb.position();
        let shape = coll.shape();

        let polygon = |pts: &[Point<Real>]| {
            Outline::Polygon(pts.iter().map(|p| m::from_point(&(pose * p))).collect())
        };

        if let Some(ball) = shape.as_ball() {
            Some(Outline::Circle {
                center: m::from_vector(&pose.translation.vector),
                r: ball.radius,
            })
        } else if let Some(cuboid) = shape.as_cuboid() {
            let he = cuboid.half_extents;
            Some(polygon(&[
                point![-he.x, -he.y],
                point![he.x, -he.y],
                point![he.x, he.y],
                point![-he.x, he.y],
            ]))
        } else {
            shape.as_triangle().map(|tri| polygon(&[tri.a, tri.b, tri.c]))
        }
    }

    /// Number of colliders attached to a body.
    pub fn collider_count(&self, handle: &BodyHandle) -> usize {
        self.bodies
            .get(handle.body)
            .map(|rb| rb.colliders().len())
            .unwrap_or(0)
    }

    /// Number of bodies in the world.
    #[inline]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

fn build_collider(shape: ColliderShape, material: Material) -> Collider {
    let builder = match shape {
        ColliderShape::Circle { r } => ColliderBuilder::ball(r),
        ColliderShape::Rect { hw, hh } => ColliderBuilder::cuboid(hw, hh),
        ColliderShape::Triangle { hw, hh } => {
            ColliderBuilder::triangle(point![-hw, -hh], point![hw, -hh], point![0.0, hh])
        }
    };
    builder
        .density(0.0)
        .restitution(material.elasticity)
        .restitution_combine_rule(CoefficientCombineRule::Multiply)
        .friction(material.friction)
        .friction_combine_rule(CoefficientCombineRule::Multiply)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build()
}

//
// tests
//
