//! 2D physics on top of rapier.
//!
//! [`PhysicsWorld2D`] is a scene component owning every rapier set. Bodies
//! are mirrored by scene nodes carrying a [`RigidBody2D`]; after each step
//! the node transforms are overwritten with the body poses and the octree is
//! refreshed with the collider bounds.

pub mod conversions;
pub mod debug;
pub mod touch;

use std::collections::HashMap;

use cgmath::{Vector2, Vector3};
use rapier2d::{parry::query::PointQuery, prelude::*};

use crate::{
    data_structures::{
        octree::{Aabb, Octree},
        scene_graph::{Component, NodeId, Scene},
    },
    physics::{
        conversions::{from_rapier_aabb, from_rapier_vec, to_rapier_point, to_rapier_vec},
        touch::PhysicsTouches,
    },
};

pub const DEFAULT_STEPS_PER_SECOND: f32 = 60.0;
pub const MAX_SUB_STEPS: u32 = 5;

/// Marks a node as the mirror of a rapier body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidBody2D {
    pub handle: RigidBodyHandle,
    pub body_type: RigidBodyType,
}

impl Component for RigidBody2D {}

pub struct PhysicsWorld2D {
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    /// Fixed simulation step in seconds.
    pub time_step: f32,
    pub max_sub_steps: u32,
    accumulator: f32,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,
    debug_pipeline: DebugRenderPipeline,
    body_nodes: HashMap<RigidBodyHandle, NodeId>,
}

impl Default for PhysicsWorld2D {
    fn default() -> Self {
        Self {
            gravity: vector![0.0, -9.81],
            integration_parameters: IntegrationParameters::default(),
            time_step: 1.0 / DEFAULT_STEPS_PER_SECOND,
            max_sub_steps: MAX_SUB_STEPS,
            accumulator: 0.0,
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            debug_pipeline: DebugRenderPipeline::new(
                DebugRenderStyle::default(),
                DebugRenderMode::default(),
            ),
            body_nodes: HashMap::new(),
        }
    }
}

impl Component for PhysicsWorld2D {}

impl PhysicsWorld2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_gravity(&mut self, gravity: Vector2<f32>) {
        self.gravity = to_rapier_vec(gravity);
    }

    pub fn gravity(&self) -> Vector2<f32> {
        from_rapier_vec(&self.gravity)
    }

    pub fn set_steps_per_second(&mut self, steps: f32) {
        if steps > 0.0 {
            self.time_step = 1.0 / steps;
        } else {
            log::warn!("Ignoring non-positive step rate {}", steps);
        }
    }

    /// Insert `body`, mirrored by `node`.
    pub fn insert_body(&mut self, body: RigidBody, node: NodeId) -> RigidBodyHandle {
        let handle = self.bodies.insert(body);
        self.body_nodes.insert(handle, node);
        handle
    }

    pub fn insert_collider(&mut self, collider: Collider, body: RigidBodyHandle) -> ColliderHandle {
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies)
    }

    pub fn insert_joint(
        &mut self,
        joint: impl Into<GenericJoint>,
        body_a: RigidBodyHandle,
        body_b: RigidBodyHandle,
    ) -> ImpulseJointHandle {
        self.impulse_joints.insert(body_a, body_b, joint, true)
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn body_node(&self, handle: RigidBodyHandle) -> Option<NodeId> {
        self.body_nodes.get(&handle).copied()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    pub fn colliders(&self) -> impl Iterator<Item = &Collider> {
        self.colliders.iter().map(|(_, c)| c)
    }

    pub fn joints(&self) -> impl Iterator<Item = &ImpulseJoint> {
        self.impulse_joints.iter().map(|(_, j)| j)
    }

    /// Advance by `dt` seconds in fixed steps. Returns the number of steps
    /// taken. Time beyond `max_sub_steps` steps is dropped.
    pub fn update(&mut self, dt: f32) -> u32 {
        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= self.time_step && steps < self.max_sub_steps {
            self.step();
            self.accumulator -= self.time_step;
            steps += 1;
        }
        if steps == self.max_sub_steps {
            self.accumulator = self.accumulator.min(self.time_step);
        }
        steps
    }

    pub fn step(&mut self) {
        self.integration_parameters.dt = self.time_step;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// Position and angle of every mirrored body.
    pub fn body_poses(&self) -> Vec<(NodeId, Vector2<f32>, f32)> {
        self.body_nodes
            .iter()
            .filter_map(|(handle, node)| {
                let body = self.bodies.get(*handle)?;
                Some((
                    *node,
                    from_rapier_vec(body.translation()),
                    body.rotation().angle(),
                ))
            })
            .collect()
    }

    /// Union of the collider boxes of each mirrored body.
    pub fn body_bounds(&self) -> Vec<(NodeId, Aabb)> {
        let mut bounds: HashMap<NodeId, Aabb> = HashMap::new();
        for (_, collider) in self.colliders.iter() {
            let Some(node) = collider.parent().and_then(|b| self.body_node(b)) else {
                continue;
            };
            let aabb = from_rapier_aabb(&collider.compute_aabb());
            bounds
                .entry(node)
                .and_modify(|existing| {
                    existing.min.x = existing.min.x.min(aabb.min.x);
                    existing.min.y = existing.min.y.min(aabb.min.y);
                    existing.max.x = existing.max.x.max(aabb.max.x);
                    existing.max.y = existing.max.y.max(aabb.max.y);
                })
                .or_insert(aabb);
        }
        bounds.into_iter().collect()
    }

    /// First body with a collider containing `point`, dynamic bodies first.
    pub fn body_at_point(&self, point: Vector2<f32>) -> Option<RigidBodyHandle> {
        let point = to_rapier_point(point);
        let mut hits: Vec<RigidBodyHandle> = self
            .colliders
            .iter()
            .filter(|(_, c)| !c.is_sensor())
            .filter(|(_, c)| c.shape().contains_point(c.position(), &point))
            .filter_map(|(_, c)| c.parent())
            .collect();
        hits.sort_by_key(|h| {
            self.bodies
                .get(*h)
                .map(|b| if b.is_dynamic() { 0 } else { 1 })
                .unwrap_or(2)
        });
        hits.first().copied()
    }
}

/// Step the scene's physics world and mirror the result onto the scene.
///
/// Held bodies are steered before stepping. Scenes without a
/// [`PhysicsWorld2D`] are left untouched.
pub fn update_scene(scene: &mut Scene, dt: f32) {
    let (world, touches) = scene.get_components_mut::<PhysicsWorld2D, PhysicsTouches>();
    let Some(world) = world else {
        return;
    };
    if let Some(touches) = touches {
        touches.apply(world);
    }
    world.update(dt);
    let poses = world.body_poses();
    let bounds = world.body_bounds();

    for (node, position, angle) in poses {
        if let Some(node) = scene.node_mut(node) {
            let z = node.transform.position.z;
            node.transform.position = Vector3::new(position.x, position.y, z);
            node.transform.rotation = angle;
        }
    }
    if let Some(octree) = scene.get_component_mut::<Octree>() {
        for (node, aabb) in bounds {
            octree.update(node, aabb);
        }
    }
}
