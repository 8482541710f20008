//! Loads R.U.B.E. scenes into a [`PhysicsWorld2D`].
//!
//! Every Rube body becomes a rapier body plus a scene node named after the
//! body (or `body<N>` for unnamed ones) that mirrors its pose. Joints are
//! mapped onto the closest rapier joint; joint kinds rapier has no
//! counterpart for are skipped with a warning.

pub mod format;

use std::{f32::consts::TAU, num::NonZeroUsize};

use anyhow::Context;
use cgmath::{InnerSpace, Vector2};
use rapier2d::prelude::*;

use crate::{
    data_structures::scene_graph::{NodeId, Scene},
    error::SampleError,
    host::LevelLoader,
    physics::{PhysicsWorld2D, RigidBody2D, conversions::{to_rapier_point, to_rapier_vec}},
    resources::{
        load_string,
        rube::format::{RubeBody, RubeBodyType, RubeFixture, RubeJoint, RubeWorld},
    },
};

/// Frequency used for distance joints that Rube marks as rigid (frequency 0).
const RIGID_SPRING_FREQUENCY: f32 = 30.0;

/// What a load put into the scene.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub bodies: usize,
    pub colliders: usize,
    pub joints: usize,
    pub skipped_joints: usize,
    pub nodes: Vec<NodeId>,
}

/// A body with its colliders, ready to be inserted.
struct PreparedBody {
    name: String,
    position: Vector2<f32>,
    angle: f32,
    body: RigidBody,
    colliders: Vec<Collider>,
}

struct PreparedJoint {
    joint: Option<GenericJoint>,
    body_a: usize,
    body_b: usize,
}

/// Loads a Rube scene into the scene it is given.
///
/// Reading or parsing the file never fails construction. A broken source is
/// kept and reported by [`LevelLoader::load_world`], so the sample still
/// starts and the error goes through the unhandled-error policy.
#[derive(Debug)]
pub struct RubeLoader {
    source: anyhow::Result<RubeWorld>,
    summary: Option<LoadSummary>,
}

fn parse(json: &str) -> anyhow::Result<RubeWorld> {
    serde_json::from_str(json).context("parsing rube scene")
}

impl RubeLoader {
    pub fn from_str(json: &str) -> anyhow::Result<Self> {
        Ok(Self {
            source: Ok(parse(json)?),
            summary: None,
        })
    }

    /// Wrap already read level text, or the error reading it.
    pub fn from_source(text: anyhow::Result<String>) -> Self {
        Self {
            source: text.and_then(|json| parse(&json)),
            summary: None,
        }
    }

    pub async fn from_file(file_name: &str) -> Self {
        let source = load_string(file_name)
            .await
            .and_then(|json| parse(&json))
            .with_context(|| format!("loading level {}", file_name));
        Self {
            source,
            summary: None,
        }
    }

    /// Result of the last successful [`LevelLoader::load_world`] call.
    pub fn summary(&self) -> Option<&LoadSummary> {
        self.summary.as_ref()
    }
}

fn configure(world: &RubeWorld, physics: &mut PhysicsWorld2D) {
    physics.set_gravity(world.gravity.0);
    physics.set_steps_per_second(world.steps_per_second.0);
    if let Some(iterations) = NonZeroUsize::new(world.velocity_iterations as usize) {
        physics.integration_parameters.num_solver_iterations = iterations;
    }
}

fn build_body(world: &RubeWorld, body: &RubeBody) -> RigidBody {
    let builder = match body.body_type {
        RubeBodyType::Static => RigidBodyBuilder::fixed(),
        RubeBodyType::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
        RubeBodyType::Dynamic => RigidBodyBuilder::dynamic(),
    };
    let mut builder = builder
        .translation(to_rapier_vec(body.position.0))
        .rotation(body.angle.0)
        .linvel(to_rapier_vec(body.linear_velocity.0))
        .angvel(body.angular_velocity.0)
        .linear_damping(body.linear_damping.0)
        .angular_damping(body.angular_damping.0)
        .gravity_scale(body.gravity_scale.0)
        .ccd_enabled(body.bullet)
        .can_sleep(world.allow_sleep)
        .sleeping(!body.awake);
    if body.fixed_rotation {
        builder = builder.lock_rotations();
    }
    builder.build()
}

/// `None` for fixtures without a supported shape.
fn build_collider(fixture: &RubeFixture, label: &str) -> anyhow::Result<Option<Collider>> {
    let builder = if let Some(circle) = &fixture.circle {
        ColliderBuilder::ball(circle.radius.0).translation(to_rapier_vec(circle.center.0))
    } else if let Some(polygon) = &fixture.polygon {
        let points = to_points(&polygon.vertices.points()?);
        match points.as_slice() {
            // Rube exports Box2D edge shapes as two-vertex polygons.
            [a, b] => ColliderBuilder::segment(*a, *b),
            [_, _, _, ..] => ColliderBuilder::convex_hull(&points)
                .ok_or_else(|| SampleError::DegeneratePolygon(label.to_string()))?,
            _ => return Err(SampleError::DegeneratePolygon(label.to_string()).into()),
        }
    } else if let Some(chain) = &fixture.chain {
        let points = to_points(&chain.vertices.points()?);
        if points.len() < 2 {
            log::warn!("Skipping chain fixture {} with fewer than two vertices", label);
            return Ok(None);
        }
        ColliderBuilder::polyline(points, None)
    } else {
        log::warn!("Skipping fixture {} without a supported shape", label);
        return Ok(None);
    };
    if fixture.group_index != 0 {
        log::debug!(
            "Fixture {} uses collision group {}, only category and mask bits are applied",
            label,
            fixture.group_index
        );
    }
    let groups = InteractionGroups::new(
        Group::from_bits_truncate(fixture.category_bits),
        Group::from_bits_truncate(fixture.mask_bits),
    );
    Ok(Some(
        builder
            .density(fixture.density.0)
            .friction(fixture.friction.0)
            .restitution(fixture.restitution.0)
            .sensor(fixture.sensor)
            .collision_groups(groups)
            .build(),
    ))
}

fn build_joint(joint: &RubeJoint) -> Option<GenericJoint> {
    let anchor_a = to_rapier_point(joint.anchor_a.0);
    let anchor_b = to_rapier_point(joint.anchor_b.0);
    let limits = [joint.lower_limit.0, joint.upper_limit.0];
    let built: GenericJoint = match joint.joint_type.as_str() {
        "revolute" => {
            let mut builder = RevoluteJointBuilder::new()
                .contacts_enabled(joint.collide_connected);
            if joint.enable_limit {
                builder = builder.limits(limits);
            }
            if joint.enable_motor {
                builder = builder
                    .motor_velocity(joint.motor_speed.0, 1.0)
                    .motor_max_force(joint.max_motor_torque.0);
            }
            with_reference_angle(builder.into(), anchor_a, anchor_b, 0.0, joint.ref_angle.0)
        }
        "prismatic" => {
            let local_axis = axis(joint.local_axis_a.0);
            let mut builder =
                PrismaticJointBuilder::new(local_axis).contacts_enabled(joint.collide_connected);
            if joint.enable_limit {
                builder = builder.limits(limits);
            }
            if joint.enable_motor {
                builder = builder
                    .motor_velocity(joint.motor_speed.0, 1.0)
                    .motor_max_force(joint.max_motor_force.0);
            }
            let axis_angle = local_axis.y.atan2(local_axis.x);
            with_reference_angle(builder.into(), anchor_a, anchor_b, axis_angle, joint.ref_angle.0)
        }
        "weld" => {
            let built = FixedJointBuilder::new()
                .contacts_enabled(joint.collide_connected)
                .into();
            with_reference_angle(built, anchor_a, anchor_b, 0.0, joint.ref_angle.0)
        }
        "rope" => RopeJointBuilder::new(joint.max_length.0)
            .local_anchor1(anchor_a)
            .local_anchor2(anchor_b)
            .contacts_enabled(joint.collide_connected)
            .into(),
        "distance" => {
            let (frequency, damping_ratio) = if joint.frequency.0 > 0.0 {
                (joint.frequency.0, joint.damping_ratio.0)
            } else {
                (RIGID_SPRING_FREQUENCY, 1.0)
            };
            let omega = TAU * frequency;
            SpringJointBuilder::new(joint.length.0, omega * omega, 2.0 * damping_ratio * omega)
                .spring_model(MotorModel::AccelerationBased)
                .local_anchor1(anchor_a)
                .local_anchor2(anchor_b)
                .contacts_enabled(joint.collide_connected)
                .into()
        }
        // Rapier has no wheel joint. The suspension axis is dropped and
        // only the driven hinge remains.
        "wheel" => {
            let mut builder = RevoluteJointBuilder::new()
                .local_anchor1(anchor_a)
                .local_anchor2(anchor_b)
                .contacts_enabled(joint.collide_connected);
            if joint.enable_motor {
                builder = builder
                    .motor_velocity(joint.motor_speed.0, 1.0)
                    .motor_max_force(joint.max_motor_torque.0);
            }
            builder.into()
        }
        other => {
            log::warn!(
                "Skipping {} joint {}: not supported",
                other,
                joint.name.as_deref().unwrap_or("")
            );
            return None;
        }
    };
    Some(built)
}

/// Place the joint frames so that the relative angle `angle_b - angle_a`
/// reads zero at `ref_angle`, the way Box2D measures revolute, prismatic and
/// weld joints. `axis_angle` turns both frames onto the joint axis.
fn with_reference_angle(
    mut joint: GenericJoint,
    anchor_a: Point<Real>,
    anchor_b: Point<Real>,
    axis_angle: f32,
    ref_angle: f32,
) -> GenericJoint {
    joint.local_frame1 = Isometry::new(anchor_a.coords, axis_angle);
    joint.local_frame2 = Isometry::new(anchor_b.coords, axis_angle - ref_angle);
    joint
}

fn to_points(points: &[Vector2<f32>]) -> Vec<Point<Real>> {
    points.iter().copied().map(to_rapier_point).collect()
}

fn axis(v: Vector2<f32>) -> UnitVector<Real> {
    if v.magnitude2() > f32::EPSILON {
        UnitVector::new_normalize(to_rapier_vec(v))
    } else {
        Vector::x_axis()
    }
}

/// Build every body, collider and joint without touching the scene, so a
/// broken level leaves it as it was.
fn prepare(world: &RubeWorld) -> anyhow::Result<(Vec<PreparedBody>, Vec<PreparedJoint>)> {
    let mut bodies = Vec::with_capacity(world.body.len());
    for (index, body) in world.body.iter().enumerate() {
        let name = body
            .name
            .clone()
            .unwrap_or_else(|| format!("body{}", index));
        let mut colliders = Vec::with_capacity(body.fixture.len());
        for (fixture_index, fixture) in body.fixture.iter().enumerate() {
            let label = fixture
                .name
                .clone()
                .unwrap_or_else(|| format!("{}/fixture{}", name, fixture_index));
            if let Some(collider) = build_collider(fixture, &label)? {
                colliders.push(collider);
            }
        }
        bodies.push(PreparedBody {
            name,
            position: body.position.0,
            angle: body.angle.0,
            body: build_body(world, body),
            colliders,
        });
    }

    let mut joints = Vec::with_capacity(world.joint.len());
    for (index, joint) in world.joint.iter().enumerate() {
        for body in [joint.body_a, joint.body_b] {
            if body >= bodies.len() {
                return Err(SampleError::BodyIndexOutOfRange {
                    joint: index,
                    index: body,
                    count: bodies.len(),
                }
                .into());
            }
        }
        joints.push(PreparedJoint {
            joint: build_joint(joint),
            body_a: joint.body_a,
            body_b: joint.body_b,
        });
    }
    Ok((bodies, joints))
}

impl LevelLoader for RubeLoader {
    fn load_world(&mut self, scene: &mut Scene) -> anyhow::Result<()> {
        let world = match &self.source {
            Ok(world) => world,
            Err(e) => anyhow::bail!("{:#}", e),
        };
        let (bodies, joints) = prepare(world)?;

        if scene.get_component::<PhysicsWorld2D>().is_none() {
            scene.create_component(PhysicsWorld2D::new());
        }
        let scene_id = scene.id();
        let missing_world = || SampleError::MissingComponent(scene_id, "PhysicsWorld2D");
        configure(
            world,
            scene.get_component_mut::<PhysicsWorld2D>().ok_or_else(missing_world)?,
        );

        let mut summary = LoadSummary::default();
        let mut handles = Vec::with_capacity(bodies.len());
        for prepared in bodies {
            let node = scene.create_child(&prepared.name);
            let body_type = prepared.body.body_type();
            let physics = scene
                .get_component_mut::<PhysicsWorld2D>()
                .ok_or_else(missing_world)?;
            let handle = physics.insert_body(prepared.body, node);
            for collider in prepared.colliders {
                physics.insert_collider(collider, handle);
                summary.colliders += 1;
            }

            if let Some(node) = scene.node_mut(node) {
                node.set_position(prepared.position.extend(0.0));
                node.transform.rotation = prepared.angle;
                node.create_component(RigidBody2D { handle, body_type });
            }
            handles.push(handle);
            summary.nodes.push(node);
            summary.bodies += 1;
        }

        let physics = scene
            .get_component_mut::<PhysicsWorld2D>()
            .ok_or_else(missing_world)?;
        for prepared in joints {
            match prepared.joint {
                Some(joint) => {
                    physics.insert_joint(joint, handles[prepared.body_a], handles[prepared.body_b]);
                    summary.joints += 1;
                }
                None => summary.skipped_joints += 1,
            }
        }

        log::info!(
            "Loaded level: {} bodies, {} fixtures, {} joints ({} skipped)",
            summary.bodies,
            summary.colliders,
            summary.joints,
            summary.skipped_joints
        );
        self.summary = Some(summary);
        Ok(())
    }
}
