//! Drag physics bodies with the mouse or a finger.

use std::collections::HashMap;

use cgmath::Vector2;
use rapier2d::prelude::*;

use crate::{
    camera::Camera,
    data_structures::scene_graph::{Component, NodeId, Scene},
    physics::{
        PhysicsWorld2D,
        conversions::{from_rapier_point, to_rapier_point, to_rapier_vec},
    },
};

/// Pointer id used for the mouse. Touch ids come from winit.
pub const MOUSE_POINTER: u64 = u64::MAX;

/// Fraction of the distance to the pointer a held body covers per second.
const FOLLOW_RATE: f32 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Grab {
    body: RigidBodyHandle,
    /// Grab point in body space.
    anchor: Vector2<f32>,
    target: Vector2<f32>,
}

#[derive(Debug, Default)]
pub struct PhysicsTouches {
    grabs: HashMap<u64, Grab>,
}

impl Component for PhysicsTouches {}

impl PhysicsTouches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the body under `point` and hold it. Returns the picked body.
    pub fn press(
        &mut self,
        world: &PhysicsWorld2D,
        pointer: u64,
        point: Vector2<f32>,
    ) -> Option<RigidBodyHandle> {
        let handle = world.body_at_point(point)?;
        let body = world.body(handle)?;
        if !body.is_dynamic() {
            return None;
        }
        let anchor = body
            .position()
            .inverse_transform_point(&to_rapier_point(point));
        log::debug!("Pointer {} grabbed {:?}", pointer, handle);
        self.grabs.insert(
            pointer,
            Grab {
                body: handle,
                anchor: from_rapier_point(&anchor),
                target: point,
            },
        );
        Some(handle)
    }

    pub fn move_to(&mut self, pointer: u64, point: Vector2<f32>) {
        if let Some(grab) = self.grabs.get_mut(&pointer) {
            grab.target = point;
        }
    }

    pub fn release(&mut self, pointer: u64) -> Option<RigidBodyHandle> {
        self.grabs.remove(&pointer).map(|grab| grab.body)
    }

    pub fn is_holding(&self, pointer: u64) -> bool {
        self.grabs.contains_key(&pointer)
    }

    pub fn held(&self) -> impl Iterator<Item = RigidBodyHandle> + '_ {
        self.grabs.values().map(|grab| grab.body)
    }

    /// Steer every held body towards its pointer. Grabs of bodies that no
    /// longer exist are dropped.
    pub fn apply(&mut self, world: &mut PhysicsWorld2D) {
        self.grabs.retain(|_, grab| {
            let Some(body) = world.body_mut(grab.body) else {
                return false;
            };
            let anchor = from_rapier_point(&(body.position() * to_rapier_point(grab.anchor)));
            let velocity = (grab.target - anchor) * FOLLOW_RATE;
            body.set_linvel(to_rapier_vec(velocity), true);
            true
        });
    }
}

/// Convert a pixel position into world coordinates through the camera on
/// `camera_node`.
pub fn pointer_to_world(
    scene: &Scene,
    camera_node: NodeId,
    screen: Vector2<f32>,
    display_size: (u32, u32),
) -> Option<Vector2<f32>> {
    let camera = scene.node(camera_node)?.get_component::<Camera>()?;
    let transform = scene.world_transform(camera_node)?;
    let size = Vector2::new(display_size.0 as f32, display_size.1 as f32);
    if size.x <= 0.0 || size.y <= 0.0 {
        return None;
    }
    Some(camera.screen_to_world(&transform, screen, size))
}

pub fn touch_begin(scene: &mut Scene, pointer: u64, point: Vector2<f32>) -> Option<RigidBodyHandle> {
    let (touches, world) = scene.get_components_mut::<PhysicsTouches, PhysicsWorld2D>();
    touches?.press(world?, pointer, point)
}

pub fn touch_move(scene: &mut Scene, pointer: u64, point: Vector2<f32>) {
    if let Some(touches) = scene.get_component_mut::<PhysicsTouches>() {
        touches.move_to(pointer, point);
    }
}

pub fn touch_end(scene: &mut Scene, pointer: u64) -> Option<RigidBodyHandle> {
    scene.get_component_mut::<PhysicsTouches>()?.release(pointer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_box(body_type: RigidBodyType) -> (PhysicsWorld2D, RigidBodyHandle) {
        let mut scene = Scene::new();
        let node = scene.create_child("box");
        let mut world = PhysicsWorld2D::new();
        let handle = world.insert_body(RigidBodyBuilder::new(body_type).build(), node);
        world.insert_collider(ColliderBuilder::cuboid(0.5, 0.5).build(), handle);
        (world, handle)
    }

    #[test]
    fn pressing_a_dynamic_body_grabs_it() {
        let (world, handle) = world_with_box(RigidBodyType::Dynamic);
        let mut touches = PhysicsTouches::new();

        assert_eq!(touches.press(&world, 3, Vector2::new(0.2, 0.1)), Some(handle));
        assert!(touches.is_holding(3));
        assert_eq!(touches.release(3), Some(handle));
        assert!(!touches.is_holding(3));
    }

    #[test]
    fn static_bodies_and_empty_space_are_ignored() {
        let (world, _) = world_with_box(RigidBodyType::Fixed);
        let mut touches = PhysicsTouches::new();

        assert_eq!(touches.press(&world, MOUSE_POINTER, Vector2::new(0.0, 0.0)), None);
        assert_eq!(touches.press(&world, MOUSE_POINTER, Vector2::new(5.0, 5.0)), None);
        assert_eq!(touches.held().count(), 0);
    }

    #[test]
    fn held_body_is_pulled_towards_the_pointer() {
        let (mut world, handle) = world_with_box(RigidBodyType::Dynamic);
        let mut touches = PhysicsTouches::new();
        touches.press(&world, MOUSE_POINTER, Vector2::new(0.0, 0.0));
        touches.move_to(MOUSE_POINTER, Vector2::new(1.0, 0.0));

        touches.apply(&mut world);

        let velocity = world.body(handle).map(|b| *b.linvel()).expect("body");
        assert!((velocity.x - FOLLOW_RATE).abs() < 1e-4);
        assert!(velocity.y.abs() < 1e-4);
    }

    #[test]
    fn pointer_maps_through_the_camera() {
        let mut scene = Scene::new();
        let camera_node = scene.create_child("camera");
        let mut camera = Camera::default();
        camera.orthographic = true;
        camera.ortho_size = 10.0;
        camera.set_aspect_ratio(100, 100);
        if let Some(node) = scene.node_mut(camera_node) {
            node.set_position(cgmath::Vector3::new(3.0, 0.0, -0.1));
            node.create_component(camera);
        }

        let centre = pointer_to_world(&scene, camera_node, Vector2::new(50.0, 50.0), (100, 100));
        let corner = pointer_to_world(&scene, camera_node, Vector2::new(100.0, 0.0), (100, 100));

        assert_eq!(centre, Some(Vector2::new(3.0, 0.0)));
        assert_eq!(corner, Some(Vector2::new(8.0, 5.0)));
        assert_eq!(pointer_to_world(&scene, camera_node, Vector2::new(0.0, 0.0), (0, 0)), None);
    }
}
