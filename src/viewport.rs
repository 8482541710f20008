//! Viewports bind a scene and a camera node to a region of the screen.
//!
//! The renderer keeps its viewports in numbered slots. Registering a
//! viewport in an occupied slot replaces the previous one.

use crate::{
    camera::Camera,
    data_structures::scene_graph::{NodeId, Scene, SceneId},
    error::SampleError,
};

/// Region of the render target in normalized coordinates (0..1, origin top
/// left).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewRect {
    pub const FULL: ViewRect = ViewRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Pixel rectangle `(x, y, width, height)` for a target of the given size.
    pub fn to_pixels(&self, target_width: u32, target_height: u32) -> (f32, f32, f32, f32) {
        (
            self.x * target_width as f32,
            self.y * target_height as f32,
            self.width * target_width as f32,
            self.height * target_height as f32,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scene: SceneId,
    camera: NodeId,
    pub rect: ViewRect,
}

impl Viewport {
    /// Full screen viewport. `camera` must be a node of `scene` that holds a
    /// [`Camera`].
    pub fn new(scene: &Scene, camera: NodeId) -> Result<Self, SampleError> {
        let node = scene
            .node(camera)
            .ok_or(SampleError::UnknownNode(camera, scene.id()))?;
        if !node.has_component::<Camera>() {
            return Err(SampleError::MissingCamera(camera));
        }
        Ok(Self {
            scene: scene.id(),
            camera,
            rect: ViewRect::FULL,
        })
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn camera(&self) -> NodeId {
        self.camera
    }

    pub fn shows(&self, scene: &Scene) -> bool {
        self.scene == scene.id()
    }
}

#[derive(Debug, Default)]
pub struct ViewportSlots {
    slots: Vec<Option<Viewport>>,
}

impl ViewportSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `viewport` at `index`, returning whatever was there before.
    pub fn set(&mut self, index: usize, viewport: Viewport) -> Option<Viewport> {
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        self.slots[index].replace(viewport)
    }

    pub fn get(&self, index: usize) -> Option<&Viewport> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn clear(&mut self, index: usize) -> Option<Viewport> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Viewport)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (i, v)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with_camera() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let camera = scene.create_child("camera");
        if let Some(node) = scene.node_mut(camera) {
            node.create_component(Camera::default());
        }
        (scene, camera)
    }

    #[test]
    fn viewport_needs_a_camera_node() {
        let (scene, camera) = scene_with_camera();
        let mut bare = Scene::new();
        let plain = bare.create_child("plain");

        assert!(Viewport::new(&scene, camera).is_ok());
        assert!(matches!(
            Viewport::new(&bare, plain),
            Err(SampleError::MissingCamera(_))
        ));
    }

    #[test]
    fn setting_a_slot_replaces_the_previous_viewport() {
        let (scene, camera) = scene_with_camera();
        let (other_scene, other_camera) = scene_with_camera();
        let mut slots = ViewportSlots::new();

        assert!(slots.set(0, Viewport::new(&scene, camera).expect("viewport")).is_none());
        let previous = slots.set(0, Viewport::new(&other_scene, other_camera).expect("viewport"));

        assert_eq!(previous.map(|v| v.scene()), Some(scene.id()));
        assert_eq!(slots.len(), 1);
        assert!(slots.get(0).is_some_and(|v| v.shows(&other_scene)));
    }

    #[test]
    fn sparse_slots_iterate_in_order() {
        let (scene, camera) = scene_with_camera();
        let viewport = Viewport::new(&scene, camera).expect("viewport");
        let mut slots = ViewportSlots::new();
        slots.set(2, viewport);
        slots.set(0, viewport);

        let indices: Vec<_> = slots.iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 2]);
        assert!(slots.get(1).is_none());
        assert!(slots.clear(2).is_some());
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn view_rect_scales_to_pixels() {
        let rect = ViewRect {
            x: 0.5,
            y: 0.0,
            width: 0.5,
            height: 1.0,
        };
        assert_eq!(rect.to_pixels(800, 600), (400.0, 0.0, 400.0, 600.0));
    }
}
