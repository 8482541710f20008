//! Debug geometry.
//!
//! [`DebugRenderer`] is a scene component that collects line segments during
//! a frame. Anything may add lines to it: the physics world, the renderer's
//! bounding box pass, user code. The renderer draws the collected lines once
//! and clears them, so debug geometry has to be requested again every frame.
//!
//! Lines are kept in two batches. Depth tested lines are hidden behind
//! closer geometry, overlay lines are always drawn on top.

pub mod hud;
pub mod subscriber;

use cgmath::{Vector2, Vector3};

use crate::data_structures::{
    octree::{Aabb, Octree},
    scene_graph::{Component, Scene},
};

pub type Rgba = [f32; 4];

pub mod colors {
    use super::Rgba;

    pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];
    pub const GREEN: Rgba = [0.3, 0.9, 0.3, 1.0];
    pub const GREY: Rgba = [0.6, 0.6, 0.6, 1.0];
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DebugVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl DebugVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<DebugVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Per-frame line collector. Two vertices per line.
#[derive(Debug, Default)]
pub struct DebugRenderer {
    depth_tested: Vec<DebugVertex>,
    overlay: Vec<DebugVertex>,
}

impl Component for DebugRenderer {}

impl DebugRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_line(&mut self, start: Vector3<f32>, end: Vector3<f32>, color: Rgba, depth_test: bool) {
        let batch = if depth_test {
            &mut self.depth_tested
        } else {
            &mut self.overlay
        };
        batch.push(DebugVertex {
            position: start.into(),
            color,
        });
        batch.push(DebugVertex {
            position: end.into(),
            color,
        });
    }

    /// Closed outline through `points` on the plane `z`.
    pub fn add_polygon(&mut self, points: &[Vector2<f32>], z: f32, color: Rgba, depth_test: bool) {
        if points.len() < 2 {
            return;
        }
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            self.add_line(a.extend(z), b.extend(z), color, depth_test);
        }
    }

    pub fn add_circle(
        &mut self,
        center: Vector3<f32>,
        radius: f32,
        segments: usize,
        color: Rgba,
        depth_test: bool,
    ) {
        let segments = segments.max(3);
        let points: Vec<_> = (0..segments)
            .map(|i| {
                let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
                Vector2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
            })
            .collect();
        self.add_polygon(&points, center.z, color, depth_test);
    }

    pub fn add_bounding_box(&mut self, aabb: &Aabb, color: Rgba, depth_test: bool) {
        self.add_polygon(&aabb.corners(), 0.0, color, depth_test);
    }

    pub fn lines(&self, depth_test: bool) -> &[DebugVertex] {
        if depth_test {
            &self.depth_tested
        } else {
            &self.overlay
        }
    }

    pub fn line_count(&self) -> usize {
        (self.depth_tested.len() + self.overlay.len()) / 2
    }

    pub fn has_content(&self) -> bool {
        !self.depth_tested.is_empty() || !self.overlay.is_empty()
    }

    pub fn clear(&mut self) {
        self.depth_tested.clear();
        self.overlay.clear();
    }
}

/// Add the bounding box of every drawable the octree finds inside `view`.
///
/// Returns how many boxes were drawn. Scenes without an octree or a debug
/// renderer draw nothing.
pub fn draw_visible_bounds(scene: &mut Scene, view: &Aabb, depth_test: bool) -> usize {
    let (octree, debug) = scene.get_components_mut::<Octree, DebugRenderer>();
    let (Some(octree), Some(debug)) = (octree, debug) else {
        return 0;
    };
    let visible = octree.query(view);
    for node in visible.iter() {
        if let Some(aabb) = octree.bounds_of(*node) {
            debug.add_bounding_box(&aabb, colors::GREY, depth_test);
        }
    }
    visible.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_land_in_their_batch() {
        let mut debug = DebugRenderer::new();
        debug.add_line(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), colors::WHITE, true);
        debug.add_circle(Vector3::new(0.0, 0.0, 0.0), 1.0, 12, colors::GREEN, false);

        assert_eq!(debug.lines(true).len(), 2);
        assert_eq!(debug.lines(false).len(), 24);
        assert_eq!(debug.line_count(), 13);

        debug.clear();
        assert!(!debug.has_content());
    }

    #[test]
    fn bounding_box_is_four_lines() {
        let mut debug = DebugRenderer::new();
        let aabb = Aabb::new(Vector2::new(-1.0, -1.0), Vector2::new(1.0, 2.0));
        debug.add_bounding_box(&aabb, colors::GREY, false);

        assert_eq!(debug.line_count(), 4);
        assert_eq!(debug.lines(false)[0].position, [-1.0, -1.0, 0.0]);
    }

    #[test]
    fn visible_bounds_come_from_the_octree() {
        let mut scene = Scene::new();
        let inside = scene.create_child("inside");
        let outside = scene.create_child("outside");
        let octree = scene.create_component(Octree::default());
        octree.update(inside, Aabb::new(Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0)));
        octree.update(outside, Aabb::new(Vector2::new(40.0, 40.0), Vector2::new(41.0, 41.0)));
        scene.create_component(DebugRenderer::new());

        let view = Aabb::new(Vector2::new(-5.0, -5.0), Vector2::new(5.0, 5.0));
        assert_eq!(draw_visible_bounds(&mut scene, &view, false), 1);
        assert_eq!(
            scene.get_component::<DebugRenderer>().map(|d| d.line_count()),
            Some(4)
        );
    }

    #[test]
    fn visible_bounds_need_both_components() {
        let mut scene = Scene::new();
        scene.create_component(DebugRenderer::new());
        let view = Aabb::new(Vector2::new(-5.0, -5.0), Vector2::new(5.0, 5.0));
        assert_eq!(draw_visible_bounds(&mut scene, &view, false), 0);
    }
}
