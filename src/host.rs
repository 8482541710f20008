//! The seams between the sample and the engine.
//!
//! The sample only talks to the renderer through [`Host`] and to the level
//! format through [`LevelLoader`]. The wgpu [`Renderer`](crate::render::Renderer)
//! and the [`RubeLoader`](crate::resources::rube::RubeLoader) are the real
//! implementations; tests substitute counting doubles.

use crate::{data_structures::scene_graph::Scene, viewport::Viewport};

pub trait Host {
    /// Current size of the render target in pixels.
    fn display_size(&self) -> (u32, u32);

    /// Register `viewport` in slot `index`, replacing the previous one.
    fn set_viewport(&mut self, index: usize, viewport: Viewport);

    /// Emit renderer debug geometry (drawable bounds) for every viewport that
    /// shows `scene` into the scene's debug renderer. Only valid for the
    /// current frame.
    fn draw_debug_geometry(&mut self, scene: &mut Scene, depth_test: bool);
}

/// Populates a scene from a serialized level description.
pub trait LevelLoader {
    fn load_world(&mut self, scene: &mut Scene) -> anyhow::Result<()>;
}
