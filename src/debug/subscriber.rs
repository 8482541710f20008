//! Per-frame debug-draw requests.
//!
//! The subscriber runs after the scene update of every frame. While it is on
//! it makes exactly two requests: the physics world draws its shapes and
//! joints, then the host draws the bounds of visible drawables without depth
//! testing. Both land in the scene's [`DebugRenderer`].

use crate::{
    data_structures::scene_graph::{Component, Scene},
    debug::DebugRenderer,
    host::Host,
    physics::PhysicsWorld2D,
};

/// Anything that can emit wireframes into a [`DebugRenderer`].
pub trait DebugGeometrySource {
    fn draw_debug_geometry(&mut self, debug: &mut DebugRenderer);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugDrawState {
    On,
    Off,
}

#[derive(Debug)]
pub struct DebugDrawSubscriber {
    state: DebugDrawState,
    warned_missing_source: bool,
}

impl DebugDrawSubscriber {
    pub fn new(enabled: bool) -> Self {
        Self {
            state: if enabled {
                DebugDrawState::On
            } else {
                DebugDrawState::Off
            },
            warned_missing_source: false,
        }
    }

    pub fn state(&self) -> DebugDrawState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == DebugDrawState::On
    }

    /// Request this frame's debug geometry. Returns the number of requests
    /// made.
    pub fn on_post_render_update<H: Host + ?Sized>(
        &mut self,
        scene: &mut Scene,
        host: &mut H,
    ) -> usize {
        self.request_with::<PhysicsWorld2D, H>(scene, host)
    }

    /// Same as [`Self::on_post_render_update`] with an arbitrary geometry
    /// source component on the scene root.
    pub fn request_with<S, H>(&mut self, scene: &mut Scene, host: &mut H) -> usize
    where
        S: DebugGeometrySource + Component,
        H: Host + ?Sized,
    {
        if self.state == DebugDrawState::Off {
            return 0;
        }
        let (source, debug) = scene.get_components_mut::<S, DebugRenderer>();
        let (Some(source), Some(debug)) = (source, debug) else {
            if !self.warned_missing_source {
                log::warn!(
                    "Debug draw skipped: scene has no {} or no debug renderer",
                    std::any::type_name::<S>()
                );
                self.warned_missing_source = true;
            }
            return 0;
        };
        source.draw_debug_geometry(debug);
        host.draw_debug_geometry(scene, false);
        2
    }
}
