use cgmath::Vector3;
use rapier2d::prelude::*;

use crate::{
    debug::{DebugRenderer, subscriber::DebugGeometrySource},
    physics::{PhysicsWorld2D, conversions::hsla_to_rgba},
};

/// Forwards rapier's debug lines into a [`DebugRenderer`].
pub struct DebugLineBackend<'a> {
    pub debug: &'a mut DebugRenderer,
    pub depth_test: bool,
    pub lines: usize,
}

impl<'a> DebugLineBackend<'a> {
    pub fn new(debug: &'a mut DebugRenderer, depth_test: bool) -> Self {
        Self {
            debug,
            depth_test,
            lines: 0,
        }
    }
}

impl DebugRenderBackend for DebugLineBackend<'_> {
    fn draw_line(
        &mut self,
        _: DebugRenderObject,
        a: Point<Real>,
        b: Point<Real>,
        color: [f32; 4],
    ) {
        self.debug.add_line(
            Vector3::new(a.x, a.y, 0.0),
            Vector3::new(b.x, b.y, 0.0),
            hsla_to_rgba(color),
            self.depth_test,
        );
        self.lines += 1;
    }
}

impl DebugGeometrySource for PhysicsWorld2D {
    /// Shapes, joints and contacts, drawn on top of everything else.
    fn draw_debug_geometry(&mut self, debug: &mut DebugRenderer) {
        let mut backend = DebugLineBackend::new(debug, false);
        self.debug_pipeline.render(
            &mut backend,
            &self.bodies,
            &self.colliders,
            &self.impulse_joints,
            &self.multibody_joints,
            &self.narrow_phase,
        );
        log::trace!("Physics debug draw: {} lines", backend.lines);
    }
}
