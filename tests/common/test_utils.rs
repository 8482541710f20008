#![allow(dead_code)]

use cgmath::Vector3;
use instant::Duration;
use rube_flow::{
    data_structures::scene_graph::{Component, NodeId, Scene},
    debug::{DebugRenderer, colors, subscriber::DebugGeometrySource},
    flow::Application,
    host::{Host, LevelLoader},
    render::draw_viewport_bounds,
    viewport::{Viewport, ViewportSlots},
};

/// Host double that counts every call the sample makes.
pub(crate) struct CountingHost {
    display: (u32, u32),
    pub viewports: ViewportSlots,
    set_viewport_invocations: u32,
    draw_debug_invocations: u32,
    last_depth_test: Option<bool>,
    /// Emit real bounding boxes like the wgpu renderer does.
    pub emit_bounds: bool,
}

impl CountingHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            display: (width, height),
            viewports: ViewportSlots::new(),
            set_viewport_invocations: 0,
            draw_debug_invocations: 0,
            last_depth_test: None,
            emit_bounds: false,
        }
    }

    pub fn set_viewport_invocations(&self) -> u32 {
        self.set_viewport_invocations
    }

    pub fn draw_debug_invocations(&self) -> u32 {
        self.draw_debug_invocations
    }

    pub fn last_depth_test(&self) -> Option<bool> {
        self.last_depth_test
    }
}

impl Default for CountingHost {
    fn default() -> Self {
        Self::new(1080, 720)
    }
}

impl Host for CountingHost {
    fn display_size(&self) -> (u32, u32) {
        self.display
    }

    fn set_viewport(&mut self, index: usize, viewport: Viewport) {
        self.set_viewport_invocations += 1;
        self.viewports.set(index, viewport);
    }

    fn draw_debug_geometry(&mut self, scene: &mut Scene, depth_test: bool) {
        self.draw_debug_invocations += 1;
        self.last_depth_test = Some(depth_test);
        if self.emit_bounds {
            draw_viewport_bounds(&self.viewports, scene, depth_test);
        }
    }
}

/// Level loader double. Adds one node per load so tests can see it ran.
#[derive(Default)]
pub(crate) struct CountingLoader {
    load_invocations: u32,
    pub fail: bool,
}

impl CountingLoader {
    pub fn failing() -> Self {
        Self {
            load_invocations: 0,
            fail: true,
        }
    }

    pub fn load_invocations(&self) -> u32 {
        self.load_invocations
    }
}

impl LevelLoader for CountingLoader {
    fn load_world(&mut self, scene: &mut Scene) -> anyhow::Result<()> {
        self.load_invocations += 1;
        if self.fail {
            anyhow::bail!("level file is corrupt");
        }
        scene.create_child("loaded");
        Ok(())
    }
}

/// Debug geometry source that draws one line per request.
#[derive(Default)]
pub(crate) struct CountingSource {
    draw_invocations: u32,
}

impl CountingSource {
    pub fn draw_invocations(&self) -> u32 {
        self.draw_invocations
    }
}

impl Component for CountingSource {}

impl DebugGeometrySource for CountingSource {
    fn draw_debug_geometry(&mut self, debug: &mut DebugRenderer) {
        self.draw_invocations += 1;
        debug.add_line(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            colors::WHITE,
            false,
        );
    }
}

/// Application whose hooks fail on demand.
#[derive(Default)]
pub(crate) struct FaultyApp {
    pub scene: Option<Scene>,
    pub fail_start: bool,
    pub panic_on_update: bool,
    pub error_on_update: bool,
    update_invocations: u32,
    post_render_invocations: u32,
}

impl FaultyApp {
    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Default::default()
        }
    }

    pub fn failing_update() -> Self {
        Self {
            error_on_update: true,
            ..Default::default()
        }
    }

    pub fn panicking_update() -> Self {
        Self {
            panic_on_update: true,
            ..Default::default()
        }
    }

    pub fn update_invocations(&self) -> u32 {
        self.update_invocations
    }

    pub fn post_render_invocations(&self) -> u32 {
        self.post_render_invocations
    }
}

impl Application for FaultyApp {
    fn start(&mut self, _host: &mut dyn Host) -> anyhow::Result<()> {
        self.scene = Some(Scene::new());
        if self.fail_start {
            anyhow::bail!("start failed");
        }
        Ok(())
    }

    fn on_update(&mut self, _dt: Duration) -> anyhow::Result<()> {
        self.update_invocations += 1;
        if self.panic_on_update {
            panic!("update exploded");
        }
        if self.error_on_update {
            anyhow::bail!("update failed");
        }
        Ok(())
    }

    fn on_post_render_update(&mut self, _host: &mut dyn Host) -> anyhow::Result<()> {
        self.post_render_invocations += 1;
        Ok(())
    }

    fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    fn camera_node(&self) -> Option<NodeId> {
        None
    }
}

/// A small Rube scene: static ground, a dynamic box, a dynamic ball in hex
/// encoded floats and a revolute joint between box and ball.
pub(crate) const SMALL_LEVEL: &str = r#"{
    "gravity": { "x": 0, "y": -10 },
    "allowSleep": true,
    "stepsPerSecond": 60,
    "velocityIterations": 8,
    "positionIterations": 3,
    "body": [
        {
            "name": "ground",
            "type": 0,
            "position": 0,
            "fixture": [
                {
                    "friction": 0.5,
                    "chain": { "vertices": { "x": [-10, 10], "y": [0, 0] } }
                }
            ]
        },
        {
            "name": "box",
            "type": 2,
            "position": { "x": 0, "y": 5 },
            "angle": 0,
            "fixture": [
                {
                    "density": 1,
                    "polygon": {
                        "vertices": { "x": [-0.5, 0.5, 0.5, -0.5], "y": [-0.5, -0.5, 0.5, 0.5] }
                    }
                }
            ]
        },
        {
            "type": 2,
            "position": { "x": "40000000", "y": "40A00000" },
            "fixture": [
                { "density": 1, "circle": { "center": 0, "radius": "3F000000" } }
            ]
        },
        {
            "name": "lift",
            "type": 1,
            "position": { "x": 5, "y": 1 }
        }
    ],
    "joint": [
        {
            "type": "revolute",
            "name": "hinge",
            "bodyA": 1,
            "bodyB": 2,
            "anchorA": { "x": 0.5, "y": 0 },
            "anchorB": 0
        }
    ]
}"#;
