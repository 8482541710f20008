//! The Rube sample application.
//!
//! Start up is strictly linear: scene, camera, viewport, debug-draw
//! subscription, level load. Afterwards the per-frame update hook does
//! nothing and the post-render-update hands off to the debug-draw
//! subscriber.

use cgmath::Vector3;
use instant::Duration;

use crate::{
    camera::{Camera, CameraRig},
    config::{MAIN_CAMERA_NODE_NAME, SampleConfig},
    data_structures::{
        octree::Octree,
        scene_graph::{NodeId, Scene},
    },
    debug::{DebugRenderer, hud::DebugHud, subscriber::DebugDrawSubscriber},
    flow::Application,
    host::{Host, LevelLoader},
    physics::touch::PhysicsTouches,
    viewport::Viewport,
};

pub struct RubeSample<L: LevelLoader> {
    config: SampleConfig,
    rig: CameraRig,
    loader: L,
    scene: Option<Scene>,
    camera_node: Option<NodeId>,
    debug_draw: Option<DebugDrawSubscriber>,
    hud: DebugHud,
}

impl<L: LevelLoader> RubeSample<L> {
    pub fn new(config: SampleConfig, loader: L) -> Self {
        Self {
            rig: CameraRig::from_config(&config),
            config,
            loader,
            scene: None,
            camera_node: None,
            debug_draw: None,
            hud: DebugHud::new(),
        }
    }

    pub fn config(&self) -> &SampleConfig {
        &self.config
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn debug_draw(&self) -> Option<&DebugDrawSubscriber> {
        self.debug_draw.as_ref()
    }

    /// Fresh scene with a spatial index, a debug line collector and the
    /// touch bridge on its root.
    pub fn create_scene(&mut self) -> &mut Scene {
        let mut scene = Scene::new();
        scene.create_component(Octree::default());
        scene.create_component(DebugRenderer::new());
        scene.create_component(PhysicsTouches::new());
        log::debug!("Created scene {:?}", scene.id());
        self.scene.insert(scene)
    }

    /// Orthographic camera sized for the host's display.
    pub fn create_camera(&mut self, host: &dyn Host) -> anyhow::Result<NodeId> {
        let scene = self
            .scene
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("create_scene must run before create_camera"))?;
        let node_id = scene.create_child(MAIN_CAMERA_NODE_NAME);
        let (width, height) = host.display_size();
        let mut camera = Camera::default();
        self.rig.apply(&mut camera, width, height);
        log::info!(
            "Camera for {}x{}: ortho size {}, zoom {}",
            width,
            height,
            camera.ortho_size,
            camera.zoom
        );

        let node = scene
            .node_mut(node_id)
            .ok_or_else(|| anyhow::anyhow!("camera node vanished"))?;
        node.set_position(Vector3::from(self.config.camera_position));
        node.create_component(camera);
        self.camera_node = Some(node_id);
        Ok(node_id)
    }

    /// Show the scene through the main camera in viewport slot 0.
    pub fn setup_viewport(&mut self, host: &mut dyn Host) -> anyhow::Result<()> {
        let (Some(scene), Some(camera)) = (self.scene.as_ref(), self.camera_node) else {
            anyhow::bail!("scene and camera must exist before the viewport");
        };
        host.set_viewport(0, Viewport::new(scene, camera)?);
        Ok(())
    }

    pub fn subscribe_to_events(&mut self) {
        self.debug_draw = Some(DebugDrawSubscriber::new(self.config.draw_debug));
    }

    pub fn load_world(&mut self) -> anyhow::Result<()> {
        let scene = self
            .scene
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("no scene to load the level into"))?;
        self.loader.load_world(scene)
    }

    /// Keep the camera undistorted after the window changed shape. Zoom and
    /// ortho size stay as computed at start.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        let (Some(scene), Some(camera)) = (self.scene.as_mut(), self.camera_node) else {
            return;
        };
        if let Some(camera) = scene
            .node_mut(camera)
            .and_then(|node| node.get_component_mut::<Camera>())
        {
            camera.set_aspect_ratio(width, height);
        }
    }
}

impl<L: LevelLoader> Application for RubeSample<L> {
    fn start(&mut self, host: &mut dyn Host) -> anyhow::Result<()> {
        if self.config.show_hud {
            self.hud.show();
        }
        self.create_scene();
        self.create_camera(host)?;
        self.setup_viewport(host)?;
        self.subscribe_to_events();
        self.load_world()
    }

    fn on_update(&mut self, _dt: Duration) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_post_render_update(&mut self, host: &mut dyn Host) -> anyhow::Result<()> {
        if let (Some(subscriber), Some(scene)) = (self.debug_draw.as_mut(), self.scene.as_mut()) {
            subscriber.on_post_render_update(scene, host);
        }
        Ok(())
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        RubeSample::on_resize(self, width, height);
    }

    fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    fn camera_node(&self) -> Option<NodeId> {
        self.camera_node
    }

    fn hud(&mut self) -> Option<&mut DebugHud> {
        Some(&mut self.hud)
    }
}
