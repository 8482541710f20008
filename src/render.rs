//! The wgpu renderer behind [`Host`].
//!
//! The renderer owns the GPU [`Context`], the viewport slots and one camera
//! uniform per slot. Each frame it clears the target, draws the scene's
//! collected debug lines once per viewport that shows the scene, presents,
//! and finally clears the scene's [`DebugRenderer`].
//!
//! # Key types
//!
//! - [`Renderer`] is the real [`Host`]
//! - [`draw_viewport_bounds`] is the GPU free part of the renderer's debug
//!   geometry and is shared with tests

use std::{collections::HashMap, iter};

use wgpu::util::DeviceExt;

use crate::{
    camera::{Camera, CameraUniform},
    context::Context,
    data_structures::{
        octree::Aabb,
        scene_graph::{Scene, Transform2D},
    },
    debug::{DebugRenderer, DebugVertex, draw_visible_bounds},
    host::Host,
    pipelines::line::{camera_bind_group_layout, mk_line_pipeline},
    viewport::{Viewport, ViewportSlots},
};

/// The camera of `viewport` and where it sits, if the scene still has it.
pub fn viewport_camera<'s>(
    scene: &'s Scene,
    viewport: &Viewport,
) -> Option<(&'s Camera, Transform2D)> {
    if !viewport.shows(scene) {
        return None;
    }
    let camera = scene.node(viewport.camera())?.get_component::<Camera>()?;
    let transform = scene.world_transform(viewport.camera())?;
    Some((camera, transform))
}

/// World rectangle visible through `viewport`.
pub fn viewport_view_rect(scene: &Scene, viewport: &Viewport) -> Option<Aabb> {
    viewport_camera(scene, viewport).map(|(camera, transform)| camera.view_rect(&transform))
}

/// Emit the bounds of every drawable visible through any viewport that
/// shows `scene`. Returns the number of boxes emitted.
pub fn draw_viewport_bounds(slots: &ViewportSlots, scene: &mut Scene, depth_test: bool) -> usize {
    let rects: Vec<Aabb> = slots
        .iter()
        .filter_map(|(_, viewport)| viewport_view_rect(scene, viewport))
        .collect();
    rects
        .iter()
        .map(|rect| draw_visible_bounds(scene, rect, depth_test))
        .sum()
}

struct CameraResources {
    uniform: CameraUniform,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct Renderer {
    ctx: Context,
    viewports: ViewportSlots,
    cameras: HashMap<usize, CameraResources>,
    camera_bind_group_layout: wgpu::BindGroupLayout,
    depth_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
}

impl Renderer {
    pub fn new(ctx: Context) -> Self {
        let camera_bind_group_layout = camera_bind_group_layout(&ctx.device);
        let depth_pipeline =
            mk_line_pipeline(&ctx.device, &ctx.config, &camera_bind_group_layout, true);
        let overlay_pipeline =
            mk_line_pipeline(&ctx.device, &ctx.config, &camera_bind_group_layout, false);
        Self {
            ctx,
            viewports: ViewportSlots::new(),
            cameras: HashMap::new(),
            camera_bind_group_layout,
            depth_pipeline,
            overlay_pipeline,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn viewports(&self) -> &ViewportSlots {
        &self.viewports
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.ctx.resize(width, height)
    }

    pub fn request_redraw(&self) {
        self.ctx.window.request_redraw();
    }

    fn ensure_camera(&mut self, slot: usize) {
        let device = &self.ctx.device;
        let layout = &self.camera_bind_group_layout;
        self.cameras.entry(slot).or_insert_with(|| {
            let uniform = CameraUniform::default();
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
                label: Some("camera_bind_group"),
            });
            CameraResources {
                uniform,
                buffer,
                bind_group,
            }
        });
    }

    /// Draw one frame of `scene` and clear its debug geometry afterwards.
    pub fn render(&mut self, scene: &mut Scene) -> Result<(), wgpu::SurfaceError> {
        if !self.ctx.is_surface_configured() {
            return Ok(());
        }
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Upload every viewport camera before recording the pass.
        let visible: Vec<(usize, Viewport)> = self
            .viewports
            .iter()
            .filter(|(_, viewport)| viewport.shows(scene))
            .map(|(slot, viewport)| (slot, *viewport))
            .collect();
        for (slot, viewport) in visible.iter() {
            let Some((camera, transform)) = viewport_camera(scene, viewport) else {
                continue;
            };
            self.ensure_camera(*slot);
            if let Some(resources) = self.cameras.get_mut(slot) {
                resources.uniform.update_view_proj(camera, &transform);
                self.ctx.queue.write_buffer(
                    &resources.buffer,
                    0,
                    bytemuck::cast_slice(&[resources.uniform]),
                );
            }
        }

        let (depth_lines, overlay_lines) = match scene.get_component::<DebugRenderer>() {
            Some(debug) => (debug.lines(true).to_vec(), debug.lines(false).to_vec()),
            None => (Vec::new(), Vec::new()),
        };
        let vertices: Vec<DebugVertex> = depth_lines
            .iter()
            .chain(overlay_lines.iter())
            .copied()
            .collect();
        let vertex_buffer = (!vertices.is_empty()).then(|| {
            self.ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Debug Line Buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });
        let depth_count = depth_lines.len() as u32;
        let total_count = vertices.len() as u32;

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(vertex_buffer) = &vertex_buffer {
                let (width, height) = self.ctx.size();
                for (slot, viewport) in visible.iter() {
                    let Some(resources) = self.cameras.get(slot) else {
                        continue;
                    };
                    let (x, y, w, h) = viewport.rect.to_pixels(width, height);
                    render_pass.set_viewport(x, y, w, h, 0.0, 1.0);
                    render_pass.set_bind_group(0, &resources.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                    if depth_count > 0 {
                        render_pass.set_pipeline(&self.depth_pipeline);
                        render_pass.draw(0..depth_count, 0..1);
                    }
                    if total_count > depth_count {
                        render_pass.set_pipeline(&self.overlay_pipeline);
                        render_pass.draw(depth_count..total_count, 0..1);
                    }
                }
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();

        if let Some(debug) = scene.get_component_mut::<DebugRenderer>() {
            debug.clear();
        }
        Ok(())
    }
}

impl Host for Renderer {
    fn display_size(&self) -> (u32, u32) {
        self.ctx.size()
    }

    fn set_viewport(&mut self, index: usize, viewport: Viewport) {
        if self.viewports.set(index, viewport).is_some() {
            log::debug!("Replaced viewport in slot {}", index);
        }
        self.ensure_camera(index);
    }

    fn draw_debug_geometry(&mut self, scene: &mut Scene, depth_test: bool) {
        draw_viewport_bounds(&self.viewports, scene, depth_test);
    }
}
