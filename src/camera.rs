//! Camera component, the orthographic camera rig and the camera uniform.
//!
//! The camera looks down +Z onto the XY plane; +X is right and +Y is up.
//! With an orthographic projection the visible world height is
//! `ortho_size / zoom` and the width follows from the aspect ratio.

use cgmath::{Basis2, Deg, Matrix4, Rad, Rotation, Rotation2, SquareMatrix, Vector2};

use crate::{
    config::SampleConfig,
    data_structures::{
        octree::Aabb,
        scene_graph::{Component, Transform2D},
    },
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub orthographic: bool,
    /// Visible world height at zoom 1.0 in orthographic mode.
    pub ortho_size: f32,
    pub zoom: f32,
    pub aspect_ratio: f32,
    pub fov: Deg<f32>,
    pub near_clip: f32,
    pub far_clip: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            orthographic: false,
            ortho_size: 20.0,
            zoom: 1.0,
            aspect_ratio: 1.0,
            fov: Deg(45.0),
            near_clip: 0.1,
            far_clip: 1000.0,
        }
    }
}

impl Component for Camera {}

impl Camera {
    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    /// Orthographic cameras clip from the eye position.
    pub fn effective_near_clip(&self) -> f32 {
        if self.orthographic { 0.0 } else { self.near_clip }
    }

    /// Half width and half height of the orthographic view volume.
    pub fn half_extents(&self) -> Vector2<f32> {
        let half_height = self.ortho_size / self.zoom * 0.5;
        Vector2::new(half_height * self.aspect_ratio, half_height)
    }

    /// World rectangle seen by an orthographic camera placed at `transform`.
    ///
    /// Rotation is folded in by bounding the rotated rectangle.
    pub fn view_rect(&self, transform: &Transform2D) -> Aabb {
        let half = self.half_extents();
        let basis = Basis2::from_angle(Rad(transform.rotation));
        let center = Vector2::new(transform.position.x, transform.position.y);
        let ex = basis.rotate_vector(Vector2::new(half.x, 0.0));
        let ey = basis.rotate_vector(Vector2::new(0.0, half.y));
        let reach = Vector2::new(ex.x.abs() + ey.x.abs(), ex.y.abs() + ey.y.abs());
        Aabb::from_center(center, reach)
    }

    pub fn projection(&self) -> Matrix4<f32> {
        if self.orthographic {
            let half = self.half_extents();
            cgmath::ortho(
                -half.x,
                half.x,
                -half.y,
                half.y,
                self.effective_near_clip(),
                self.far_clip,
            )
        } else {
            cgmath::perspective(self.fov, self.aspect_ratio, self.near_clip, self.far_clip)
        }
    }

    /// Eye space is right handed for cgmath, so z is flipped to keep the
    /// scene (in front of the camera along +Z) inside the clip range.
    pub fn view(&self, transform: &Transform2D) -> Matrix4<f32> {
        Matrix4::from_nonuniform_scale(1.0, 1.0, -1.0)
            * Matrix4::from_angle_z(Rad(-transform.rotation))
            * Matrix4::from_translation(-transform.position)
    }

    pub fn view_proj(&self, transform: &Transform2D) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection() * self.view(transform)
    }

    /// Convert a pixel position (origin top left) into world coordinates on
    /// the z = 0 plane.
    pub fn screen_to_world(
        &self,
        transform: &Transform2D,
        screen: Vector2<f32>,
        size: Vector2<f32>,
    ) -> Vector2<f32> {
        let ndc = Vector2::new(2.0 * screen.x / size.x - 1.0, 1.0 - 2.0 * screen.y / size.y);
        let half = self.half_extents();
        let local = Vector2::new(ndc.x * half.x, ndc.y * half.y);
        let rotated = Basis2::from_angle(Rad(transform.rotation)).rotate_vector(local);
        Vector2::new(
            transform.position.x + rotated.x,
            transform.position.y + rotated.y,
        )
    }
}

/// Derives orthographic size and zoom from the display resolution.
///
/// * `ortho_size = display_height * pixel_size`
/// * `zoom = min(display_width / design_width, display_height / design_height)`
///
/// Zero sized displays are not guarded here and produce zero or infinite
/// values; the shell never forwards a zero sized surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    pub design_width: f32,
    pub design_height: f32,
    pub pixel_size: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::from_config(&SampleConfig::default())
    }
}

impl CameraRig {
    pub fn from_config(config: &SampleConfig) -> Self {
        Self {
            design_width: config.design_width,
            design_height: config.design_height,
            pixel_size: config.pixel_size,
        }
    }

    pub fn ortho_size(&self, display_height: u32) -> f32 {
        display_height as f32 * self.pixel_size
    }

    pub fn zoom(&self, display_width: u32, display_height: u32) -> f32 {
        1.0 * f32::min(
            display_width as f32 / self.design_width,
            display_height as f32 / self.design_height,
        )
    }

    /// Switch `camera` to orthographic and size it for the display.
    pub fn apply(&self, camera: &mut Camera, display_width: u32, display_height: u32) {
        camera.orthographic = true;
        camera.ortho_size = self.ortho_size(display_height);
        camera.zoom = self.zoom(display_width, display_height);
        camera.set_aspect_ratio(display_width, display_height);
    }
}

/// The camera matrix as laid out in the uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
        }
    }
}

impl CameraUniform {
    pub fn update_view_proj(&mut self, camera: &Camera, transform: &Transform2D) {
        self.view_proj = camera.view_proj(transform).into();
    }
}

