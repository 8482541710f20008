use cgmath::{Vector2, Vector3};
use rube_flow::{
    camera::{Camera, CameraRig},
    config::SampleConfig,
    data_structures::scene_graph::Transform2D,
};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn ortho_size_follows_display_height() {
    let rig = CameraRig::default();
    assert!(close(rig.ortho_size(720), 7.2));
    assert!(close(rig.ortho_size(1080), 10.8));
}

#[test]
fn zoom_is_one_at_design_resolution() {
    let rig = CameraRig::default();
    assert!(close(rig.zoom(1080, 720), 1.0));
}

#[test]
fn zoom_is_limited_by_the_smaller_ratio() {
    let rig = CameraRig::default();
    // Twice as wide, same height: height ratio wins.
    assert!(close(rig.zoom(2160, 720), 1.0));
    assert!(close(rig.zoom(540, 720), 0.5));
    assert!(close(rig.zoom(2160, 1440), 2.0));
}

#[test]
fn rig_reads_design_values_from_config() {
    let config = SampleConfig {
        design_width: 800.0,
        design_height: 600.0,
        pixel_size: 0.02,
        ..Default::default()
    };
    let rig = CameraRig::from_config(&config);
    assert!(close(rig.ortho_size(600), 12.0));
    assert!(close(rig.zoom(800, 600), 1.0));
}

#[test]
fn apply_makes_the_camera_orthographic() {
    let mut camera = Camera::default();
    assert!(!camera.orthographic);

    CameraRig::default().apply(&mut camera, 1920, 1080);

    assert!(camera.orthographic);
    assert!(close(camera.ortho_size, 10.8));
    assert!(close(camera.zoom, 1.5));
    assert!(close(camera.aspect_ratio, 1920.0 / 1080.0));
    assert_eq!(camera.effective_near_clip(), 0.0);
}

#[test]
fn view_rect_covers_ortho_size_over_zoom() {
    let mut camera = Camera::default();
    CameraRig::default().apply(&mut camera, 1080, 720);
    let transform = Transform2D {
        position: Vector3::new(1.0, 2.0, -0.1),
        ..Default::default()
    };

    let rect = camera.view_rect(&transform);

    assert!(close(rect.max.y - rect.min.y, 7.2));
    assert!(close(rect.max.x - rect.min.x, 7.2 * 1.5));
    assert!(close(rect.center().x, 1.0));
    assert!(close(rect.center().y, 2.0));
}

#[test]
fn screen_corners_map_to_view_rect_corners() {
    let mut camera = Camera::default();
    CameraRig::default().apply(&mut camera, 1080, 720);
    let transform = Transform2D::default();
    let size = Vector2::new(1080.0, 720.0);

    let top_left = camera.screen_to_world(&transform, Vector2::new(0.0, 0.0), size);
    let centre = camera.screen_to_world(&transform, Vector2::new(540.0, 360.0), size);
    let rect = camera.view_rect(&transform);

    assert!(close(top_left.x, rect.min.x));
    assert!(close(top_left.y, rect.max.y));
    assert!(close(centre.x, 0.0));
    assert!(close(centre.y, 0.0));
}
