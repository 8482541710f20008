use instant::Duration;
use rube_flow::{
    config::SampleConfig,
    error::UnhandledErrorPolicy,
    flow::{Application, PointerPhase, handle_pointer, run_frame, start_app},
    physics::touch::{MOUSE_POINTER, PhysicsTouches},
    resources::rube::RubeLoader,
    sample::RubeSample,
};
use winit::dpi::PhysicalPosition;

use crate::common::test_utils::{CountingHost, SMALL_LEVEL};

mod common;

const DISPLAY: (u32, u32) = (1080, 720);

fn started_sample() -> (RubeSample<RubeLoader>, CountingHost, UnhandledErrorPolicy) {
    let loader = RubeLoader::from_str(SMALL_LEVEL).expect("level");
    let mut sample = RubeSample::new(SampleConfig::default(), loader);
    let mut host = CountingHost::new(DISPLAY.0, DISPLAY.1);
    let mut policy = UnhandledErrorPolicy::new();
    assert!(start_app(&mut sample, &mut host, &mut policy));
    (sample, host, policy)
}

fn holding(sample: &RubeSample<RubeLoader>) -> bool {
    sample
        .scene()
        .and_then(|scene| scene.get_component::<PhysicsTouches>())
        .is_some_and(|touches| touches.is_holding(MOUSE_POINTER))
}

// The box sits at world (0, 5). With the camera at the origin and a visible
// height of 7.2 that is 140 pixels above the top edge.
const BOX_ON_SCREEN: PhysicalPosition<f64> = PhysicalPosition::new(540.0, -140.0);

#[test]
fn pressing_on_a_body_grabs_it_until_release() {
    let (mut sample, _, _) = started_sample();

    handle_pointer(&mut sample, DISPLAY, MOUSE_POINTER, PointerPhase::Down, BOX_ON_SCREEN);
    assert!(holding(&sample));

    handle_pointer(
        &mut sample,
        DISPLAY,
        MOUSE_POINTER,
        PointerPhase::Up,
        BOX_ON_SCREEN,
    );
    assert!(!holding(&sample));
}

#[test]
fn pressing_empty_space_grabs_nothing() {
    let (mut sample, _, _) = started_sample();

    handle_pointer(
        &mut sample,
        DISPLAY,
        MOUSE_POINTER,
        PointerPhase::Down,
        PhysicalPosition::new(1000.0, 700.0),
    );

    assert!(!holding(&sample));
}

#[test]
fn held_body_follows_the_pointer() {
    let (mut sample, mut host, mut policy) = started_sample();
    let box_id = sample
        .scene()
        .and_then(|scene| scene.find_child("box"))
        .expect("box");

    handle_pointer(&mut sample, DISPLAY, MOUSE_POINTER, PointerPhase::Down, BOX_ON_SCREEN);
    // Drag one world unit to the right.
    handle_pointer(
        &mut sample,
        DISPLAY,
        MOUSE_POINTER,
        PointerPhase::Move,
        PhysicalPosition::new(640.0, -140.0),
    );
    for _ in 0..10 {
        run_frame(&mut sample, &mut host, &mut policy, Duration::from_millis(16));
    }

    let x = sample
        .scene()
        .and_then(|scene| scene.node(box_id))
        .map(|node| node.transform.position.x)
        .expect("box x");
    assert!(x > 0.1, "box should move right, got {}", x);
    assert_eq!(policy.handled_count(), 0);
    assert!(sample.scene_mut().is_some());
}
