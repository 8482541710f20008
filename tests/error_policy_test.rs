use std::{cell::RefCell, rc::Rc};

use instant::Duration;
use rube_flow::{
    error::{UnhandledError, UnhandledErrorPolicy},
    flow::{run_frame, start_app},
};

use crate::common::test_utils::{CountingHost, FaultyApp};

mod common;

const FRAME: Duration = Duration::from_millis(16);

#[test]
fn errors_are_marked_handled_and_counted() {
    let mut policy = UnhandledErrorPolicy::new();

    let handled = policy.handle(UnhandledError::from_error(
        "update",
        &anyhow::anyhow!("boom"),
    ));

    assert!(handled.handled);
    assert!(!handled.panicked);
    assert_eq!(handled.origin, "update");
    assert_eq!(policy.handled_count(), 1);
    assert!(!policy.should_terminate());
}

#[test]
fn guard_reports_context_chain() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut policy =
        UnhandledErrorPolicy::with_hook(move |e| sink.borrow_mut().push(e.message.clone()));

    let result: Option<()> = policy.guard("load", || {
        Err(anyhow::anyhow!("file missing").context("loading level"))
    });

    assert!(result.is_none());
    assert_eq!(*seen.borrow(), vec!["loading level: file missing".to_string()]);
}

#[test]
fn guard_passes_values_through() {
    let mut policy = UnhandledErrorPolicy::new();
    assert_eq!(policy.guard("update", || Ok(7)), Some(7));
    assert_eq!(policy.handled_count(), 0);
}

#[test]
fn panics_are_caught_like_errors() {
    let mut policy = UnhandledErrorPolicy::new();

    let result: Option<()> = policy.guard("post render update", || panic!("kaboom"));

    assert!(result.is_none());
    assert_eq!(policy.handled_count(), 1);
    assert!(!policy.should_terminate());
}

#[test]
fn hook_can_refuse_to_handle() {
    let mut policy = UnhandledErrorPolicy::with_hook(|e| e.handled = false);

    policy.guard::<()>("update", || anyhow::bail!("fatal"));

    assert_eq!(policy.handled_count(), 0);
    assert!(policy.should_terminate());
}

#[test]
fn frames_keep_running_after_a_failing_update() {
    let mut app = FaultyApp::failing_update();
    let mut host = CountingHost::default();
    let mut policy = UnhandledErrorPolicy::new();
    assert!(start_app(&mut app, &mut host, &mut policy));

    for _ in 0..3 {
        run_frame(&mut app, &mut host, &mut policy, FRAME);
    }

    assert_eq!(app.update_invocations(), 3);
    assert_eq!(app.post_render_invocations(), 3);
    assert_eq!(policy.handled_count(), 3);
    assert!(!policy.should_terminate());
}

#[test]
fn frames_keep_running_after_a_panicking_update() {
    let mut app = FaultyApp::panicking_update();
    let mut host = CountingHost::default();
    let mut policy = UnhandledErrorPolicy::new();
    start_app(&mut app, &mut host, &mut policy);

    run_frame(&mut app, &mut host, &mut policy, FRAME);
    run_frame(&mut app, &mut host, &mut policy, FRAME);

    assert_eq!(app.update_invocations(), 2);
    assert_eq!(app.post_render_invocations(), 2);
    assert_eq!(policy.handled_count(), 2);
}

#[test]
fn failed_start_is_handled() {
    let mut app = FaultyApp::failing_start();
    let mut host = CountingHost::default();
    let mut policy = UnhandledErrorPolicy::new();

    assert!(!start_app(&mut app, &mut host, &mut policy));
    assert_eq!(policy.handled_count(), 1);
}
