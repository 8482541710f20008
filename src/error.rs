//! Error types and the unhandled-error boundary.
//!
//! Everything the library can reject is a [`SampleError`]. Operational code
//! returns `anyhow::Result` and attaches context on the way up.
//!
//! Errors and panics that escape an application callback end up in
//! [`UnhandledErrorPolicy`]. The policy logs the full cause chain, marks the
//! error handled and lets the frame loop continue. An optional hook sees each
//! error first and may clear the `handled` flag, in which case the shell
//! shuts the event loop down after the current callback.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use crate::data_structures::scene_graph::{NodeId, SceneId};

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("node {0:?} does not exist in scene {1:?}")]
    UnknownNode(NodeId, SceneId),
    #[error("node {0:?} has no camera component")]
    MissingCamera(NodeId),
    #[error("scene {0:?} has no {1} component")]
    MissingComponent(SceneId, &'static str),
    #[error("joint {joint} references body {index}, but the scene only has {count} bodies")]
    BodyIndexOutOfRange {
        joint: usize,
        index: usize,
        count: usize,
    },
    #[error("'{0}' is not a hex encoded float")]
    InvalidHexFloat(String),
    #[error("polygon fixture '{0}' needs at least two vertices")]
    DegeneratePolygon(String),
    #[error("vertex list has {xs} x values but {ys} y values")]
    MismatchedVertices { xs: usize, ys: usize },
}

/// An error or panic caught at the application boundary.
#[derive(Debug, Clone)]
pub struct UnhandledError {
    /// Where it was caught, e.g. `"start"` or `"post render update"`.
    pub origin: String,
    pub message: String,
    pub panicked: bool,
    pub handled: bool,
}

impl UnhandledError {
    pub fn from_error(origin: &str, error: &anyhow::Error) -> Self {
        Self {
            origin: origin.to_string(),
            // `{:#}` prints the whole context chain on one line.
            message: format!("{:#}", error),
            panicked: false,
            handled: false,
        }
    }

    pub fn from_panic(origin: &str, payload: Box<dyn Any + Send>) -> Self {
        Self {
            origin: origin.to_string(),
            message: panic_message(payload.as_ref()),
            panicked: true,
            handled: false,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

type Hook = Box<dyn FnMut(&mut UnhandledError)>;

#[derive(Default)]
pub struct UnhandledErrorPolicy {
    hook: Option<Hook>,
    handled: usize,
    terminate: bool,
}

impl UnhandledErrorPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` on every caught error after it has been marked handled.
    pub fn with_hook(hook: impl FnMut(&mut UnhandledError) + 'static) -> Self {
        Self {
            hook: Some(Box::new(hook)),
            ..Default::default()
        }
    }

    pub fn handle(&mut self, mut error: UnhandledError) -> UnhandledError {
        log::error!(
            "Unhandled {} in {}: {}",
            if error.panicked { "panic" } else { "error" },
            error.origin,
            error.message
        );
        error.handled = true;
        if let Some(hook) = self.hook.as_mut() {
            hook(&mut error);
        }
        if error.handled {
            self.handled += 1;
        } else {
            log::error!("Error in {} was not handled, shutting down", error.origin);
            self.terminate = true;
        }
        error
    }

    /// Run `f`, routing an error or a panic through [`Self::handle`].
    ///
    /// Returns `None` when `f` failed.
    pub fn guard<T>(
        &mut self,
        origin: &str,
        f: impl FnOnce() -> anyhow::Result<T>,
    ) -> Option<T> {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                self.handle(UnhandledError::from_error(origin, &e));
                None
            }
            Err(payload) => {
                self.handle(UnhandledError::from_panic(origin, payload));
                None
            }
        }
    }

    pub fn handled_count(&self) -> usize {
        self.handled
    }

    pub fn should_terminate(&self) -> bool {
        self.terminate
    }
}

/// Route panic messages through `log` so they share the sink of every other
/// record. The previous hook still runs when no logger accepts errors.
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if log::log_enabled!(log::Level::Error) {
            let location = info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_else(|| "unknown location".to_string());
            log::error!("panic at {}: {}", location, panic_message(info.payload()));
        } else {
            previous(info);
        }
    }));
}
