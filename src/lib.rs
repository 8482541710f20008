//! rube-flow
//!
//! A small 2D sample that boots a scene, loads a physics world exported by
//! the R.U.B.E. level editor and draws it as a per-frame debug overlay. It
//! runs natively and on the web.
//!
//! High-level modules
//! - `sample`: the application itself (scene, camera, viewport, debug draw, level load)
//! - `flow`: application shell, event loop and the per-frame order of work
//! - `host`: the seams the sample talks through (`Host`, `LevelLoader`)
//! - `camera`: orthographic camera component and the display driven camera rig
//! - `viewport`: viewport descriptions and the renderer's viewport slots
//! - `data_structures`: scene graph, spatial index and GPU textures
//! - `debug`: debug line collector, debug-draw subscriber and frame stats
//! - `physics`: rapier backed 2D physics world and the touch bridge
//! - `resources`: asset loading and the Rube level loader
//! - `context`, `pipelines`, `render`: the wgpu renderer
//! - `config`, `error`: configuration and the unhandled-error boundary
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod debug;
pub mod error;
pub mod flow;
pub mod host;
pub mod physics;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod sample;
pub mod viewport;

use std::pin::Pin;

use crate::{
    config::{CONFIG_FILE, SampleConfig},
    resources::rube::RubeLoader,
    sample::RubeSample,
};

type SampleFuture = Pin<Box<dyn Future<Output = anyhow::Result<RubeSample<RubeLoader>>>>>;

/// Run the Rube sample with `config`. The level is loaded from the asset
/// directory once the window exists. A level that cannot be read or parsed
/// still starts the sample; the load error goes through the unhandled-error
/// policy.
pub fn run_sample(config: SampleConfig) -> anyhow::Result<()> {
    let sample_config = config.clone();
    flow::run(
        config,
        Box::new(move || -> SampleFuture {
            Box::pin(async move {
                let loader = RubeLoader::from_file(&sample_config.level).await;
                Ok(RubeSample::new(sample_config, loader))
            })
        }),
    )
}

/// Native entry point: read the optional config file, then run the sample.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_native() -> anyhow::Result<()> {
    flow::init_logging();
    let config = tokio::runtime::Runtime::new()?.block_on(SampleConfig::load_or_default(CONFIG_FILE));
    run_sample(config)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    flow::init_logging();
    let config = SampleConfig::load_or_default(CONFIG_FILE).await;
    run_sample(config).map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{:#}", e)))
}
