//! Sample configuration.
//!
//! [`SampleConfig`] carries every tunable of the sample. All fields have
//! defaults, so a config file only needs to name what it changes:
//!
//! ```json
//! { "level": "bridge.json", "draw_debug": true }
//! ```

use anyhow::Context;
use serde::Deserialize;

use crate::resources::load_string;

/// Optional config file in the asset directory.
pub const CONFIG_FILE: &str = "sample.json";

/// Name of the node that holds the main camera.
pub const MAIN_CAMERA_NODE_NAME: &str = "MainCamera";

/// Width of the design resolution in pixels. A 1080x720 display gets zoom 1.0.
pub const DESIGN_WIDTH: f32 = 1080.0;

/// Height of the design resolution in pixels.
pub const DESIGN_HEIGHT: f32 = 720.0;

/// World units per pixel used to size the orthographic camera.
pub const PIXEL_SIZE: f32 = 0.01;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    pub title: String,
    /// Rube scene to load, relative to the asset directory.
    pub level: String,
    pub design_width: f32,
    pub design_height: f32,
    pub pixel_size: f32,
    pub camera_position: [f32; 3],
    pub draw_debug: bool,
    pub show_hud: bool,
    pub clear_colour: [f64; 4],
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            title: "Rube Sample".to_string(),
            level: "level.json".to_string(),
            design_width: DESIGN_WIDTH,
            design_height: DESIGN_HEIGHT,
            pixel_size: PIXEL_SIZE,
            camera_position: [0.0, 0.0, -0.10],
            draw_debug: true,
            show_hud: cfg!(debug_assertions),
            clear_colour: [0.1, 0.1, 0.12, 1.0],
        }
    }
}

impl SampleConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file from the asset directory.
    pub async fn load(file_name: &str) -> anyhow::Result<Self> {
        let json = load_string(file_name).await?;
        Self::from_json(&json).with_context(|| format!("parsing config {}", file_name))
    }

    /// Like [`SampleConfig::load`], but falls back to the defaults. A missing
    /// file is expected; anything else is logged as a warning.
    pub async fn load_or_default(file_name: &str) -> Self {
        match Self::load(file_name).await {
            Ok(config) => config,
            Err(e) if is_missing(&e) => {
                log::debug!("No config file {}, using defaults", file_name);
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring config file {}: {:#}", file_name, e);
                Self::default()
            }
        }
    }

    pub fn clear_colour(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_colour;
        wgpu::Color { r, g, b, a }
    }
}

/// Whether `error` means the file does not exist.
fn is_missing(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return io.kind() == std::io::ErrorKind::NotFound;
        }
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(http) = cause.downcast_ref::<reqwest::Error>() {
                return http.status() == Some(reqwest::StatusCode::NOT_FOUND);
            }
        }
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = SampleConfig::from_json(r#"{ "level": "bridge.json" }"#).unwrap();
        assert_eq!(config.level, "bridge.json");
        assert_eq!(config.design_width, DESIGN_WIDTH);
        assert!(config.draw_debug);
    }

    #[test]
    fn only_not_found_counts_as_missing() {
        let not_found = anyhow::Error::new(std::io::Error::from(std::io::ErrorKind::NotFound))
            .context("reading asset sample.json");
        let denied = anyhow::Error::new(std::io::Error::from(
            std::io::ErrorKind::PermissionDenied,
        ))
        .context("reading asset sample.json");

        assert!(is_missing(&not_found));
        assert!(!is_missing(&denied));
        assert!(!is_missing(&anyhow::anyhow!("expected value at line 1")));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[tokio::test]
    async fn missing_file_loads_the_defaults() {
        let config = SampleConfig::load_or_default("no_such_config.json").await;
        assert_eq!(config.level, SampleConfig::default().level);
    }
}
