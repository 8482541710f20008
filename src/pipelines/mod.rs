//! Render pipelines. The sample only draws debug lines.
pub mod line;
