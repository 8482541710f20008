//! Engine data structures: scene graph, spatial index, and GPU textures.
//!
//! - `scene_graph` holds nodes, transforms and components
//! - `octree` is the spatial index of drawable bounds
//! - `texture` contains the depth buffer used by the renderer

pub mod octree;
pub mod scene_graph;
pub mod texture;
