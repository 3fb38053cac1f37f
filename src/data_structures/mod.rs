//! Engine data structures: meshes, materials, textures, scene graphs and instances.
//!
//! - `model` contains vertex layouts and the GPU side of meshes and materials
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-primitive transformation data
//! - `scene_graph` is the CPU-side node tree of a garment

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
