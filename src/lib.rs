//! drape-ngin
//!
//! A cross-platform 3D garment customizer on a small flow-based wgpu engine.
//! A loaded glTF garment (or a placeholder box) is painted with a colour, a
//! fabric preset and an optional texture; the result can be exported as PNG,
//! shared as a link, embedded in other pages and previewed in AR. Runs
//! natively in a winit window and in the browser through WebGL.
//!
//! High-level modules
//! - `design`, `material`: the design being edited and the fabric presets
//! - `coordinator`: shared state, commands and the effects they produce
//! - `viewport`: scene renderer that paints the garment and tracks loads
//! - `panel`, `export`, `share`, `embed`, `ar`: the customizer's features
//! - `app`: the customizer flow binding state, scene and host together
//! - `platform`: host integration (clipboard, downloads, page text slots)
//! - `flow`: event loop, flows and async output handling
//! - `context`, `camera`, `render`, `pipelines`: GPU plumbing
//! - `data_structures`, `resources`: meshes, textures, scene graph, loaders
//!

pub mod app;
pub mod ar;
pub mod camera;
pub mod context;
pub mod coordinator;
pub mod data_structures;
pub mod design;
pub mod embed;
pub mod error;
pub mod export;
pub mod flow;
pub mod material;
pub mod panel;
pub mod pipelines;
pub mod platform;
pub mod render;
pub mod resources;
pub mod settings;
pub mod share;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;

// Re-exports commonly used types for convenience in downstream code.
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
