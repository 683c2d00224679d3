//! real3d-ngin
//!
//! A decoder for the Sega Model 3 Real3D scene graph. Each frame it walks the
//! scene descriptors, nodes, lists and polygon streams the game left in
//! emulated Real3D memory and replays them as draw calls on a pluggable
//! render backend. Texture uploads are decoded as they arrive and tracked in
//! a coarse atlas so polygons can find their textures.
//!
//! High-level modules
//! - `context`: the engine instance (`upload_texture`, `update_frame`)
//! - `config`: viewport, projection and traversal limits
//! - `data_structures`: address translation, memory views and record parsers
//! - `resources`: texture tile and model stream decoders
//! - `render`: the render backend trait and primitive types
//! - `backend`: a recording backend and, with `gpu`, a wgpu backend
//! - `pipelines`: wgpu pipelines for the wgpu backend
//! - `camera`: projection and handedness conversion
//! - `error`: decode fault types
//!

pub mod backend;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
#[cfg(feature = "gpu")]
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use context::{Context, UploadOutcome};
pub use data_structures::memory::MemoryMap;
pub use render::RenderBackend;
