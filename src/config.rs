//! Engine configuration.
//!
//! Everything has a default matching the reference hardware viewport, so a
//! [`crate::context::Context`] works out of the box. Adjust through
//! `Context::configure`:
//!
//! ```
//! use real3d_ngin::{backend::RecordingBackend, context::Context, config::AtlasPolicy};
//!
//! let mut ctx = Context::new(RecordingBackend::new());
//! ctx.configure(|cfg| {
//!     cfg.atlas_policy = AtlasPolicy::RefCounted;
//!     cfg.limits.max_depth = 32;
//! });
//! ```

pub use crate::data_structures::atlas::AtlasPolicy;

/// Caps on traversal work per frame. Scene data carries no lengths, so every
/// loop that follows links from memory is bounded by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_descriptors: usize,
    pub max_chain_length: usize,
    pub max_depth: usize,
    pub max_nodes_per_frame: usize,
    pub max_list_entries: usize,
    pub max_polygons_per_model: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_descriptors: 4096,
            max_chain_length: 4096,
            max_depth: 64,
            max_nodes_per_frame: 65536,
            max_list_entries: 4096,
            max_polygons_per_model: 65536,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub viewport: (u32, u32),
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub limits: Limits,
    /// Only read when the context is created or configured; changing it
    /// resets the atlas.
    pub atlas_policy: AtlasPolicy,
    pub clear_depth: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: (496, 384),
            fovy_degrees: 45.0,
            znear: 0.1,
            zfar: 100000.0,
            limits: Limits::default(),
            atlas_policy: AtlasPolicy::default(),
            clear_depth: true,
        }
    }
}
