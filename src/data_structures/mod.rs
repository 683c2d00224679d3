//! Real3D memory structures and the decoders that walk them.
//!
//! - `address` maps protocol addresses onto the four backing memories
//! - `memory` gives bounds-checked, endian-aware word access to them
//! - `numeric` converts fixed-point and raw float words
//! - `matrix` reads the per-scene matrix table
//! - `node` and `polygon` parse the fixed-size records
//! - `atlas` tracks which texture covers which part of the texture sheet
//! - `transform` is a CPU model-view stack for backends without one
//! - `scene_graph` and `block` walk descriptors, nodes and lists
//! - `texture` wraps GPU textures (feature `gpu`)

pub mod address;
pub mod atlas;
pub mod block;
pub mod matrix;
pub mod memory;
pub mod node;
pub mod numeric;
pub mod polygon;
pub mod scene_graph;
#[cfg(feature = "gpu")]
pub mod texture;
pub mod transform;
