//! Error kinds raised while decoding Real3D memory.
//!
//! Decode errors never escape a frame: the traversal logs them, tallies them
//! in [`FrameStats`](crate::data_structures::scene_graph::FrameStats) and
//! keeps walking the remaining branches.

use thiserror::Error;

use crate::data_structures::address::Region;

/// Coarse classification used for per-frame fault counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Translator miss or a read past the end of a region. The branch is pruned.
    UnmappedAddress,
    /// Invalid child class or alternate list address. Only the node's descent is lost.
    MalformedNode,
    /// A descriptor resolves to a null entry. Ends the descriptor chain.
    UninitializedScene,
    /// A chain, list, model or recursion never reached its stop condition.
    StreamOverrun,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("address {0:#010X} does not map to any Real3D region")]
    UnmappedAddress(u32),
    #[error("read of {len} bytes at {region:?}+{offset:#X} is outside the region")]
    OutOfBounds {
        region: Region,
        offset: usize,
        len: usize,
    },
    #[error("malformed node at {address:#010X}: {reason}")]
    MalformedNode { address: u32, reason: &'static str },
    #[error("malformed polygon at {region:?}+{offset:#X}: reuse code {code:#X}")]
    MalformedPolygon {
        region: Region,
        offset: usize,
        code: u32,
    },
    #[error("scene descriptor at {offset:#X} has no entry node")]
    UninitializedScene { offset: usize },
    #[error("{what} exceeded {limit} iterations")]
    StreamOverrun { what: &'static str, limit: usize },
    #[error("node recursion deeper than {0}")]
    DepthExceeded(usize),
    #[error("per-frame node budget of {0} exhausted")]
    BudgetExhausted(usize),
}

impl DecodeError {
    pub fn kind(&self) -> FaultKind {
        match self {
            DecodeError::UnmappedAddress(_) | DecodeError::OutOfBounds { .. } => {
                FaultKind::UnmappedAddress
            }
            DecodeError::MalformedNode { .. } | DecodeError::MalformedPolygon { .. } => {
                FaultKind::MalformedNode
            }
            DecodeError::UninitializedScene { .. } => FaultKind::UninitializedScene,
            DecodeError::StreamOverrun { .. }
            | DecodeError::DepthExceeded(_)
            | DecodeError::BudgetExhausted(_) => FaultKind::StreamOverrun,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("texture upload needs {needed} bytes but only {available} were supplied")]
    Truncated { needed: usize, available: usize },
}
