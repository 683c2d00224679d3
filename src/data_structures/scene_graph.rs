//! Scene graph walking.
//!
//! The Real3D keeps a chain of scene descriptors at the start of culling RAM
//! B. Each descriptor names one entry node and the matrix table its nodes
//! select from. This module holds the descriptor record, the state machine
//! that follows the chain, and the per-frame [`Traversal`] that the node and
//! list decoders in [`super::block`] run on.

use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::{
    config::Limits,
    data_structures::{
        address::{Pointer, Region},
        atlas::Atlas,
        matrix::MatrixTable,
        memory::MemoryMap,
    },
    error::{DecodeError, FaultKind},
    render::{Primitive, PrimitiveKind, RenderBackend},
};

/// Words of a descriptor the decoder reads, up to and including the matrix base.
pub const DESCRIPTOR_WORDS: usize = 0x17;

/// Next-link value that ends the descriptor chain.
pub const STOP: u32 = 0x0100_0000;

const NEXT_WORD: usize = 0x01;
const ENTRY_WORD: usize = 0x02;
const MATRIX_BASE_WORD: usize = 0x16;

/// What a descriptor's entry word points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass {
    Block,
    /// A list entry. Recognized but never drawn.
    List,
    Unknown(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneDescriptor {
    /// Byte offset of the descriptor in culling RAM B.
    pub offset: usize,
    pub words: [u32; DESCRIPTOR_WORDS],
}

impl SceneDescriptor {
    pub fn read(memory: &MemoryMap<'_>, offset: usize) -> Result<Self, DecodeError> {
        let words = memory.words_le::<DESCRIPTOR_WORDS>(Pointer::new(Region::CullingB, offset))?;
        Ok(Self { offset, words })
    }

    pub fn next_link(&self) -> u32 {
        self.words[NEXT_WORD]
    }

    pub fn is_last(&self) -> bool {
        self.next_link() == STOP
    }

    /// Culling RAM B offset of the following descriptor.
    pub fn next_offset(&self) -> usize {
        (self.next_link() & 0xFFFF) as usize * 4
    }

    pub fn entry(&self) -> u32 {
        self.words[ENTRY_WORD]
    }

    /// Culling RAM B offset of the entry node. Zero means the scene has not
    /// been written yet.
    pub fn entry_offset(&self) -> usize {
        (self.entry() & 0xFFFF) as usize * 4
    }

    pub fn entry_class(&self) -> EntryClass {
        match (self.entry() >> 24) & 0xFE {
            0x00 => EntryClass::Block,
            0x04 => EntryClass::List,
            _ => EntryClass::Unknown(self.entry()),
        }
    }

    pub fn matrix_base(&self) -> u32 {
        self.words[MATRIX_BASE_WORD]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// Next descriptor is at this culling RAM B offset.
    Active(usize),
    Stopped,
}

/// Follows the descriptor chain one descriptor per [`SceneWalker::step`].
///
/// The chain is written by the game and may be garbage or cyclic while it is
/// being built, so the walker stops after `limit` descriptors.
#[derive(Debug, Clone)]
pub struct SceneWalker {
    state: WalkState,
    visited: usize,
    limit: usize,
}

impl SceneWalker {
    pub fn new(limit: usize) -> Self {
        Self {
            state: WalkState::Active(0),
            visited: 0,
            limit,
        }
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Reads the current descriptor and advances. `Ok(None)` once stopped.
    /// Every error also stops the walker.
    pub fn step(&mut self, memory: &MemoryMap<'_>) -> Result<Option<SceneDescriptor>, DecodeError> {
        let WalkState::Active(offset) = self.state else {
            return Ok(None);
        };
        self.state = WalkState::Stopped;
        if self.visited >= self.limit {
            return Err(DecodeError::StreamOverrun {
                what: "scene descriptor chain",
                limit: self.limit,
            });
        }
        self.visited += 1;

        let descriptor = SceneDescriptor::read(memory, offset)?;
        trace!("scene descriptor at {offset:#X}: {:08X?}", descriptor.words);
        // a null entry ends the chain, also after earlier descriptors drew
        if descriptor.entry_offset() == 0 {
            return Err(DecodeError::UninitializedScene { offset });
        }
        if !descriptor.is_last() {
            self.state = WalkState::Active(descriptor.next_offset());
        }
        Ok(Some(descriptor))
    }
}

/// Counters for one decoded frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub descriptors: usize,
    pub nodes: usize,
    pub lists: usize,
    /// Scene-level list entries that were recognized and skipped.
    pub inert_lists: usize,
    pub models: usize,
    pub triangles: usize,
    pub quads: usize,
    pub faults: HashMap<FaultKind, usize>,
    pub last_fault: Option<DecodeError>,
}

impl FrameStats {
    pub fn record(&mut self, fault: DecodeError) {
        *self.faults.entry(fault.kind()).or_insert(0) += 1;
        self.last_fault = Some(fault);
    }

    pub fn fault_count(&self, kind: FaultKind) -> usize {
        self.faults.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_faults(&self) -> usize {
        self.faults.values().sum()
    }

    pub fn primitives(&self) -> usize {
        self.triangles + self.quads
    }
}

/// Everything a decode pass needs, borrowed for one frame.
pub struct Traversal<'f, 'm, B: RenderBackend + ?Sized> {
    pub(crate) memory: MemoryMap<'m>,
    pub(crate) backend: &'f mut B,
    pub(crate) atlas: &'f Atlas,
    pub(crate) limits: Limits,
    pub(crate) stats: &'f mut FrameStats,
    pub(crate) matrix_base: u32,
    pub(crate) matrices: Option<MatrixTable<'m>>,
    pub(crate) nodes_left: usize,
}

impl<'f, 'm, B: RenderBackend + ?Sized> Traversal<'f, 'm, B> {
    pub fn new(
        memory: MemoryMap<'m>,
        backend: &'f mut B,
        atlas: &'f Atlas,
        limits: Limits,
        stats: &'f mut FrameStats,
    ) -> Self {
        Self {
            memory,
            backend,
            atlas,
            limits,
            stats,
            matrix_base: 0,
            matrices: None,
            nodes_left: limits.max_nodes_per_frame,
        }
    }

    pub(crate) fn fault(&mut self, fault: DecodeError) {
        match fault.kind() {
            FaultKind::UninitializedScene => debug!("{fault}"),
            _ => warn!("{fault}"),
        }
        self.stats.record(fault);
    }

    /// Walks the descriptor chain and decodes every block entry.
    pub fn draw_scene(&mut self) {
        let mut walker = SceneWalker::new(self.limits.max_descriptors);
        loop {
            match walker.step(&self.memory) {
                Ok(Some(descriptor)) => {
                    self.stats.descriptors += 1;
                    self.draw_descriptor(&descriptor);
                }
                Ok(None) => break,
                Err(e) => {
                    self.fault(e);
                    break;
                }
            }
        }
    }

    fn draw_descriptor(&mut self, descriptor: &SceneDescriptor) {
        self.set_matrix_base(descriptor.matrix_base());
        let entry = Pointer::new(Region::CullingB, descriptor.entry_offset());
        match descriptor.entry_class() {
            EntryClass::Block => {
                if let Err(e) = self.decode_block(entry, 0) {
                    self.fault(e);
                }
            }
            EntryClass::List => {
                // list entries at scene level are never drawn
                debug!("skipping scene list at {entry:?}");
                self.stats.inert_lists += 1;
            }
            EntryClass::Unknown(_) => self.fault(DecodeError::MalformedNode {
                address: entry.address(),
                reason: "unknown scene descriptor entry class",
            }),
        }
    }

    fn set_matrix_base(&mut self, base: u32) {
        self.matrix_base = base;
        self.matrices = self
            .memory
            .resolve(base)
            .ok()
            .map(|ptr| MatrixTable::new(self.memory, ptr));
    }

    /// Submits one primitive with alpha blending enabled around it.
    pub(crate) fn submit(&mut self, primitive: &Primitive) {
        match primitive.kind {
            PrimitiveKind::Triangle => self.stats.triangles += 1,
            PrimitiveKind::Quad => self.stats.quads += 1,
        }
        self.backend.set_alpha_blend(true);
        self.backend.submit(primitive);
        self.backend.set_alpha_blend(false);
    }
}
