//! Node ("block") and list decoding.
//!
//! A block is processed as: optional indirection, push transform, optional
//! matrix multiply, translate, dispatch the child, pop transform, then follow
//! the sibling link. Sibling chains are walked in a loop and only child
//! dispatch recurses, so the stack depth is bounded by the nesting depth of
//! the scene rather than by the length of its chains.

use log::trace;

use crate::{
    data_structures::{
        address::Pointer,
        node::{Child, Indirection, NODE_WORDS, Node, NodeFlags},
        scene_graph::Traversal,
    },
    error::DecodeError,
    render::RenderBackend,
    resources::model::ModelStream,
};

/// List words that mark an unwritten list. The walk stops without drawing.
pub const LIST_SENTINELS: [u32; 3] = [0x0000_0000, 0x0080_0800, 0x0300_0000];

/// Set on the last entry of a list. That entry is still drawn.
pub const LIST_TERMINATOR: u32 = 0x0200_0000;

/// Lists and models may not live in model ROM above this address.
const MODEL_ROM_BASE: u32 = 0x0180_0000;

impl<B: RenderBackend + ?Sized> Traversal<'_, '_, B> {
    fn read_node(&mut self, ptr: Pointer) -> Result<Node, DecodeError> {
        if self.nodes_left == 0 {
            return Err(DecodeError::BudgetExhausted(self.limits.max_nodes_per_frame));
        }
        self.nodes_left -= 1;
        let node = Node::from_words(self.memory.words_le::<NODE_WORDS>(ptr)?);
        self.stats.nodes += 1;
        trace!("node at {ptr:?}: {:08X?}", node.words);
        Ok(node)
    }

    /// Decodes the block at `ptr` and every sibling chained after it.
    ///
    /// An error means the chain was cut short: the node itself could not be
    /// read, or a limit was hit. Faults below a node are recorded and do not
    /// stop its siblings.
    pub fn decode_block(&mut self, ptr: Pointer, depth: usize) -> Result<(), DecodeError> {
        if depth >= self.limits.max_depth {
            return Err(DecodeError::DepthExceeded(self.limits.max_depth));
        }

        let mut ptr = ptr;
        for _ in 0..self.limits.max_chain_length {
            let mut node = self.read_node(ptr)?;
            match node.indirection() {
                None => {}
                Some(Indirection::RomModel(addr)) => {
                    trace!("indirection at {ptr:?} to model {addr:#010X}");
                    return self.draw_model(addr);
                }
                Some(Indirection::Node(addr)) => {
                    trace!("indirection at {ptr:?} to block {addr:#010X}");
                    ptr = self.memory.resolve(addr)?;
                    node = self.read_node(ptr)?;
                }
            }

            self.backend.push_transform();
            let descent = self.apply_node(ptr, &node, depth);
            self.backend.pop_transform();
            if let Err(e) = descent {
                self.fault(e);
            }

            match node.next() {
                Some(next) => ptr = self.memory.resolve(next)?,
                None => return Ok(()),
            }
        }
        Err(DecodeError::StreamOverrun {
            what: "block sibling chain",
            limit: self.limits.max_chain_length,
        })
    }

    /// Transform and child of one node. Runs between push and pop.
    fn apply_node(&mut self, at: Pointer, node: &Node, depth: usize) -> Result<(), DecodeError> {
        if let Some(index) = node.matrix_index() {
            let table = self
                .matrices
                .ok_or(DecodeError::UnmappedAddress(self.matrix_base))?;
            let matrix = table.get(index)?;
            self.backend.multiply_transform(&matrix);
        }
        self.backend.translate(node.translation());

        let addr = node.child_address();
        if node.flags().contains(NodeFlags::ALTERNATE_LIST) {
            if addr & 0xFE00_0000 != 0 {
                return Err(DecodeError::MalformedNode {
                    address: at.address(),
                    reason: "alternate list address has high bits set",
                });
            }
            let target = self.memory.resolve(addr & 0x00FF_FFFF)?;
            return self.decode_block(target, depth + 1);
        }

        match node.child() {
            Child::None => Ok(()),
            Child::Block(target) => {
                let target = self.memory.resolve(target)?;
                self.decode_block(target, depth + 1)
            }
            Child::Model(target) => self.draw_model(target),
            Child::List(target) => {
                if target >= MODEL_ROM_BASE {
                    return Err(DecodeError::MalformedNode {
                        address: at.address(),
                        reason: "list in model ROM",
                    });
                }
                let target = self.memory.resolve(target)?;
                self.walk_list(target, depth + 1)
            }
            Child::Unknown(_) => Err(DecodeError::MalformedNode {
                address: at.address(),
                reason: "unhandled child class",
            }),
        }
    }

    /// Draws the blocks named by the list at `ptr`.
    pub fn walk_list(&mut self, ptr: Pointer, depth: usize) -> Result<(), DecodeError> {
        self.stats.lists += 1;
        let mut ptr = ptr;
        for _ in 0..self.limits.max_list_entries {
            let entry = self.memory.word_le(ptr)?;
            if LIST_SENTINELS.contains(&entry) {
                trace!("list at {ptr:?} ends on sentinel {entry:#010X}");
                return Ok(());
            }

            let drawn = self
                .memory
                .resolve(entry & 0x01FF_FFFF)
                .and_then(|target| self.decode_block(target, depth));
            if let Err(e) = drawn {
                self.fault(e);
            }

            if entry & LIST_TERMINATOR != 0 {
                return Ok(());
            }
            ptr = ptr.add(4);
        }
        Err(DecodeError::StreamOverrun {
            what: "list",
            limit: self.limits.max_list_entries,
        })
    }

    /// Decodes the model at protocol address `addr` and submits its polygons.
    /// Polygons decoded before a fault stay submitted.
    pub fn draw_model(&mut self, addr: u32) -> Result<(), DecodeError> {
        let ptr = self.memory.resolve(addr)?;
        self.stats.models += 1;
        let stream = ModelStream::new(
            self.memory.view(ptr.region),
            ptr.offset,
            self.limits.max_polygons_per_model,
        );
        for polygon in stream {
            let primitive = polygon?.to_primitive(self.atlas);
            self.submit(&primitive);
        }
        Ok(())
    }
}
