//! The 40-byte node record ("block") of the Real3D scene graph.
//!
//! ```text
//! word 0    header flags
//! word 1-2  culling/LOD data, not interpreted
//! word 3    matrix selector
//! word 4-6  translation (IEEE floats)
//! word 7    child address, top byte selects the child class
//! word 8    next sibling
//! word 9    not interpreted
//! ```

use bitflags::bitflags;
use cgmath::Vector3;

use crate::data_structures::numeric::float_bits;

pub const NODE_WORDS: usize = 10;
pub const NODE_BYTES: usize = NODE_WORDS * 4;

/// Top byte marking an indirection word in the first four header words.
const INDIRECTION_TAG: u32 = 0x01;

bitflags! {
    /// Bits of header word 0 the decoder acts on. Unknown bits are kept.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u32 {
        /// Child word is a 4-element list address instead of a classed address.
        const ALTERNATE_LIST = 0x0000_0008;
        /// Indirection target is a model in VROM rather than another node.
        const ROM_MODEL = 0x0080_0000;
        const _ = !0;
    }
}

/// Matrix selection is active only with this bit set in word 3.
const MATRIX_ENABLE: u32 = 0x2000_0000;
const MATRIX_INDEX: u32 = 0x3FF;

/// Next-link bit that ends a sibling chain.
const NEXT_TERMINATOR: u32 = 0x0100_0000;

/// Where an indirection record sends the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indirection {
    /// Draw the model at this protocol address (always in VROM) and stop.
    RomModel(u32),
    /// Re-read the node at this protocol address.
    Node(u32),
}

/// Classification of a node's child word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    None,
    Block(u32),
    Model(u32),
    List(u32),
    /// Child class the decoder has no handler for.
    Unknown(u32),
}

impl Child {
    pub fn classify(addr: u32) -> Self {
        let target = addr & 0x01FF_FFFF;
        match addr >> 24 {
            0x00 if addr == 0 => Child::None,
            0x00 => Child::Block(target),
            0x01 | 0x03 => Child::Model(target),
            0x04 => Child::List(target),
            _ => Child::Unknown(addr),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub words: [u32; NODE_WORDS],
}

impl Node {
    pub fn from_words(words: [u32; NODE_WORDS]) -> Self {
        Self { words }
    }

    pub fn flags(&self) -> NodeFlags {
        NodeFlags::from_bits_retain(self.words[0])
    }

    /// Pointer-pair headers: any of the first four words tagged `0x01`.
    pub fn indirection(&self) -> Option<Indirection> {
        let tagged = self.words[..4]
            .iter()
            .any(|word| word >> 24 == INDIRECTION_TAG);
        if !tagged {
            return None;
        }
        let target = self.words[0] & 0x00FF_FFFF;
        if self.flags().contains(NodeFlags::ROM_MODEL) {
            Some(Indirection::RomModel(target | 0x0100_0000))
        } else {
            Some(Indirection::Node(target))
        }
    }

    /// Matrix table index, when selection is enabled and non-zero.
    pub fn matrix_index(&self) -> Option<u32> {
        let selector = self.words[3];
        let index = selector & MATRIX_INDEX;
        (selector & MATRIX_ENABLE != 0 && index != 0).then_some(index)
    }

    pub fn translation(&self) -> Vector3<f32> {
        Vector3::new(
            float_bits(self.words[4]),
            float_bits(self.words[5]),
            float_bits(self.words[6]),
        )
    }

    pub fn child_address(&self) -> u32 {
        self.words[7]
    }

    pub fn child(&self) -> Child {
        Child::classify(self.child_address())
    }

    /// Next sibling address, `None` at the end of the chain.
    pub fn next(&self) -> Option<u32> {
        let next = self.words[8];
        (next != 0 && next & NEXT_TERMINATOR == 0).then_some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(patch: &[(usize, u32)]) -> Node {
        let mut words = [0; NODE_WORDS];
        for &(i, w) in patch {
            words[i] = w;
        }
        Node::from_words(words)
    }

    #[test]
    fn test_indirection_detection() {
        assert_eq!(node(&[]).indirection(), None);
        assert_eq!(
            node(&[(0, 0x0100_0040)]).indirection(),
            Some(Indirection::Node(0x40))
        );
        // tag on a later word still redirects through word 0
        assert_eq!(
            node(&[(0, 0x0080_0123), (2, 0x0100_0000)]).indirection(),
            Some(Indirection::RomModel(0x0180_0123))
        );
        assert_eq!(node(&[(3, 0x0200_0000)]).indirection(), None);
    }

    #[test]
    fn test_matrix_selector() {
        assert_eq!(node(&[(3, 0x0000_0005)]).matrix_index(), None);
        assert_eq!(node(&[(3, 0x2000_0000)]).matrix_index(), None);
        assert_eq!(node(&[(3, 0x2000_0405)]).matrix_index(), Some(5));
    }

    #[test]
    fn test_child_classes() {
        assert_eq!(Child::classify(0), Child::None);
        assert_eq!(Child::classify(0x0080_0010), Child::Block(0x0080_0010));
        assert_eq!(Child::classify(0x0101_0000), Child::Model(0x0101_0000));
        assert_eq!(Child::classify(0x0389_0000), Child::Model(0x0189_0000));
        assert_eq!(Child::classify(0x0480_0600), Child::List(0x0080_0600));
        assert_eq!(Child::classify(0x0500_0000), Child::Unknown(0x0500_0000));
        assert_eq!(Child::classify(0x0200_0000), Child::Unknown(0x0200_0000));
    }

    #[test]
    fn test_next_link() {
        assert_eq!(node(&[]).next(), None);
        assert_eq!(node(&[(8, 0x0100_0000)]).next(), None);
        assert_eq!(node(&[(8, 0x0180_0010)]).next(), None);
        assert_eq!(node(&[(8, 0x0080_0010)]).next(), Some(0x0080_0010));
    }
}
