//! Real3D address translation.
//!
//! The Real3D sees its memories through a private, word-granular address
//! space. Four disjoint windows of that space map onto the four backing
//! buffers handed to the engine:
//!
//! | protocol range          | region     | byte offset            |
//! |-------------------------|------------|------------------------|
//! | `0x0000000..=0x007FFFF` | CullingA   | `addr * 4`             |
//! | `0x0800000..=0x083FFFF` | CullingB   | `(addr & 0x3FFFF) * 4` |
//! | `0x1000000..=0x107FFFF` | ModelRAM   | `(addr & 0x7FFFF) * 4` |
//! | `0x1800000..=0x1FFFFFF` | ModelROM   | `(addr & 0x7FFFFF) * 4`|
//!
//! Everything else is unmapped. Translation never looks at the buffers, so
//! bounds are checked later by [`RegionView`](super::memory::RegionView).

use std::fmt;

/// One of the four memories a protocol address can resolve into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Culling RAM that the PowerPC sees at 0x8C000000.
    CullingA,
    /// Culling RAM that the PowerPC sees at 0x8E000000. Holds the scene descriptors.
    CullingB,
    /// Polygon RAM, streamed models. Little-endian words.
    ModelRam,
    /// VROM, baked models. Big-endian words.
    ModelRom,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::CullingA,
        Region::CullingB,
        Region::ModelRam,
        Region::ModelRom,
    ];

    /// First protocol address of the window.
    pub const fn base(self) -> u32 {
        match self {
            Region::CullingA => 0x000_0000,
            Region::CullingB => 0x080_0000,
            Region::ModelRam => 0x100_0000,
            Region::ModelRom => 0x180_0000,
        }
    }

    /// Last protocol address of the window (inclusive).
    pub const fn last(self) -> u32 {
        match self {
            Region::CullingA => 0x007_FFFF,
            Region::CullingB => 0x083_FFFF,
            Region::ModelRam => 0x107_FFFF,
            Region::ModelRom => 0x1FF_FFFF,
        }
    }

    const fn mask(self) -> u32 {
        match self {
            Region::CullingA => 0x007_FFFF,
            Region::CullingB => 0x003_FFFF,
            Region::ModelRam => 0x007_FFFF,
            Region::ModelRom => 0x07F_FFFF,
        }
    }
}

/// A byte location inside one of the backing buffers.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pointer {
    pub region: Region,
    pub offset: usize,
}

impl Pointer {
    pub const fn new(region: Region, offset: usize) -> Self {
        Self { region, offset }
    }

    /// The pointer `bytes` further into the same region.
    pub const fn add(self, bytes: usize) -> Self {
        Self {
            region: self.region,
            offset: self.offset + bytes,
        }
    }

    /// Protocol address this pointer was translated from, when it is word aligned.
    pub fn address(self) -> u32 {
        self.region.base() | (self.offset / 4) as u32
    }
}

impl fmt::Debug for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}+{:#X}", self.region, self.offset)
    }
}

/// Maps a protocol address to a region and byte offset, or `None` when unmapped.
pub fn translate(addr: u32) -> Option<Pointer> {
    Region::ALL
        .into_iter()
        .find(|region| (region.base()..=region.last()).contains(&addr))
        .map(|region| Pointer::new(region, ((addr & region.mask()) as usize) * 4))
}
