//! Bounds-checked views over the four Real3D memories.
//!
//! The engine never owns these buffers. The CPU core that fills them lends
//! them out for the duration of one decode pass, which is exactly what the
//! `'m` lifetime expresses: nothing can mutate the memories while a frame is
//! being walked.

use crate::{
    data_structures::address::{Pointer, Region, translate},
    error::DecodeError,
};

/// Byte order of 32-bit words inside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order the model decoder uses for streams stored in `region`.
    pub const fn for_models_in(region: Region) -> Self {
        match region {
            Region::ModelRom => Endian::Big,
            _ => Endian::Little,
        }
    }
}

/// Read-only view over one region.
#[derive(Debug, Clone, Copy)]
pub struct RegionView<'m> {
    region: Region,
    bytes: &'m [u8],
}

impl<'m> RegionView<'m> {
    pub fn new(region: Region, bytes: &'m [u8]) -> Self {
        Self { region, bytes }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&'m [u8], DecodeError> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(DecodeError::OutOfBounds {
                region: self.region,
                offset,
                len,
            })
    }

    pub fn word(&self, offset: usize, endian: Endian) -> Result<u32, DecodeError> {
        let raw: [u8; 4] = self
            .bytes(offset, 4)?
            .try_into()
            .map_err(|_| DecodeError::OutOfBounds {
                region: self.region,
                offset,
                len: 4,
            })?;
        Ok(match endian {
            Endian::Little => u32::from_le_bytes(raw),
            Endian::Big => u32::from_be_bytes(raw),
        })
    }

    /// Little-endian word, the layout of every culling RAM structure.
    pub fn word_le(&self, offset: usize) -> Result<u32, DecodeError> {
        self.word(offset, Endian::Little)
    }

    /// Reads `N` consecutive words.
    pub fn words<const N: usize>(
        &self,
        offset: usize,
        endian: Endian,
    ) -> Result<[u32; N], DecodeError> {
        // Check the whole span up front so a partial record never decodes.
        self.bytes(offset, N * 4)?;
        let mut out = [0u32; N];
        for (i, word) in out.iter_mut().enumerate() {
            *word = self.word(offset + i * 4, endian)?;
        }
        Ok(out)
    }
}

/// The four memories, borrowed for one decode pass.
#[derive(Debug, Clone, Copy)]
pub struct MemoryMap<'m> {
    culling_a: &'m [u8],
    culling_b: &'m [u8],
    model_ram: &'m [u8],
    model_rom: &'m [u8],
}

impl<'m> MemoryMap<'m> {
    pub fn new(
        culling_a: &'m [u8],
        culling_b: &'m [u8],
        model_ram: &'m [u8],
        model_rom: &'m [u8],
    ) -> Self {
        Self {
            culling_a,
            culling_b,
            model_ram,
            model_rom,
        }
    }

    pub fn view(&self, region: Region) -> RegionView<'m> {
        let bytes = match region {
            Region::CullingA => self.culling_a,
            Region::CullingB => self.culling_b,
            Region::ModelRam => self.model_ram,
            Region::ModelRom => self.model_rom,
        };
        RegionView::new(region, bytes)
    }

    /// Translates a protocol address, failing with [`DecodeError::UnmappedAddress`].
    pub fn resolve(&self, addr: u32) -> Result<Pointer, DecodeError> {
        translate(addr).ok_or(DecodeError::UnmappedAddress(addr))
    }

    pub fn word(&self, ptr: Pointer, endian: Endian) -> Result<u32, DecodeError> {
        self.view(ptr.region).word(ptr.offset, endian)
    }

    pub fn word_le(&self, ptr: Pointer) -> Result<u32, DecodeError> {
        self.word(ptr, Endian::Little)
    }

    pub fn words_le<const N: usize>(&self, ptr: Pointer) -> Result<[u32; N], DecodeError> {
        self.view(ptr.region).words(ptr.offset, Endian::Little)
    }
}
