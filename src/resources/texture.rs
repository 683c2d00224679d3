//! Texture tile decoder.
//!
//! Uploads arrive as a header word plus raw tile bytes. Texels are stored in
//! 8x8 tiles, each tile swizzled through a fixed permutation, and the tiles
//! follow each other row-major over the texture. Decoding produces a linear
//! RGBA image ready for a backend.

use image::{Rgba, RgbaImage};

use crate::{data_structures::atlas::CellRect, error::TextureError};

const TILE_TEXELS: u32 = 8;

/// Source texel index inside a tile for each linear (row-major) texel.
const DECODE: [usize; 64] = [
    0, 1, 4, 5, 8, 9, 12, 13, //
    2, 3, 6, 7, 10, 11, 14, 15, //
    16, 17, 20, 21, 24, 25, 28, 29, //
    18, 19, 22, 23, 26, 27, 30, 31, //
    32, 33, 36, 37, 40, 41, 44, 45, //
    34, 35, 38, 39, 42, 43, 46, 47, //
    48, 49, 52, 53, 56, 57, 60, 61, //
    50, 51, 54, 55, 58, 59, 62, 63,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelFormat {
    /// 8-bit luminance, opaque.
    Luminance8,
    /// 5:5:5 RGB with a transparency bit.
    Rgb5A1,
}

impl TexelFormat {
    pub const fn bytes_per_texel(self) -> usize {
        match self {
            TexelFormat::Luminance8 => 1,
            TexelFormat::Rgb5A1 => 2,
        }
    }

    const fn tile_bytes(self) -> usize {
        (TILE_TEXELS * TILE_TEXELS) as usize * self.bytes_per_texel()
    }
}

/// Parsed texture upload header word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureHeader(pub u32);

impl TextureHeader {
    /// Uploads with this nibble pattern carry something other than texels.
    pub fn is_texture(self) -> bool {
        self.0 & 0x0F00_0000 != 0x0200_0000
    }

    pub fn width(self) -> u32 {
        32 << ((self.0 >> 14) & 3)
    }

    pub fn height(self) -> u32 {
        32 << ((self.0 >> 17) & 3)
    }

    /// Texel position on the texture sheet. The sheet-select bit becomes the
    /// top bit of `y`, so the two 2048x1024 sheets stack vertically.
    pub fn position(self) -> (u32, u32) {
        let x = (self.0 & 0x3F) * 32;
        let y = (((self.0 >> 7) & 0x1F) | ((self.0 >> 15) & 0x20)) * 32;
        (x, y)
    }

    pub fn format(self) -> TexelFormat {
        if self.0 & 0x0080_0000 != 0 {
            TexelFormat::Rgb5A1
        } else {
            TexelFormat::Luminance8
        }
    }

    /// Bytes of tile data the upload must carry.
    pub fn data_len(self) -> usize {
        (self.width() * self.height()) as usize * self.format().bytes_per_texel()
    }

    /// Atlas cells the upload covers.
    pub fn footprint(self) -> CellRect {
        let (x, y) = self.position();
        CellRect::from_texels(x, y, self.width(), self.height())
    }
}

fn rgb5a1(texel: u16) -> Rgba<u8> {
    let b = ((texel & 0x1F) << 3) as u8;
    let g = (((texel >> 5) & 0x1F) << 3) as u8;
    let r = (((texel >> 10) & 0x1F) << 3) as u8;
    // a set top bit means transparent
    let a = if texel & 0x8000 != 0 { 0x00 } else { 0xFF };
    Rgba([r, g, b, a])
}

fn decode_tile(
    image: &mut RgbaImage,
    origin: (u32, u32),
    tile: &[u8],
    format: TexelFormat,
    little_endian: bool,
) {
    for i in 0..(TILE_TEXELS * TILE_TEXELS) as usize {
        let pixel = match format {
            TexelFormat::Luminance8 => {
                let src = if little_endian { DECODE[i ^ 9] } else { DECODE[i] };
                let lum = tile[src];
                Rgba([lum, lum, lum, 0xFF])
            }
            TexelFormat::Rgb5A1 => {
                let texel = if little_endian {
                    let o = DECODE[i ^ 1] * 2;
                    u16::from_le_bytes([tile[o], tile[o + 1]])
                } else {
                    let o = DECODE[i] * 2;
                    u16::from_be_bytes([tile[o], tile[o + 1]])
                };
                rgb5a1(texel)
            }
        };
        let x = origin.0 + i as u32 % TILE_TEXELS;
        let y = origin.1 + i as u32 / TILE_TEXELS;
        image.put_pixel(x, y, pixel);
    }
}

/// Decodes the tiles of one upload into a linear RGBA image.
pub fn decode_texture(
    header: TextureHeader,
    data: &[u8],
    little_endian: bool,
) -> Result<RgbaImage, TextureError> {
    let needed = header.data_len();
    if data.len() < needed {
        return Err(TextureError::Truncated {
            needed,
            available: data.len(),
        });
    }

    let format = header.format();
    let (width, height) = (header.width(), header.height());
    let tiles_x = width / TILE_TEXELS;
    let mut image = RgbaImage::new(width, height);
    for (index, tile) in data[..needed].chunks_exact(format.tile_bytes()).enumerate() {
        let index = index as u32;
        let origin = (
            (index % tiles_x) * TILE_TEXELS,
            (index / tiles_x) * TILE_TEXELS,
        );
        decode_tile(&mut image, origin, tile, format, little_endian);
    }
    Ok(image)
}
