//! Polygon records inside a model stream.
//!
//! A record is a seven-word header followed by 16-byte vertices. Vertices
//! shared with the previous polygon are not repeated: a 4-bit reuse code in
//! the header says which of the previous polygon's four saved slots to carry
//! over, and only the remaining vertices follow the header.

/// Header length in bytes; the first vertex starts here.
pub const HEADER_BYTES: usize = 0x1C;
pub const HEADER_WORDS: usize = HEADER_BYTES / 4;
pub const VERTEX_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Triangle,
    Quad,
}

impl Shape {
    pub const fn vertex_count(self) -> usize {
        match self {
            Shape::Triangle => 3,
            Shape::Quad => 4,
        }
    }
}

/// Previous-polygon slots carried over for a reuse code, or `None` for
/// codes the hardware format does not define.
pub fn carried_slots(code: u32) -> Option<&'static [usize]> {
    let slots: &'static [usize] = match code {
        0x0 => &[],
        0x1 => &[0],
        0x2 => &[1],
        0x4 => &[2],
        0x8 => &[3],
        0x3 => &[0, 1],
        0x5 => &[0, 2],
        0x6 => &[1, 2],
        0x9 => &[0, 3],
        0xC => &[2, 3],
        _ => return None,
    };
    Some(slots)
}

/// Decoded polygon header. Field positions are the same for both byte orders
/// once words are read with the right accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolygonHeader {
    pub shape: Shape,
    pub reuse_code: u32,
    pub last: bool,
    /// Texture tile size in texels.
    pub tex_width: u32,
    pub tex_height: u32,
    /// Texture origin on the texture sheet, in texels.
    pub base_u: u32,
    pub base_v: u32,
    pub color: [u8; 3],
    pub textured: bool,
}

impl PolygonHeader {
    pub fn from_words(w: &[u32; HEADER_WORDS]) -> Self {
        let shape = if w[0] & 0x40 != 0 {
            Shape::Quad
        } else {
            Shape::Triangle
        };
        let base_u = ((w[4] & 0x1F) << 1) | ((w[5] & 0x80) >> 7);
        let base_v = (w[5] & 0x1F) | ((w[4] & 0x40) >> 1);
        Self {
            shape,
            reuse_code: w[0] & 0x0F,
            last: w[1] & 0x04 != 0,
            tex_width: 32 << ((w[3] >> 3) & 7),
            tex_height: 32 << (w[3] & 7),
            base_u: base_u * 32,
            base_v: base_v * 32,
            color: [(w[4] >> 24) as u8, (w[4] >> 16) as u8, (w[4] >> 8) as u8],
            textured: w[6] & 0x0400_0000 != 0,
        }
    }

    /// Carried slots for this header, `None` for undefined reuse codes.
    pub fn carried(&self) -> Option<&'static [usize]> {
        carried_slots(self.reuse_code)
    }

    /// Vertices stored explicitly after the header.
    pub fn new_vertices(&self) -> Option<usize> {
        self.carried()
            .map(|slots| self.shape.vertex_count() - slots.len())
    }

    /// Full record length including explicit vertices.
    pub fn record_bytes(&self) -> Option<usize> {
        self.new_vertices().map(|n| HEADER_BYTES + n * VERTEX_BYTES)
    }
}

/// A vertex as stored: position plus the packed 16.16 texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: u32,
}

impl Vertex {
    /// Texel coordinate packed in the UV word, normalized by the tile size.
    pub fn tex_coords(&self, tex_width: u32, tex_height: u32) -> [f32; 2] {
        let u = (self.uv >> 16) >> 3;
        let v = (self.uv & 0xFFFF) >> 3;
        [u as f32 / tex_width as f32, v as f32 / tex_height as f32]
    }
}

/// The four vertex slots saved from the previous polygon. Slots start zeroed
/// so a reuse code on the first polygon reads the origin, not garbage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReuseSlots {
    slots: [Vertex; 4],
}

impl ReuseSlots {
    pub fn get(&self, slot: usize) -> Vertex {
        self.slots[slot & 3]
    }

    /// Saves a finished polygon. Triangles leave slot 3 untouched.
    pub fn save(&mut self, vertices: &[Vertex]) {
        for (slot, vertex) in self.slots.iter_mut().zip(vertices) {
            *slot = *vertex;
        }
    }
}
