#![allow(dead_code)]

use real3d_ngin::{
    MemoryMap,
    backend::RecordingBackend,
    context::Context,
    data_structures::address::{Region, translate},
};

pub const STOP: u32 = 0x0100_0000;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn recording_context() -> Context<RecordingBackend> {
    init_logger();
    Context::new(RecordingBackend::new())
}

/// Encodes a float as 13.19 fixed point.
pub fn fixed(value: f32) -> u32 {
    (value * 524288.0) as i32 as u32
}

/// Synthetic Real3D memory. Words are written in the byte order the hardware
/// uses for the region they land in.
pub struct MemoryImage {
    pub culling_a: Vec<u8>,
    pub culling_b: Vec<u8>,
    pub model_ram: Vec<u8>,
    pub model_rom: Vec<u8>,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self {
            culling_a: vec![0; 0x4000],
            culling_b: vec![0; 0x4000],
            model_ram: vec![0; 0x4000],
            model_rom: vec![0; 0x4000],
        }
    }

    pub fn map(&self) -> MemoryMap<'_> {
        MemoryMap::new(
            &self.culling_a,
            &self.culling_b,
            &self.model_ram,
            &self.model_rom,
        )
    }

    /// Writes `word` at protocol address `addr`.
    pub fn word(&mut self, addr: u32, word: u32) {
        let ptr = translate(addr).expect("test address must be mapped");
        let (bytes, buffer) = match ptr.region {
            Region::CullingA => (word.to_le_bytes(), &mut self.culling_a),
            Region::CullingB => (word.to_le_bytes(), &mut self.culling_b),
            Region::ModelRam => (word.to_le_bytes(), &mut self.model_ram),
            Region::ModelRom => (word.to_be_bytes(), &mut self.model_rom),
        };
        buffer[ptr.offset..ptr.offset + 4].copy_from_slice(&bytes);
    }

    pub fn words(&mut self, addr: u32, words: &[u32]) {
        for (i, &w) in words.iter().enumerate() {
            self.word(addr + i as u32, w);
        }
    }

    /// Scene descriptor at culling RAM B word `index`.
    pub fn descriptor(&mut self, index: u32, next: u32, entry: u32, matrix_base: u32) {
        let addr = 0x80_0000 + index;
        self.word(addr + 1, next);
        self.word(addr + 2, entry);
        self.word(addr + 0x16, matrix_base);
    }

    pub fn node(&mut self, addr: u32, node: &NodeSpec) {
        self.words(addr, &node.to_words());
    }

    /// Matrix table entry: translation then row-major 3x3.
    pub fn matrix(&mut self, base: u32, index: u32, words: [f32; 12]) {
        let words = words.map(f32::to_bits);
        self.words(base + index * 12, &words);
    }

    /// Writes a polygon stream and returns the address after it.
    pub fn model(&mut self, addr: u32, polygons: &[PolygonSpec]) -> u32 {
        let mut at = addr;
        for (i, polygon) in polygons.iter().enumerate() {
            let words = polygon.to_words(i + 1 == polygons.len());
            self.words(at, &words);
            at += words.len() as u32;
        }
        at
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub words: [u32; 4],
    pub translation: [f32; 3],
    pub child: u32,
    pub next: u32,
}

impl NodeSpec {
    pub fn child(child: u32) -> Self {
        Self {
            child,
            next: STOP,
            ..Default::default()
        }
    }

    pub fn with_translation(mut self, translation: [f32; 3]) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_next(mut self, next: u32) -> Self {
        self.next = next;
        self
    }

    pub fn with_header(mut self, header: u32) -> Self {
        self.words[0] = header;
        self
    }

    pub fn with_matrix(mut self, index: u32) -> Self {
        self.words[3] = 0x2000_0000 | index;
        self
    }

    fn to_words(&self) -> [u32; 10] {
        [
            self.words[0],
            self.words[1],
            self.words[2],
            self.words[3],
            self.translation[0].to_bits(),
            self.translation[1].to_bits(),
            self.translation[2].to_bits(),
            self.child,
            self.next,
            0,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct PolygonSpec {
    pub quad: bool,
    pub reuse: u32,
    pub color: [u8; 3],
    pub textured: bool,
    /// Texture origin in atlas cells (column, row).
    pub base_cell: (u32, u32),
    /// Texture size exponents, texels = 32 << exponent.
    pub tex_exponents: (u32, u32),
    /// Explicit vertices: position and packed UV.
    pub vertices: Vec<([f32; 3], u32)>,
}

impl PolygonSpec {
    pub fn triangle(color: [u8; 3], vertices: [[f32; 3]; 3]) -> Self {
        Self {
            quad: false,
            reuse: 0,
            color,
            textured: false,
            base_cell: (0, 0),
            tex_exponents: (0, 0),
            vertices: vertices.iter().map(|&p| (p, 0)).collect(),
        }
    }

    pub fn quad(color: [u8; 3], vertices: [[f32; 3]; 4]) -> Self {
        Self {
            quad: true,
            vertices: vertices.iter().map(|&p| (p, 0)).collect(),
            ..Self::triangle(color, [[0.0; 3]; 3])
        }
    }

    pub fn reusing(mut self, code: u32) -> Self {
        self.reuse = code;
        self
    }

    /// Replaces the explicit vertices, for polygons that carry the rest.
    pub fn with_vertices(mut self, vertices: &[[f32; 3]]) -> Self {
        self.vertices = vertices.iter().map(|&p| (p, 0)).collect();
        self
    }

    pub fn with_uv(mut self, index: usize, u: u32, v: u32) -> Self {
        self.vertices[index].1 = (u << 16) | v;
        self
    }

    pub fn textured(mut self, base_cell: (u32, u32)) -> Self {
        self.textured = true;
        self.base_cell = base_cell;
        self
    }

    fn to_words(&self, last: bool) -> Vec<u32> {
        let (u, v) = self.base_cell;
        // a spare bit keeps the first word non-zero
        let w0 = 0x100 | self.reuse | if self.quad { 0x40 } else { 0 };
        let w1 = if last { 0x04 } else { 0 };
        let w3 = (self.tex_exponents.0 << 3) | self.tex_exponents.1;
        let [r, g, b] = self.color.map(u32::from);
        let w4 = (r << 24) | (g << 16) | (b << 8) | ((v & 0x20) << 1) | (u >> 1);
        let w5 = ((u & 1) << 7) | (v & 0x1F);
        let w6 = if self.textured { 0x0400_0000 } else { 0 };

        let mut words = vec![w0, w1, 0, w3, w4, w5, w6];
        for &(position, uv) in &self.vertices {
            words.extend(position.map(fixed));
            words.push(uv);
        }
        words
    }
}
