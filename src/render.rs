//! Render backend capability.
//!
//! The decoder drives a conventional immediate-mode backend: a model-view
//! transform stack, texture binding, alpha blending and fan submission. This
//! module defines that surface as the [`RenderBackend`] trait together with
//! the primitive types that cross it.
//!
//! # Key types
//!
//! - [`RenderBackend`] is the trait every backend implements
//! - [`Primitive`] is one decoded triangle or quad, ready for submission
//! - [`TextureHandle`] is an opaque backend texture name stored in the atlas
//!

use cgmath::{Matrix4, Vector3};

/// Opaque texture name handed out by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Triangle,
    Quad,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveVertex {
    /// Model-space position; the backend applies its current transform.
    pub position: [f32; 3],
    /// Normalized texture coordinate within the bound texture.
    pub tex_coords: [f32; 2],
}

/// One polygon of a model, as a fan of three or four vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub color: [u8; 3],
    /// Texture to sample. `None` draws with the solid color only.
    pub texture: Option<TextureHandle>,
    pub vertices: Vec<PrimitiveVertex>,
}

impl Primitive {
    /// Fan triangulation as vertex index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (1..self.vertices.len().saturating_sub(1)).map(|i| [0, i, i + 1])
    }
}

/// Immediate-mode backend the decoder renders through.
///
/// Transform calls follow fixed-function semantics: `multiply`, `translate`
/// and `scale` post-multiply the current model-view matrix.
pub trait RenderBackend {
    fn name(&self) -> &str;

    fn set_projection(&mut self, projection: Matrix4<f32>);

    /// Enables depth testing, clearing the depth buffer when `clear` is set.
    fn set_depth_test(&mut self, enabled: bool, clear: bool);

    /// Alpha blending with source-alpha / one-minus-source-alpha factors.
    fn set_alpha_blend(&mut self, enabled: bool);

    fn load_identity(&mut self);

    fn push_transform(&mut self);

    fn pop_transform(&mut self);

    fn multiply_transform(&mut self, matrix: &Matrix4<f32>);

    fn translate(&mut self, v: Vector3<f32>) {
        self.multiply_transform(&Matrix4::from_translation(v));
    }

    fn scale(&mut self, v: Vector3<f32>) {
        self.multiply_transform(&Matrix4::from_nonuniform_scale(v.x, v.y, v.z));
    }

    /// Registers decoded RGBA texels as a texture with repeat wrapping and
    /// linear filtering.
    fn create_texture(&mut self, texels: &image::RgbaImage) -> anyhow::Result<TextureHandle>;

    /// Frees a texture that no atlas cell references any more.
    fn release_texture(&mut self, _handle: TextureHandle) {}

    fn submit(&mut self, primitive: &Primitive);
}
