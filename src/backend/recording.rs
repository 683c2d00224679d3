use std::{collections::BTreeMap, path::Path};

use anyhow::Context as _;
use cgmath::{Matrix4, SquareMatrix};
use image::RgbaImage;

use crate::{
    data_structures::transform::TransformStack,
    render::{Primitive, PrimitiveKind, RenderBackend, TextureHandle},
};

/// A primitive as the backend saw it, with positions already in eye space.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub kind: PrimitiveKind,
    pub color: [u8; 3],
    pub texture: Option<TextureHandle>,
    pub positions: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub blended: bool,
    pub depth_test: bool,
}

/// Render state changes, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    Projection(Matrix4<f32>),
    DepthTest { enabled: bool, clear: bool },
    AlphaBlend(bool),
    TextureCreated(TextureHandle),
    TextureReleased(TextureHandle),
}

/// Backend that renders nothing and remembers everything.
#[derive(Debug)]
pub struct RecordingBackend {
    transforms: TransformStack,
    projection: Matrix4<f32>,
    depth_test: bool,
    alpha_blend: bool,
    textures: BTreeMap<TextureHandle, RgbaImage>,
    next_handle: u32,
    draws: Vec<DrawCall>,
    changes: Vec<StateChange>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            transforms: TransformStack::new(),
            projection: Matrix4::identity(),
            depth_test: false,
            alpha_blend: false,
            textures: BTreeMap::new(),
            next_handle: 1,
            draws: Vec::new(),
            changes: Vec::new(),
        }
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Hands back the recorded draws, leaving the list empty for the next frame.
    pub fn take_draws(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }

    pub fn changes(&self) -> &[StateChange] {
        &self.changes
    }

    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    pub fn alpha_blend(&self) -> bool {
        self.alpha_blend
    }

    /// Pushes not yet popped.
    pub fn transform_depth(&self) -> usize {
        self.transforms.depth()
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&RgbaImage> {
        self.textures.get(&handle)
    }

    /// Live textures, oldest first.
    pub fn textures(&self) -> impl Iterator<Item = (TextureHandle, &RgbaImage)> {
        self.textures.iter().map(|(handle, image)| (*handle, image))
    }

    pub fn released(&self) -> Vec<TextureHandle> {
        self.changes
            .iter()
            .filter_map(|change| match change {
                StateChange::TextureReleased(handle) => Some(*handle),
                _ => None,
            })
            .collect()
    }

    /// Writes every live texture to `dir` as `texture_<handle>.png`.
    pub fn dump_textures(&self, dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating texture dump directory {}", dir.display()))?;
        for (handle, image) in &self.textures {
            let path = dir.join(format!("texture_{}.png", handle.0));
            image
                .save(&path)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(())
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn set_projection(&mut self, projection: Matrix4<f32>) {
        self.projection = projection;
        self.changes.push(StateChange::Projection(projection));
    }

    fn set_depth_test(&mut self, enabled: bool, clear: bool) {
        self.depth_test = enabled;
        self.changes.push(StateChange::DepthTest { enabled, clear });
    }

    fn set_alpha_blend(&mut self, enabled: bool) {
        self.alpha_blend = enabled;
        self.changes.push(StateChange::AlphaBlend(enabled));
    }

    fn load_identity(&mut self) {
        self.transforms.load_identity();
    }

    fn push_transform(&mut self) {
        self.transforms.push();
    }

    fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    fn multiply_transform(&mut self, matrix: &Matrix4<f32>) {
        self.transforms.multiply(matrix);
    }

    fn create_texture(&mut self, texels: &RgbaImage) -> anyhow::Result<TextureHandle> {
        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        self.textures.insert(handle, texels.clone());
        self.changes.push(StateChange::TextureCreated(handle));
        Ok(handle)
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if self.textures.remove(&handle).is_some() {
            self.changes.push(StateChange::TextureReleased(handle));
        } else {
            log::warn!("release of unknown texture {handle:?}");
        }
    }

    fn submit(&mut self, primitive: &Primitive) {
        self.draws.push(DrawCall {
            kind: primitive.kind,
            color: primitive.color,
            texture: primitive.texture,
            positions: primitive
                .vertices
                .iter()
                .map(|v| self.transforms.apply(v.position))
                .collect(),
            tex_coords: primitive.vertices.iter().map(|v| v.tex_coords).collect(),
            blended: self.alpha_blend,
            depth_test: self.depth_test,
        });
    }
}
