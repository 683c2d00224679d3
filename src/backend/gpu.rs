use std::{collections::HashMap, ops::Range};

use cgmath::{Matrix4, SquareMatrix, Vector4};
use image::{Rgba, RgbaImage};
use wgpu::util::DeviceExt;

use crate::{
    camera::OPENGL_TO_WGPU_MATRIX,
    data_structures::{texture::Texture, transform::TransformStack},
    pipelines::primitive::{
        PrimitiveVertexRaw, mk_primitive_pipeline, texture_bind_group, texture_layout,
    },
    render::{Primitive, RenderBackend, TextureHandle},
};

/// Consecutive triangles sharing texture and render state.
#[derive(Debug, Clone, PartialEq)]
struct Batch {
    texture: Option<TextureHandle>,
    depth_test: bool,
    blend: bool,
    vertices: Range<u32>,
}

struct GpuTexture {
    #[allow(unused)]
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// Draws decoded frames with wgpu.
///
/// Submissions are transformed on the CPU and collected into batches; call
/// [`WgpuBackend::render`] after `update_frame` to record them into a pass.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    texture_layout: wgpu::BindGroupLayout,
    /// Indexed by `depth_test as usize * 2 + blend as usize`.
    pipelines: Vec<wgpu::RenderPipeline>,
    depth_texture: Texture,
    white: GpuTexture,
    textures: HashMap<TextureHandle, GpuTexture>,
    next_handle: u32,
    transforms: TransformStack,
    projection: Matrix4<f32>,
    depth_test: bool,
    alpha_blend: bool,
    clear_depth: bool,
    vertices: Vec<PrimitiveVertexRaw>,
    batches: Vec<Batch>,
}

impl WgpuBackend {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        size: [u32; 2],
    ) -> anyhow::Result<Self> {
        let texture_layout = texture_layout(&device);
        let pipelines = [(false, false), (false, true), (true, false), (true, true)]
            .into_iter()
            .map(|(depth, blend)| {
                mk_primitive_pipeline(&device, color_format, &texture_layout, depth, blend)
            })
            .collect();
        let depth_texture = Texture::create_depth_texture(&device, size, "depth_texture");
        let white = upload(
            &device,
            &queue,
            &texture_layout,
            &RgbaImage::from_pixel(1, 1, Rgba([0xFF; 4])),
            "white",
        )?;

        Ok(Self {
            device,
            queue,
            texture_layout,
            pipelines,
            depth_texture,
            white,
            textures: HashMap::new(),
            next_handle: 1,
            transforms: TransformStack::new(),
            projection: Matrix4::identity(),
            depth_test: false,
            alpha_blend: false,
            clear_depth: false,
            vertices: Vec::new(),
            batches: Vec::new(),
        })
    }

    pub fn resize(&mut self, size: [u32; 2]) {
        self.depth_texture = Texture::create_depth_texture(&self.device, size, "depth_texture");
    }

    /// Records the collected batches into a render pass over `view` and
    /// starts collecting the next frame.
    pub fn render(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Primitive Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let depth_load = if self.clear_depth {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Real3D Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if !self.vertices.is_empty() {
                render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            }
            for batch in &self.batches {
                let bind_group = match batch.texture {
                    None => &self.white.bind_group,
                    Some(handle) => match self.textures.get(&handle) {
                        Some(texture) => &texture.bind_group,
                        None => {
                            log::warn!("batch references released texture {handle:?}");
                            continue;
                        }
                    },
                };
                let pipeline = batch.depth_test as usize * 2 + batch.blend as usize;
                render_pass.set_pipeline(&self.pipelines[pipeline]);
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.draw(batch.vertices.clone(), 0..1);
            }
        }

        self.vertices.clear();
        self.batches.clear();
        self.clear_depth = false;
    }
}

fn clip_position(clip_from_model: &Matrix4<f32>, position: [f32; 3]) -> [f32; 4] {
    let p = clip_from_model * Vector4::new(position[0], position[1], position[2], 1.0);
    [p.x, p.y, p.z, p.w]
}

fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    texels: &RgbaImage,
    label: &str,
) -> anyhow::Result<GpuTexture> {
    let texture = Texture::from_rgba(device, queue, texels, Some(label))?;
    let sampler = texture
        .sampler
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("texture {label} has no sampler"))?;
    let bind_group = texture_bind_group(device, layout, &texture.view, sampler);
    Ok(GpuTexture {
        texture,
        bind_group,
    })
}

impl RenderBackend for WgpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn set_projection(&mut self, projection: Matrix4<f32>) {
        self.projection = OPENGL_TO_WGPU_MATRIX * projection;
    }

    fn set_depth_test(&mut self, enabled: bool, clear: bool) {
        self.depth_test = enabled;
        self.clear_depth |= clear;
    }

    fn set_alpha_blend(&mut self, enabled: bool) {
        self.alpha_blend = enabled;
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
        let label = format!("real3d texture {}", handle.0);
        let texture = upload(&self.device, &self.queue, &self.texture_layout, texels, &label)?;
        self.next_handle += 1;
        self.textures.insert(handle, texture);
        Ok(handle)
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
    }

    fn submit(&mut self, primitive: &Primitive) {
        let clip_from_model = self.projection * self.transforms.current();
        let [r, g, b] = primitive.color.map(|c| c as f32 / 255.0);
        let start = self.vertices.len() as u32;
        for triangle in primitive.triangles() {
            for index in triangle {
                let vertex = &primitive.vertices[index];
                self.vertices.push(PrimitiveVertexRaw {
                    position: clip_position(&clip_from_model, vertex.position),
                    tex_coords: vertex.tex_coords,
                    color: [r, g, b, 1.0],
                });
            }
        }
        let end = self.vertices.len() as u32;

        match self.batches.last_mut() {
            Some(batch)
                if batch.texture == primitive.texture
                    && batch.depth_test == self.depth_test
                    && batch.blend == self.alpha_blend
                    && batch.vertices.end == start =>
            {
                batch.vertices.end = end;
            }
            _ => self.batches.push(Batch {
                texture: primitive.texture,
                depth_test: self.depth_test,
                blend: self.alpha_blend,
                vertices: start..end,
            }),
        }
    }
}
