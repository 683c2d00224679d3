use cgmath::Deg;
use log::{debug, trace};

use crate::{
    camera::{HANDEDNESS_FLIP, Projection},
    config::EngineConfig,
    data_structures::{
        atlas::Atlas,
        memory::MemoryMap,
        scene_graph::{FrameStats, Traversal},
    },
    render::{RenderBackend, TextureHandle},
    resources::texture::{TextureHeader, decode_texture},
};

/// Result of [`Context::upload_texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The header marked the upload as something other than texels.
    Skipped,
    Stored { handle: TextureHandle, cells: usize },
}

/// One decoder instance: the backend it draws through, the texture atlas
/// and the settings of the emulated viewport.
///
/// Scene memory is not owned. It is borrowed for each [`Context::update_frame`]
/// so the emulator is free to write it between frames.
#[derive(Debug)]
pub struct Context<B: RenderBackend> {
    backend: B,
    config: EngineConfig,
    projection: Projection,
    atlas: Atlas,
    stats: FrameStats,
}

impl<B: RenderBackend> Context<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, EngineConfig::default())
    }

    pub fn with_config(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            projection: projection_for(&config),
            atlas: Atlas::new(config.atlas_policy),
            stats: FrameStats::default(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Changes settings in place. Switching the atlas policy empties the atlas.
    pub fn configure(&mut self, f: impl FnOnce(&mut EngineConfig)) {
        let policy = self.config.atlas_policy;
        f(&mut self.config);
        self.projection = projection_for(&self.config);
        if self.config.atlas_policy != policy {
            for handle in self.atlas.clear() {
                self.backend.release_texture(handle);
            }
            self.atlas = Atlas::new(self.config.atlas_policy);
        }
    }

    /// Zero sizes, such as a minimized window, are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!("ignoring resize to {width}x{height}");
            return;
        }
        self.config.viewport = (width, height);
        self.projection.resize(width, height);
    }

    /// Decodes one texture upload and stamps it into the atlas.
    ///
    /// `length` is the upload's length word; the texel count comes from the
    /// header, and `data` must hold at least that many bytes.
    pub fn upload_texture(
        &mut self,
        header: u32,
        length: u32,
        data: &[u8],
        little_endian: bool,
    ) -> anyhow::Result<UploadOutcome> {
        let header = TextureHeader(header);
        if !header.is_texture() {
            debug!("skipping non-texture upload {:#010X}", header.0);
            return Ok(UploadOutcome::Skipped);
        }
        trace!(
            "texture upload {:#010X} length {length:#X}: {}x{} at {:?}, {:?}",
            header.0,
            header.width(),
            header.height(),
            header.position(),
            header.format()
        );

        let texels = decode_texture(header, data, little_endian)?;
        let handle = self.backend.create_texture(&texels)?;
        let rect = header.footprint();
        for orphan in self.atlas.stamp(rect, handle) {
            debug!("releasing fully overwritten texture {orphan:?}");
            self.backend.release_texture(orphan);
        }
        Ok(UploadOutcome::Stored {
            handle,
            cells: rect.cell_count(),
        })
    }

    /// Decodes the scene in `memory` and submits one frame to the backend.
    ///
    /// Faults never abort the frame; whatever decoded cleanly is drawn and
    /// the faults are counted in [`Context::stats`].
    pub fn update_frame(&mut self, memory: &MemoryMap<'_>) {
        self.stats = FrameStats::default();

        self.backend.set_depth_test(true, self.config.clear_depth);
        self.backend.set_projection(self.projection.calc_matrix());
        self.backend.load_identity();
        self.backend.scale(HANDEDNESS_FLIP);

        Traversal::new(
            *memory,
            &mut self.backend,
            &self.atlas,
            self.config.limits,
            &mut self.stats,
        )
        .draw_scene();

        self.backend.set_depth_test(false, false);
        debug!(
            "frame: {} descriptors, {} nodes, {} models, {} primitives, {} faults",
            self.stats.descriptors,
            self.stats.nodes,
            self.stats.models,
            self.stats.primitives(),
            self.stats.total_faults()
        );
    }

    /// Counters of the last [`Context::update_frame`].
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

fn projection_for(config: &EngineConfig) -> Projection {
    let (width, height) = config.viewport;
    Projection::new(
        width,
        height,
        Deg(config.fovy_degrees),
        config.znear,
        config.zfar,
    )
}
