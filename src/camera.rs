use cgmath::{Matrix4, Rad, Vector3, perspective};

/// Maps OpenGL clip space (z in -1..1) to wgpu's (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Z scale applied to the model-view matrix. Real3D space is left-handed,
/// the projection expects right-handed coordinates.
pub const HANDEDNESS_FLIP: Vector3<f32> = Vector3::new(1.0, 1.0, -1.0);

/// Fixed perspective projection of the Real3D viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect(width, height),
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect(width, height);
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// OpenGL-convention projection matrix; backends targeting wgpu
    /// premultiply [`OPENGL_TO_WGPU_MATRIX`].
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Both sides are clamped to one pixel; the projection needs a positive aspect.
fn aspect(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}
