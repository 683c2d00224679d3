//! Model-view transform stack.
//!
//! Backends that do not have a fixed-function matrix stack of their own keep
//! one of these and transform vertices on the CPU before batching them.

use cgmath::{Matrix4, SquareMatrix, Vector3, Vector4};

#[derive(Debug, Clone)]
pub struct TransformStack {
    current: Matrix4<f32>,
    saved: Vec<Matrix4<f32>>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            current: Matrix4::identity(),
            saved: Vec::new(),
        }
    }

    pub fn current(&self) -> Matrix4<f32> {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Resets the current matrix and drops anything still pushed.
    pub fn load_identity(&mut self) {
        self.current = Matrix4::identity();
        self.saved.clear();
    }

    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restores the last pushed matrix. Returns false on an unbalanced pop.
    pub fn pop(&mut self) -> bool {
        match self.saved.pop() {
            Some(matrix) => {
                self.current = matrix;
                true
            }
            None => {
                log::warn!("transform stack popped more often than pushed");
                false
            }
        }
    }

    /// Post-multiplies, so `m` applies to vertices before the existing transform.
    pub fn multiply(&mut self, m: &Matrix4<f32>) {
        self.current = self.current * m;
    }

    pub fn translate(&mut self, v: Vector3<f32>) {
        self.multiply(&Matrix4::from_translation(v));
    }

    pub fn scale(&mut self, v: Vector3<f32>) {
        self.multiply(&Matrix4::from_nonuniform_scale(v.x, v.y, v.z));
    }

    pub fn apply(&self, position: [f32; 3]) -> [f32; 3] {
        let p = self.current * Vector4::new(position[0], position[1], position[2], 1.0);
        [p.x, p.y, p.z]
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_restores() {
        let mut stack = TransformStack::new();
        stack.translate(Vector3::new(1.0, 0.0, 0.0));
        stack.push();
        stack.translate(Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(stack.apply([0.0; 3]), [1.0, 2.0, 0.0]);
        assert!(stack.pop());
        assert_eq!(stack.apply([0.0; 3]), [1.0, 0.0, 0.0]);
        assert!(!stack.pop());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_multiply_order_matches_fixed_function() {
        let mut stack = TransformStack::new();
        stack.scale(Vector3::new(1.0, 1.0, -1.0));
        stack.translate(Vector3::new(0.0, 0.0, 5.0));
        // the translation is applied first, then the flip
        assert_eq!(stack.apply([0.0, 0.0, 1.0]), [0.0, 0.0, -6.0]);
    }
}
