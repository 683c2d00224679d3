//! Per-scene matrix table.
//!
//! Each entry is twelve little-endian floats. The first three words hold the
//! translation, the remaining nine the 3x3 rotation/scale part in row-major
//! order. The bottom row is implicit.

use cgmath::Matrix4;

use crate::{
    data_structures::{address::Pointer, memory::MemoryMap, numeric::float_bits},
    error::DecodeError,
};

/// Words per table entry.
pub const MATRIX_WORDS: usize = 12;

#[derive(Debug, Clone, Copy)]
pub struct MatrixTable<'m> {
    memory: MemoryMap<'m>,
    base: Pointer,
}

impl<'m> MatrixTable<'m> {
    pub fn new(memory: MemoryMap<'m>, base: Pointer) -> Self {
        Self { memory, base }
    }

    pub fn base(&self) -> Pointer {
        self.base
    }

    /// Expands entry `index` to a 4x4 matrix with bottom row `(0, 0, 0, 1)`.
    pub fn get(&self, index: u32) -> Result<Matrix4<f32>, DecodeError> {
        let ptr = self.base.add(index as usize * MATRIX_WORDS * 4);
        let w = self.memory.words_le::<MATRIX_WORDS>(ptr)?.map(float_bits);
        // cgmath takes columns
        Ok(Matrix4::new(
            w[3], w[6], w[9], 0.0, //
            w[4], w[7], w[10], 0.0, //
            w[5], w[8], w[11], 0.0, //
            w[0], w[1], w[2], 1.0,
        ))
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector4;

    use super::*;
    use crate::data_structures::address::Region;

    fn table_bytes(entries: &[[f32; MATRIX_WORDS]]) -> Vec<u8> {
        entries
            .iter()
            .flatten()
            .flat_map(|f| f.to_bits().to_le_bytes())
            .collect()
    }

    #[test]
    fn test_entry_layout() {
        let entry = [
            10.0, 20.0, 30.0, // translation
            1.0, 2.0, 3.0, //
            4.0, 5.0, 6.0, //
            7.0, 8.0, 9.0,
        ];
        let bytes = table_bytes(&[[0.0; MATRIX_WORDS], entry]);
        let memory = MemoryMap::new(&[], &bytes, &[], &[]);
        let table = MatrixTable::new(memory, Pointer::new(Region::CullingB, 0));

        let m = table.get(1).unwrap();
        assert_eq!(m.x, Vector4::new(1.0, 4.0, 7.0, 0.0));
        assert_eq!(m.y, Vector4::new(2.0, 5.0, 8.0, 0.0));
        assert_eq!(m.z, Vector4::new(3.0, 6.0, 9.0, 0.0));
        assert_eq!(m.w, Vector4::new(10.0, 20.0, 30.0, 1.0));

        let p = m * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(p, Vector4::new(11.0, 24.0, 37.0, 1.0));
    }

    #[test]
    fn test_entry_past_end_is_out_of_bounds() {
        let bytes = table_bytes(&[[0.0; MATRIX_WORDS]]);
        let memory = MemoryMap::new(&[], &bytes, &[], &[]);
        let table = MatrixTable::new(memory, Pointer::new(Region::CullingB, 0));
        assert!(table.get(0).is_ok());
        assert!(matches!(table.get(1), Err(DecodeError::OutOfBounds { .. })));
    }
}
