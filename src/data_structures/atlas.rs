//! Texture sheet occupancy grid.
//!
//! Real3D texture memory is treated as one 2048x2048 sheet (two 2048x1024
//! sheets stacked). The smallest texture is 32x32, so the sheet is tracked as
//! a 64x64 grid of cells, each naming the backend texture that was last
//! uploaded over it. Polygons look their texture up by the cell under their
//! texture origin.

use std::collections::HashMap;

use crate::render::TextureHandle;

pub const GRID_SIZE: usize = 64;
pub const CELL_TEXELS: u32 = 32;

/// What happens to a backend texture once uploads have covered all its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtlasPolicy {
    /// Overwritten textures stay alive in the backend.
    #[default]
    Overwrite,
    /// Count cells per handle and release handles that drop to zero.
    RefCounted,
}

/// Grid rectangle in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl CellRect {
    /// Footprint of a texture at texel origin (`x`, `y`) of size `width`x`height`,
    /// clipped to the grid.
    pub fn from_texels(x: u32, y: u32, width: u32, height: u32) -> Self {
        let row = (y / CELL_TEXELS) as usize;
        let col = (x / CELL_TEXELS) as usize;
        let rows = (height / CELL_TEXELS) as usize;
        let cols = (width / CELL_TEXELS) as usize;
        Self {
            row: row.min(GRID_SIZE),
            col: col.min(GRID_SIZE),
            rows: rows.min(GRID_SIZE.saturating_sub(row)),
            cols: cols.min(GRID_SIZE.saturating_sub(col)),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.row..self.row + self.rows)
            .flat_map(move |r| (self.col..self.col + self.cols).map(move |c| (r, c)))
    }
}

#[derive(Debug, Clone)]
pub struct Atlas {
    cells: Vec<Option<TextureHandle>>,
    policy: AtlasPolicy,
    refs: HashMap<TextureHandle, usize>,
}

impl Atlas {
    pub fn new(policy: AtlasPolicy) -> Self {
        Self {
            cells: vec![None; GRID_SIZE * GRID_SIZE],
            policy,
            refs: HashMap::new(),
        }
    }

    pub fn policy(&self) -> AtlasPolicy {
        self.policy
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<TextureHandle> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return None;
        }
        self.cells[row * GRID_SIZE + col]
    }

    /// Texture covering the texel origin (`base_u`, `base_v`) of a polygon.
    pub fn handle_for_base(&self, base_u: u32, base_v: u32) -> Option<TextureHandle> {
        self.cell(
            (base_v / CELL_TEXELS) as usize,
            (base_u / CELL_TEXELS) as usize,
        )
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Stamps `handle` over every cell of `rect`, unconditionally replacing
    /// earlier occupants. Returns the handles that lost their last cell, which
    /// is always empty under [`AtlasPolicy::Overwrite`].
    pub fn stamp(&mut self, rect: CellRect, handle: TextureHandle) -> Vec<TextureHandle> {
        let mut orphaned = Vec::new();
        for (row, col) in rect.cells() {
            let previous = self.cells[row * GRID_SIZE + col].replace(handle);
            if self.policy == AtlasPolicy::RefCounted {
                *self.refs.entry(handle).or_insert(0) += 1;
                if let Some(previous) = previous {
                    if self.release_ref(previous) {
                        orphaned.push(previous);
                    }
                }
            }
        }
        orphaned.sort_unstable();
        orphaned
    }

    /// Drops one cell reference; true when it was the last one.
    fn release_ref(&mut self, handle: TextureHandle) -> bool {
        match self.refs.get_mut(&handle) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.refs.remove(&handle);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) -> Vec<TextureHandle> {
        self.cells.iter_mut().for_each(|cell| *cell = None);
        let mut live: Vec<TextureHandle> = self.refs.drain().map(|(h, _)| h).collect();
        live.sort_unstable();
        live
    }
}

impl Default for Atlas {
    fn default() -> Self {
        Self::new(AtlasPolicy::default())
    }
}
