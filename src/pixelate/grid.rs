//! Tiling of a frame into blocks.

use super::types::BlockSize;

/// One block of the grid, clamped to the frame bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRect {
    /// Block column index
    pub col: u32,
    /// Block row index
    pub row: u32,
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Width in pixels (smaller than the block size on the right edge)
    pub width: u32,
    /// Height in pixels (smaller than the block size on the bottom edge)
    pub height: u32,
}

impl BlockRect {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// The `ceil(width / block) x ceil(height / block)` grid covering a frame.
///
/// Edge blocks are clamped so they never extend past the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    width: u32,
    height: u32,
    block: u32,
}

impl BlockGrid {
    pub fn new(width: u32, height: u32, block: BlockSize) -> Self {
        Self {
            width,
            height,
            block: block.get(),
        }
    }

    /// Number of block columns.
    pub fn columns(&self) -> u32 {
        self.width.div_ceil(self.block)
    }

    /// Number of block rows.
    pub fn rows(&self) -> u32 {
        self.height.div_ceil(self.block)
    }

    /// Total number of blocks.
    pub fn len(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The block at (col, row), or `None` outside the grid.
    pub fn block(&self, col: u32, row: u32) -> Option<BlockRect> {
        if col >= self.columns() || row >= self.rows() {
            return None;
        }
        let x = col * self.block;
        let y = row * self.block;
        Some(BlockRect {
            col,
            row,
            x,
            y,
            width: self.block.min(self.width - x),
            height: self.block.min(self.height - y),
        })
    }

    /// Iterate blocks in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = BlockRect> + '_ {
        let columns = self.columns();
        (0..self.rows()).flat_map(move |row| (0..columns).filter_map(move |col| self.block(col, row)))
    }
}
