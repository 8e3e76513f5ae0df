//! Whole-frame pixelation.

use crate::frame::{Frame, Rgba, BYTES_PER_PIXEL};

use super::average::average_block;
use super::grid::{BlockGrid, BlockRect};
use super::types::{BlockSize, PixelateError};

/// Pixelates frames by flattening every block to its average color.
///
/// Holds a scratch buffer for gathering block pixels and one for the block
/// colors, so the hot path does not allocate once warmed up. Each call
/// processes the full grid; a caller never sees a partially pixelated frame.
#[derive(Debug)]
pub struct FrameProcessor {
    block: BlockSize,
    scratch: Vec<u8>,
    colors: Vec<(BlockRect, Rgba)>,
}

impl FrameProcessor {
    pub fn new(block: BlockSize) -> Self {
        let side = block.get() as usize;
        Self {
            block,
            scratch: Vec::with_capacity(side * side * BYTES_PER_PIXEL),
            colors: Vec::new(),
        }
    }

    pub fn block_size(&self) -> BlockSize {
        self.block
    }

    /// Pixelate `source` into a newly allocated frame of the same size.
    pub fn process(&mut self, source: &Frame) -> Result<Frame, PixelateError> {
        let mut out = Frame::from_raw(Vec::new(), 0, 0);
        self.process_into(source, &mut out)?;
        Ok(out)
    }

    /// Pixelate `source` into `out`, reusing its allocation.
    ///
    /// `source` is only read. On error `out` is left untouched.
    ///
    /// # Errors
    /// * `PixelateError::EmptyFrame` - width or height is zero
    /// * `PixelateError::FrameSizeMismatch` - buffer length disagrees with
    ///   the declared dimensions
    pub fn process_into(&mut self, source: &Frame, out: &mut Frame) -> Result<(), PixelateError> {
        validate(source)?;

        let grid = BlockGrid::new(source.width, source.height, self.block);
        self.colors.clear();
        self.colors.reserve(grid.len());
        for rect in grid.iter() {
            gather(source, &rect, &mut self.scratch);
            let color = average_block(&self.scratch)?;
            self.colors.push((rect, color));
        }

        out.width = source.width;
        out.height = source.height;
        out.timestamp = source.timestamp;
        out.data.clear();
        out.data.resize(source.expected_len(), 0);
        for (rect, color) in &self.colors {
            paint(out, rect, *color);
        }
        Ok(())
    }
}

/// Pixelate a single frame with the given block size.
pub fn pixelate(source: &Frame, block: BlockSize) -> Result<Frame, PixelateError> {
    FrameProcessor::new(block).process(source)
}

fn validate(frame: &Frame) -> Result<(), PixelateError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PixelateError::EmptyFrame {
            width: frame.width,
            height: frame.height,
        });
    }
    let expected = frame.expected_len();
    if frame.data.len() != expected {
        return Err(PixelateError::FrameSizeMismatch {
            width: frame.width,
            height: frame.height,
            expected,
            actual: frame.data.len(),
        });
    }
    Ok(())
}

/// Copy the in-bounds pixels of `rect` into `buf`, row by row.
fn gather(frame: &Frame, rect: &BlockRect, buf: &mut Vec<u8>) {
    let stride = frame.width as usize * BYTES_PER_PIXEL;
    let row_len = rect.width as usize * BYTES_PER_PIXEL;
    buf.clear();
    for row in 0..rect.height as usize {
        let start = (rect.y as usize + row) * stride + rect.x as usize * BYTES_PER_PIXEL;
        buf.extend_from_slice(&frame.data[start..start + row_len]);
    }
}

fn paint(frame: &mut Frame, rect: &BlockRect, color: Rgba) {
    let stride = frame.width as usize * BYTES_PER_PIXEL;
    let bytes = color.to_bytes();
    for row in 0..rect.height as usize {
        let start = (rect.y as usize + row) * stride + rect.x as usize * BYTES_PER_PIXEL;
        let end = start + rect.width as usize * BYTES_PER_PIXEL;
        for px in frame.data[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&bytes);
        }
    }
}
