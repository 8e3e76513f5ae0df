//! Block-averaging pixelation.
//!
//! - [`average_block`] reduces one block's pixels to a single color
//! - [`FrameProcessor`] tiles a frame into blocks and repaints each one flat
//! - [`BlockGrid`] enumerates the block rectangles of a frame

mod average;
mod grid;
mod processor;
mod types;

pub use average::average_block;
pub use grid::{BlockGrid, BlockRect};
pub use processor::{pixelate, FrameProcessor};
pub use types::{BlockSize, PixelateError};
