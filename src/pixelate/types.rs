//! Block size and pixelation error types.

use std::fmt;

/// Edge length, in pixels, of the square blocks a frame is tiled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockSize(u32);

impl BlockSize {
    /// Block size used when nothing is configured.
    pub const DEFAULT: BlockSize = BlockSize(8);

    /// Largest block size accepted from configuration.
    pub const MAX: u32 = 256;

    /// Create a block size, rejecting zero and anything above [`BlockSize::MAX`].
    pub fn new(pixels: u32) -> Result<Self, PixelateError> {
        if pixels == 0 || pixels > Self::MAX {
            return Err(PixelateError::InvalidBlockSize(pixels));
        }
        Ok(Self(pixels))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.0)
    }
}

/// Errors raised while pixelating a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PixelateError {
    /// A block with no pixels reached the averager
    #[error("block contains no pixels")]
    EmptyBlock,

    /// A block buffer whose length is not a whole number of RGBA pixels
    #[error("block buffer length {len} is not a multiple of 4")]
    MisalignedBlock { len: usize },

    /// Declared frame dimensions disagree with the pixel buffer
    #[error("frame declared {width}x{height} ({expected} bytes) but buffer holds {actual} bytes")]
    FrameSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// The source frame has zero width or height
    #[error("frame has zero size ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },

    /// Block size outside 1..=256
    #[error("block size must be between 1 and {max}, got {0}", max = BlockSize::MAX)]
    InvalidBlockSize(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_rejects_zero() {
        assert_eq!(BlockSize::new(0), Err(PixelateError::InvalidBlockSize(0)));
    }

    #[test]
    fn test_block_size_rejects_oversized() {
        assert!(BlockSize::new(257).is_err());
        assert_eq!(BlockSize::new(256).unwrap().get(), 256);
    }

    #[test]
    fn test_block_size_default() {
        assert_eq!(BlockSize::default().get(), 8);
        assert_eq!(BlockSize::default().to_string(), "8px");
    }

    #[test]
    fn test_frame_size_mismatch_display() {
        let err = PixelateError::FrameSizeMismatch {
            width: 4,
            height: 4,
            expected: 64,
            actual: 60,
        };
        let msg = err.to_string();
        assert!(msg.contains("4x4"));
        assert!(msg.contains("60"));
    }
}
