//! Per-block color averaging.

use crate::frame::{Rgba, BYTES_PER_PIXEL};

use super::types::PixelateError;

/// Average the colors of one block.
///
/// `pixels` holds the block's pixels row-major, 4 bytes (R, G, B, A) each.
/// Every channel is summed independently and divided by the pixel count with
/// floor division; alpha gets no special treatment.
///
/// # Errors
/// * `PixelateError::MisalignedBlock` - length is not a multiple of 4
/// * `PixelateError::EmptyBlock` - the buffer holds no pixels
pub fn average_block(pixels: &[u8]) -> Result<Rgba, PixelateError> {
    if pixels.len() % BYTES_PER_PIXEL != 0 {
        return Err(PixelateError::MisalignedBlock { len: pixels.len() });
    }
    let count = (pixels.len() / BYTES_PER_PIXEL) as u64;
    if count == 0 {
        return Err(PixelateError::EmptyBlock);
    }

    let mut sums = [0u64; BYTES_PER_PIXEL];
    for px in pixels.chunks_exact(BYTES_PER_PIXEL) {
        for (sum, &channel) in sums.iter_mut().zip(px) {
            *sum += channel as u64;
        }
    }

    let channel = |sum: u64| (sum / count).min(u8::MAX as u64) as u8;
    Ok(Rgba::new(
        channel(sums[0]),
        channel(sums[1]),
        channel(sums[2]),
        channel(sums[3]),
    ))
}
