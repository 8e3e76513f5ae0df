//! Frame conversion and transformation utilities.

use nokhwa::pixel_format::RgbAFormat;

use crate::frame::{Frame, BYTES_PER_PIXEL};

/// Decode a nokhwa buffer (MJPEG, YUYV, NV12, ...) into an RGBA frame.
///
/// Returns `None` if the conversion fails (unsupported format or corrupt data).
pub fn convert_to_rgba(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbAFormat>().ok()?;
    let resolution = buffer.resolution();

    Some(Frame::from_raw(
        decoded.into_raw(),
        resolution.width(),
        resolution.height(),
    ))
}

/// Mirror a frame horizontally (flip left-right) for selfie mode.
///
/// Frames whose buffer is shorter than declared are left untouched.
pub fn mirror_horizontal(frame: &mut Frame) {
    let stride = frame.width as usize * BYTES_PER_PIXEL;
    if stride == 0 || frame.data.len() < frame.expected_len() {
        return;
    }

    let width = frame.width as usize;
    for row in frame.data.chunks_exact_mut(stride) {
        for x in 0..width / 2 {
            let left = x * BYTES_PER_PIXEL;
            let right = (width - 1 - x) * BYTES_PER_PIXEL;
            for i in 0..BYTES_PER_PIXEL {
                row.swap(left + i, right + i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_horizontal_2x1() {
        let mut frame = Frame::from_raw(vec![1, 2, 3, 4, 5, 6, 7, 8], 2, 1);
        mirror_horizontal(&mut frame);
        assert_eq!(frame.data, vec![5, 6, 7, 8, 1, 2, 3, 4]);
    }

    #[test]
    fn test_mirror_horizontal_3x2() {
        // Row 0: A B C, row 1: D E F
        let mut frame = Frame::from_raw(
            vec![
                1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, //
                4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 6,
            ],
            3,
            2,
        );
        mirror_horizontal(&mut frame);
        assert_eq!(
            frame.data,
            vec![
                3, 3, 3, 3, 2, 2, 2, 2, 1, 1, 1, 1, //
                6, 6, 6, 6, 5, 5, 5, 5, 4, 4, 4, 4,
            ]
        );
    }

    #[test]
    fn test_mirror_horizontal_single_pixel() {
        let mut frame = Frame::from_raw(vec![1, 2, 3, 4], 1, 1);
        mirror_horizontal(&mut frame);
        assert_eq!(frame.data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_mirror_skips_short_buffer() {
        let mut frame = Frame::from_raw(vec![1, 2, 3, 4], 2, 1);
        mirror_horizontal(&mut frame);
        assert_eq!(frame.data, vec![1, 2, 3, 4]);
    }
}
