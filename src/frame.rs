//! RGBA frame buffers shared by the capture, pixelation and output stages.

use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Bytes per pixel for every frame in the pipeline (R, G, B, A).
pub const BYTES_PER_PIXEL: usize = 4;

/// A single RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Composite over black, as a display without an alpha channel shows it.
    pub fn over_black(self) -> (u8, u8, u8) {
        let a = self.a as u16;
        let scale = |c: u8| ((c as u16 * a) / 255) as u8;
        (scale(self.r), scale(self.g), scale(self.b))
    }
}

/// A captured or processed frame.
///
/// Pixel data is row-major RGBA. Fields are public because frames come from
/// hardware: the declared dimensions are not trusted until the pixelation
/// stage validates them against the buffer length.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data, 4 bytes per pixel
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// When the frame was captured
    pub timestamp: Instant,
}

impl Frame {
    /// Wrap an existing RGBA buffer without validating its length.
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// A frame filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * BYTES_PER_PIXEL);
        for _ in 0..pixels {
            data.extend_from_slice(&color.to_bytes());
        }
        Self::from_raw(data, width, height)
    }

    /// Buffer length implied by the declared dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }

    /// Color of the pixel at (x, y), or `None` when out of bounds or the
    /// buffer is shorter than declared.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = self.data.get(idx..idx + BYTES_PER_PIXEL)?;
        Some(Rgba::new(px[0], px[1], px[2], px[3]))
    }

    /// Overwrite the pixel at (x, y). Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        if let Some(px) = self.data.get_mut(idx..idx + BYTES_PER_PIXEL) {
            px.copy_from_slice(&color.to_bytes());
        }
    }
}

/// Latest-frame slot shared between a capture thread and its readers.
///
/// Writers replace the frame wholesale under the lock, so readers see either
/// the previous complete frame or the new one, never a partial write. Readers
/// share the frame rather than copying its pixels.
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    inner: Arc<Mutex<Option<Arc<Frame>>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored frame.
    pub fn publish(&self, frame: Frame) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(Arc::new(frame));
        }
    }

    /// The most recent frame, if any. Repeated calls without a publish in
    /// between return the same `Arc`.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        self.inner.lock().ok()?.clone()
    }

    /// Drop the stored frame so readers see nothing until the next publish.
    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = None;
        }
    }

    /// Whether both handles refer to the same slot.
    pub fn same_slot(&self, other: &FrameSlot) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
