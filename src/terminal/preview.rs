//! Truecolor terminal preview of pixelated frames.
//!
//! Each block of the pixelated frame becomes half a character cell: the
//! upper half block glyph is drawn with the top block's color as foreground
//! and the bottom block's color as background. The picture is clipped to the
//! terminal, leaving the last row for the status bar when one is shown.

use std::fmt::Write as _;
use std::io::Write;

use crate::frame::{Frame, Rgba};
use crate::pixelate::BlockSize;
use crate::render_loop::{OutputSink, SinkError};

const UPPER_HALF: char = '▀';

pub struct TerminalSink<W: Write + Send> {
    out: W,
    block: BlockSize,
    cols: u16,
    rows: u16,
    status: Option<String>,
    /// Clear the screen before the next frame (after a resize)
    needs_clear: bool,
    buf: String,
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W, block: BlockSize, cols: u16, rows: u16) -> Self {
        Self {
            out,
            block,
            cols,
            rows,
            status: None,
            needs_clear: true,
            buf: String::new(),
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.needs_clear = true;
    }

    /// Text for the bottom row, or `None` to give the row to the picture.
    pub fn set_status(&mut self, status: Option<String>) {
        if status.is_some() != self.status.is_some() {
            self.needs_clear = true;
        }
        self.status = status;
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn image_rows(&self) -> u16 {
        if self.status.is_some() {
            self.rows.saturating_sub(1)
        } else {
            self.rows
        }
    }

    /// Build the escape sequence for one frame into `self.buf`.
    fn compose(&mut self, frame: &Frame) {
        let block = self.block.get();
        let grid_cols = frame.width.div_ceil(block);
        let grid_rows = frame.height.div_ceil(block);
        let draw_cols = grid_cols.min(self.cols as u32);
        let draw_rows = grid_rows.div_ceil(2).min(self.image_rows() as u32);

        let buf = &mut self.buf;
        buf.clear();
        if self.needs_clear {
            buf.push_str("\x1b[0m\x1b[2J");
            self.needs_clear = false;
        }

        let color_at = |col: u32, row: u32| -> Option<(u8, u8, u8)> {
            if row >= grid_rows {
                return None;
            }
            Some(
                frame
                    .pixel(col * block, row * block)
                    .unwrap_or(Rgba::BLACK)
                    .over_black(),
            )
        };

        for cy in 0..draw_rows {
            let _ = write!(buf, "\x1b[{};1H", cy + 1);
            let mut last: Option<((u8, u8, u8), Option<(u8, u8, u8)>)> = None;
            for cx in 0..draw_cols {
                let top = color_at(cx, cy * 2).unwrap_or((0, 0, 0));
                let bottom = color_at(cx, cy * 2 + 1);
                if last != Some((top, bottom)) {
                    let _ = write!(buf, "\x1b[38;2;{};{};{}m", top.0, top.1, top.2);
                    match bottom {
                        Some((r, g, b)) => {
                            let _ = write!(buf, "\x1b[48;2;{};{};{}m", r, g, b);
                        }
                        None => buf.push_str("\x1b[49m"),
                    }
                    last = Some((top, bottom));
                }
                buf.push(UPPER_HALF);
            }
            buf.push_str("\x1b[0m\x1b[K");
        }

        if let Some(status) = &self.status {
            let text: String = status.chars().take(self.cols as usize).collect();
            let _ = write!(buf, "\x1b[{};1H\x1b[7m{}\x1b[K\x1b[0m", self.rows, text);
        }
    }
}

impl<W: Write + Send> OutputSink for TerminalSink<W> {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), SinkError> {
        if self.cols == 0 || self.image_rows() == 0 {
            return Err(SinkError::Unavailable(format!(
                "terminal too small ({}x{})",
                self.cols, self.rows
            )));
        }
        self.compose(frame);
        self.out.write_all(self.buf.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
