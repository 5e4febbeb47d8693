//! Drawing surfaces.
//!
//! A surface belongs to the caller. The session borrows it after
//! [`EditSession::initialize_canvas`](crate::session::EditSession::initialize_canvas)
//! and only ever issues full redraws; it never creates, resizes or disposes it.

use image::RgbaImage;

pub trait Surface {
    /// Replace the surface contents with `frame`.
    fn draw(&mut self, frame: &RgbaImage);

    /// Blank the surface after the document is removed.
    fn clear(&mut self) {}
}

/// Headless surface that keeps the last frame in memory.
#[derive(Debug, Default)]
pub struct BufferSurface {
    frame: Option<RgbaImage>,
    draws: usize,
}

impl BufferSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }

    /// Number of draws since creation.
    pub fn draw_count(&self) -> usize {
        self.draws
    }
}

impl Surface for BufferSurface {
    fn draw(&mut self, frame: &RgbaImage) {
        self.frame = Some(frame.clone());
        self.draws += 1;
    }

    fn clear(&mut self) {
        self.frame = None;
    }
}
