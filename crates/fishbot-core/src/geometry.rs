//! Rectangles and capture-region geometry
//!
//! All search regions and fixed click points are authored at the base
//! resolution and rescaled with independent horizontal/vertical factors.

use serde::{Deserialize, Serialize};

/// Reference resolution the templates and regions were authored at.
pub const BASE_WIDTH: u32 = 1920;
pub const BASE_HEIGHT: u32 = 1080;

/// A named search region in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rescale by independent factors, rounding each component.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            x: (self.x as f64 * sx).round() as i32,
            y: (self.y as f64 * sy).round() as i32,
            width: (self.width as f64 * sx).round() as u32,
            height: (self.height as f64 * sy).round() as u32,
        }
    }

    /// Shift the top-left corner, keeping the size.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Clamp to a `frame_width` x `frame_height` frame. Returns `None` when
    /// nothing usable remains.
    pub fn clamped_to(&self, frame_width: u32, frame_height: u32) -> Option<Self> {
        if frame_width == 0 || frame_height == 0 {
            return None;
        }
        let x = self.x.clamp(0, frame_width as i32 - 1);
        let y = self.y.clamp(0, frame_height as i32 - 1);
        let width = (self.width as i32).min(frame_width as i32 - x);
        let height = (self.height as i32).min(frame_height as i32 - y);
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self {
            x,
            y,
            width: width as u32,
            height: height as u32,
        })
    }
}

/// Screen-space rectangle the bot captures and acts inside, normally the
/// game window's client area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn scale_x(&self) -> f64 {
        self.width as f64 / BASE_WIDTH as f64
    }

    pub fn scale_y(&self) -> f64 {
        self.height as f64 / BASE_HEIGHT as f64
    }

    /// Map a point authored at the base resolution to screen coordinates.
    pub fn to_screen(&self, base_x: i32, base_y: i32) -> (i32, i32) {
        (
            (base_x as f64 * self.scale_x()).round() as i32 + self.left,
            (base_y as f64 * self.scale_y()).round() as i32 + self.top,
        )
    }
}

impl Default for CaptureRegion {
    fn default() -> Self {
        Self::new(0, 0, BASE_WIDTH, BASE_HEIGHT)
    }
}
