//! Captured frame buffer

use image::RgbImage;

use crate::geometry::CaptureRegion;

/// One captured image plus the screen-space origin it was grabbed at.
/// Frames are owned values; the capture side hands out private copies so
/// consumers never share a buffer with the capture thread.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub left: i32,
    pub top: i32,
}

impl Frame {
    pub fn new(image: RgbImage, left: i32, top: i32) -> Self {
        Self { image, left, top }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn region(&self) -> CaptureRegion {
        CaptureRegion::new(self.left, self.top, self.width(), self.height())
    }
}
