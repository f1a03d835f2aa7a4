//! Grayscale to RGBA conversion for display.
//!
//! This is the only place sample intensity is mapped to display intensity.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use crate::pgm::GrayImage;

/// A displayable RGBA8 bitmap with the same dimensions as its source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, four bytes per pixel.
    pub rgba: Vec<u8>,
}

impl RasterImage {
    /// Expand a grayscale image, inverting intensities when `negate` is set.
    #[must_use]
    pub fn from_gray(gray: &GrayImage, negate: bool) -> Self {
        let mut rgba = Vec::with_capacity(gray.pixels.len() * 4);
        for &sample in &gray.pixels {
            let v = if negate { 255 - sample } else { sample };
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
        Self { width: gray.width, height: gray.height, rgba }
    }

    /// Display intensity of the pixel at `(x, y)`, if in bounds.
    #[must_use]
    pub fn intensity(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba.get(index).copied()
    }
}
