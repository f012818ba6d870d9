// Core types shared by the transform model, gesture interpreter and compositor.

use image::RgbaImage;
use serde::Deserialize;

use crate::draw::{pack_argb, unpack_argb};

/// Software render surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,      // logical canvas width (pixels)
    pub height: usize,     // logical canvas height (pixels)
    pub pixels: Vec<u32>,  // each entry is 0xAARRGGBB; minifb ignores the AA byte
}

impl FrameBuffer {
    /// A cleared surface: every pixel fully transparent black.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    pub fn clear(&mut self) {
        for p in &mut self.pixels { *p = 0; }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Unpack into a straight-alpha RGBA image (what gets encoded on export).
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width as u32, self.height as u32);
        for (dst, &px) in out.pixels_mut().zip(self.pixels.iter()) {
            dst.0 = unpack_argb(px);
        }
        out
    }

    /// Pack an RGBA image into a surface (used to display a preview).
    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        let pixels = img.pixels().map(|p| pack_argb(p.0)).collect();
        Self { width: img.width() as usize, height: img.height() as usize, pixels }
    }
}

/// Immutable decoded image with known natural dimensions.
/// Background and overlay asset are both one of these once loaded.
#[derive(Clone, Debug)]
pub struct Raster {
    pub image: RgbaImage,
}

impl Raster {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// A 2D point in logical canvas (or client) pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Client coordinates → canvas-local coordinates.
    pub fn relative_to(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Placement of the overlay on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayTransform {
    pub x: f32,        // top-left, canvas pixels
    pub y: f32,
    pub width: f32,    // always > 0
    pub height: f32,   // always > 0
    pub rotation: f32, // degrees, unbounded
}

impl Default for OverlayTransform {
    fn default() -> Self {
        Self { x: 100.0, y: 100.0, width: 200.0, height: 200.0, rotation: 0.0 }
    }
}

impl OverlayTransform {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Hit test against the unrotated bounding box (edges inclusive).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_packing_keeps_alpha() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.pixels[1] = 0xFF_11_22_33;
        let img = fb.to_rgba_image();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0x11, 0x22, 0x33, 0xFF]);
        assert_eq!(FrameBuffer::from_rgba_image(&img), fb);
    }

    #[test]
    fn hit_test_ignores_rotation() {
        let t = OverlayTransform { rotation: 45.0, ..Default::default() };
        assert!(t.contains(Point::new(101.0, 101.0)));
        assert!(t.contains(Point::new(299.0, 299.0)));
        assert!(!t.contains(Point::new(99.0, 150.0)));
        assert!(!t.contains(Point::new(150.0, 301.0)));
    }
}
