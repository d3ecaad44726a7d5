//! A software RGB raster target.

use crate::render::settings::Color;
use crate::worker::error::RenderFault;
use std::io::Cursor;

/// Fixed-size RGB8 framebuffer with a few primitive drawing operations.
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Framebuffer {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Color) {
        let [r, g, b] = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(3) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }

    pub fn set_pixel(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels[offset..offset + 3].copy_from_slice(&rgb);
    }

    /// Fills a square of `2 * half_size + 1` pixels centered at (cx, cy).
    /// The fill is clipped to the buffer, so the cost is bounded by the
    /// buffer size no matter how large the square is.
    pub fn fill_square(&mut self, cx: i64, cy: i64, half_size: i64, rgb: [u8; 3]) {
        let x0 = cx.saturating_sub(half_size).max(0);
        let x1 = cx.saturating_add(half_size).min(self.width as i64 - 1);
        let y0 = cy.saturating_sub(half_size).max(0);
        let y1 = cy.saturating_add(half_size).min(self.height as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.set_pixel(x, y, rgb);
            }
        }
    }

    /// Fills a disc of the given pixel radius centered at (cx, cy),
    /// clipped to the buffer like [Self::fill_square].
    pub fn fill_disc(&mut self, cx: i64, cy: i64, radius: i64, rgb: [u8; 3]) {
        let radius = radius.clamp(0, self.width.max(self.height) as i64);
        let x0 = cx.saturating_sub(radius).max(0);
        let x1 = cx.saturating_add(radius).min(self.width as i64 - 1);
        let y0 = cy.saturating_sub(radius).max(0);
        let y1 = cy.saturating_add(radius).min(self.height as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x - cx;
                let dy = y - cy;
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel(x, y, rgb);
                }
            }
        }
    }

    /// Draws a line between the two endpoints (Bresenham).
    pub fn draw_line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, rgb: [u8; 3]) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);
        loop {
            self.set_pixel(x, y, rgb);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Encodes the current raster content as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderFault> {
        let img: image::RgbImage =
            image::ImageBuffer::from_raw(self.width, self.height, self.pixels.clone())
                .ok_or(RenderFault::BadFramebuffer)?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)?;
        Ok(bytes)
    }
}
