//! # 1-bit Framebuffer
//!
//! In-memory display the face renders into. One bit per pixel, rows packed
//! most-significant-bit first, the same layout monochrome watch and e-paper
//! panels take. A set bit is a lit (white) pixel.

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

/// Packed monochrome display buffer.
pub struct Framebuffer {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl Framebuffer {
    /// Create a dark (all pixels off) buffer.
    pub fn new(width: u32, height: u32) -> Self {
        // Each row has (width+7)/8 bytes
        let bytes_per_row = width.div_ceil(8);
        let buffer_size = (bytes_per_row * height) as usize;
        Self {
            width,
            height,
            buffer: vec![0x00; buffer_size],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[cfg(test)]
    fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: BinaryColor) {
        let byte = if color.is_on() { 0xFF } else { 0x00 };
        self.buffer.fill(byte);
    }

    /// Set one pixel; coordinates outside the buffer are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: BinaryColor) {
        if x >= self.width || y >= self.height {
            return;
        }

        let (index, mask) = self.locate(x, y);
        if color.is_on() {
            self.buffer[index] |= mask;
        } else {
            self.buffer[index] &= !mask;
        }
    }

    /// True if the pixel is lit. Out-of-range reads are dark.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (index, mask) = self.locate(x, y);
        self.buffer[index] & mask != 0
    }

    /// Number of lit pixels
    pub fn lit_pixels(&self) -> u32 {
        // fill() also sets the row padding bits
        (0..self.height)
            .map(|y| (0..self.width).filter(|&x| self.pixel(x, y)).count() as u32)
            .sum()
    }

    /// Lit pixels inside the given region
    pub fn lit_pixels_in(&self, x: u32, y: u32, w: u32, h: u32) -> u32 {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        (y..y_end)
            .map(|row| (x..x_end).filter(|&col| self.pixel(col, row)).count() as u32)
            .sum()
    }

    /// Render the buffer as text, one character per pixel.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(if self.pixel(x, y) { '█' } else { ' ' });
            }
            out.push('\n');
        }
        out
    }

    fn locate(&self, x: u32, y: u32) -> (usize, u8) {
        let bytes_per_row = self.width.div_ceil(8);
        let byte_index = (y * bytes_per_row + x / 8) as usize;
        let bit_mask = 0x80 >> (x % 8);
        (byte_index, bit_mask)
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}
