//! 1-bit-per-pixel framebuffer over a caller-owned byte buffer.
//!
//! Each display renders into one of its two buffers through this draw target.
//! Pixels are packed as a single bit stream in row-major order: pixel
//! `(x, y)` is bit `y * width + x`, most significant bit first within each
//! byte. A set bit is [`BinaryColor::On`].

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

#[inline]
fn bit_position(width: u16, x: usize, y: usize) -> (usize, u8) {
    let bit = y * width as usize + x;
    (bit / 8, 0x80 >> (bit % 8))
}

/// Read one pixel of a packed mono frame. Out-of-range coordinates read as
/// off.
pub fn mono_pixel(frame: &[u8], width: u16, height: u16, x: u32, y: u32) -> BinaryColor {
    if x >= width as u32 || y >= height as u32 {
        return BinaryColor::Off;
    }
    let (byte, mask) = bit_position(width, x as usize, y as usize);
    match frame.get(byte) {
        Some(value) if value & mask != 0 => BinaryColor::On,
        _ => BinaryColor::Off,
    }
}

/// Mono draw target borrowing a display buffer for the length of one render.
pub struct MonoFrame<'b> {
    buffer: &'b mut [u8],
    width: u16,
    height: u16,
}

impl<'b> MonoFrame<'b> {
    /// Wrap `buffer` as a `width` x `height` frame. Writes that would land
    /// past the end of a short buffer are dropped.
    pub fn new(buffer: &'b mut [u8], width: u16, height: u16) -> Self {
        Self {
            buffer,
            width,
            height,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> BinaryColor {
        mono_pixel(self.buffer, self.width, self.height, x, y)
    }

    /// Write a single in-bounds pixel.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: BinaryColor) {
        let (byte, mask) = bit_position(self.width, x, y);
        if let Some(value) = self.buffer.get_mut(byte) {
            if color.is_on() {
                *value |= mask;
            } else {
                *value &= !mask;
            }
        }
    }
}

impl OriginDimensions for MonoFrame<'_> {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for MonoFrame<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let w = self.width as i32;
        let h = self.height as i32;

        for Pixel(coord, color) in pixels {
            if coord.x >= 0 && coord.y >= 0 && coord.x < w && coord.y < h {
                self.set_pixel(coord.x as usize, coord.y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };

        for y in area.top_left.y..=bottom_right.y {
            for x in area.top_left.x..=bottom_right.x {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = if color.is_on() { 0xFF } else { 0x00 };
        self.buffer.fill(fill);
        Ok(())
    }
}
