//! Sprite payload: frames cut from a packed static image
//!
//! Image layout: frames are stacked one after another, each `height` rows of
//! `ceil(width * bpp / 8)` bytes, pixels packed MSB first. A frame is
//! `row_stride * height` bytes and the frame count is whatever fits in the
//! image. Samples are scaled to gray and reduced by the display's color mode.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::ui::color::{Color, ModeColor};

/// Sprite payload
#[derive(Debug, Clone, Copy, Default)]
pub struct Sprite {
    image: &'static [u8],
    width: u16,
    height: u16,
    bpp: u8,
    frame: u16,
}

impl Sprite {
    pub(crate) fn set_image(&mut self, image: &'static [u8], width: u16, height: u16, bpp: u8) {
        self.image = image;
        self.width = width;
        self.height = height;
        self.bpp = bpp;
    }

    pub(crate) fn set_frame(&mut self, frame: u16) {
        self.frame = frame;
    }

    pub fn image(&self) -> &'static [u8] {
        self.image
    }

    pub fn frame_width(&self) -> u16 {
        self.width
    }

    pub fn frame_height(&self) -> u16 {
        self.height
    }

    pub fn bpp(&self) -> u8 {
        self.bpp
    }

    pub fn frame(&self) -> u16 {
        self.frame
    }

    fn supported_bpp(&self) -> bool {
        matches!(self.bpp, 1 | 2 | 4 | 8)
    }

    /// Bytes per image row.
    pub fn row_stride(&self) -> usize {
        (self.width as usize * self.bpp as usize).div_ceil(8)
    }

    /// Bytes per frame; zero for an unset or unsupported image.
    pub fn frame_stride(&self) -> usize {
        if !self.supported_bpp() {
            return 0;
        }
        self.row_stride() * self.height as usize
    }

    /// Number of complete frames in the image.
    pub fn frame_count(&self) -> usize {
        match self.frame_stride() {
            0 => 0,
            stride => self.image.len() / stride,
        }
    }

    /// The bytes of the current frame, or `None` if it is not fully contained
    /// in the image.
    fn frame_data(&self) -> Option<&'static [u8]> {
        if (self.frame as usize) >= self.frame_count() {
            return None;
        }
        let stride = self.frame_stride();
        let start = self.frame as usize * stride;
        self.image.get(start..start + stride)
    }

    fn sample(&self, frame: &[u8], x: usize, y: usize) -> u8 {
        let bpp = self.bpp as usize;
        let bit = x * bpp;
        let byte = frame[y * self.row_stride() + bit / 8];
        let shift = 8 - bpp - (bit % 8);
        (byte >> shift) & ((1u16 << bpp) - 1) as u8
    }

    /// Blit the current frame at `area.top_left`, clipped to `area.size`.
    /// A missing or out-of-range frame draws nothing.
    pub(crate) fn draw<C, D>(&self, target: &mut D, area: Rectangle) -> Result<(), D::Error>
    where
        C: ModeColor,
        D: DrawTarget<Color = C>,
    {
        let Some(frame) = self.frame_data() else {
            return Ok(());
        };

        let w = (self.width as usize).min(area.size.width as usize);
        let h = (self.height as usize).min(area.size.height as usize);
        let origin = area.top_left;

        let pixels = (0..h).flat_map(move |y| {
            (0..w).map(move |x| {
                let level = self.sample(frame, x, y);
                let color = C::reduce(Color::from_gray_level(level, self.bpp));
                Pixel(origin + Point::new(x as i32, y as i32), color)
            })
        });

        target.draw_iter(pixels)
    }
}
