//! Color values and color-mode reduction
//!
//! Objects carry colors as 24-bit RGB (`0xRRGGBB`), independent of the panel.
//! Each display color mode supplies a [`ModeColor`] implementation that
//! reduces RGB to the pixel format its framebuffer stores. Per-variant drawing
//! code is generic over `ModeColor`, so adding a mode never touches it.
//!
//! # Mono 1bpp
//! RGB is collapsed to on/off by luma (ITU-R BT.601 weights, 8.8 fixed point)
//! against [`MONO_THRESHOLD`].

use embedded_graphics::pixelcolor::{BinaryColor, Rgb888};
use embedded_graphics::prelude::*;
use serde::{Deserialize, Serialize};

/// Luma at or above which a color is drawn as "on" on a 1bpp panel.
pub const MONO_THRESHOLD: u8 = 128;

/// 24-bit RGB color (`0xRRGGBB`). The top byte is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x00_00_00);
    pub const WHITE: Color = Color(0xFF_FF_FF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Perceived brightness, 0-255
    pub const fn luma(self) -> u8 {
        ((77 * self.r() as u32 + 150 * self.g() as u32 + 29 * self.b() as u32) >> 8) as u8
    }

    /// Gray level for a `bpp`-deep sample, scaled to the full 0-255 range.
    pub fn from_gray_level(level: u8, bpp: u8) -> Self {
        let max = ((1u16 << bpp) - 1) as u32;
        let gray = (level as u32 * 255 / max.max(1)) as u8;
        Self::rgb(gray, gray, gray)
    }
}

impl From<u32> for Color {
    fn from(value: u32) -> Self {
        Self(value & 0x00FF_FFFF)
    }
}

impl From<Color> for Rgb888 {
    fn from(color: Color) -> Self {
        Rgb888::new(color.r(), color.g(), color.b())
    }
}

/// Color depth of a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    /// 1 bit per pixel, packed MSB first
    #[default]
    Mono1Bpp,
}

impl ColorMode {
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            ColorMode::Mono1Bpp => 1,
        }
    }

    /// Bytes needed for one `width` x `height` frame in this mode.
    pub const fn buffer_size(self, width: u16, height: u16) -> usize {
        let bits = width as usize * height as usize * self.bits_per_pixel() as usize;
        bits.div_ceil(8)
    }
}

/// Pixel color a display mode stores, reduced from RGB.
pub trait ModeColor: PixelColor {
    /// Color the frame is cleared to before compositing.
    const BACKGROUND: Self;

    /// Reduce an RGB color to this mode.
    fn reduce(color: Color) -> Self;
}

impl ModeColor for BinaryColor {
    const BACKGROUND: Self = BinaryColor::Off;

    fn reduce(color: Color) -> Self {
        if color.luma() >= MONO_THRESHOLD {
            BinaryColor::On
        } else {
            BinaryColor::Off
        }
    }
}
