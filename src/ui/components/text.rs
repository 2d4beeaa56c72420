// src/ui/components/text.rs
//! Text box shared by labels and buttons, and the label payload

use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use serde::{Deserialize, Serialize};

use crate::ui::color::{Color, ModeColor};
use crate::ui::fonts::{FontResolver, resolve_or_default};

/// Maximum text length in bytes; longer text is truncated at a char boundary.
pub const MAX_TEXT_LEN: usize = 64;

/// Maximum font name length in bytes.
pub const MAX_FONT_NAME_LEN: usize = 16;

/// Horizontal text alignment within an object's box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl From<TextAlignment> for Alignment {
    fn from(alignment: TextAlignment) -> Self {
        match alignment {
            TextAlignment::Left => Alignment::Left,
            TextAlignment::Center => Alignment::Center,
            TextAlignment::Right => Alignment::Right,
        }
    }
}

/// Copy `text` into a bounded string, cutting at the last char boundary that
/// fits.
pub(crate) fn bounded<const N: usize>(text: &str) -> heapless::String<N> {
    let mut end = text.len().min(N);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = heapless::String::new();
    out.push_str(&text[..end]).ok();
    out
}

/// Text content and its styling
#[derive(Debug, Clone)]
pub struct TextBox {
    text: heapless::String<MAX_TEXT_LEN>,
    text_color: Color,
    background_color: Color,
    font: heapless::String<MAX_FONT_NAME_LEN>,
    alignment: TextAlignment,
}

impl Default for TextBox {
    fn default() -> Self {
        Self {
            text: heapless::String::new(),
            text_color: Color::WHITE,
            background_color: Color::BLACK,
            font: heapless::String::new(),
            alignment: TextAlignment::Left,
        }
    }
}

impl TextBox {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = bounded(text);
    }

    pub fn text_color(&self) -> Color {
        self.text_color
    }

    pub fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    pub fn background_color(&self) -> Color {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: Color) {
        self.background_color = color;
    }

    pub fn font(&self) -> &str {
        &self.font
    }

    pub fn set_font(&mut self, name: &str) {
        self.font = bounded(name);
    }

    pub fn alignment(&self) -> TextAlignment {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: TextAlignment) {
        self.alignment = alignment;
    }

    fn text_position(&self, area: &Rectangle) -> Point {
        let y = area.top_left.y + area.size.height as i32 / 2;
        match self.alignment {
            TextAlignment::Left => Point::new(area.top_left.x, y),
            TextAlignment::Center => Point::new(area.center().x, y),
            TextAlignment::Right => Point::new(area.top_left.x + area.size.width as i32 - 1, y),
        }
    }

    /// Fill `area` with `fill`, then draw the text in `ink`, clipped to `area`.
    pub(crate) fn draw_with<C, D>(
        &self,
        target: &mut D,
        area: Rectangle,
        fill: Color,
        ink: Color,
        fonts: &dyn FontResolver,
    ) -> Result<(), D::Error>
    where
        C: ModeColor,
        D: DrawTarget<Color = C>,
    {
        let mut clipped = target.clipped(&area);
        area.into_styled(PrimitiveStyle::with_fill(C::reduce(fill)))
            .draw(&mut clipped)?;

        if self.text.is_empty() {
            return Ok(());
        }

        let font = resolve_or_default(fonts, &self.font);
        let character_style = MonoTextStyle::new(font, C::reduce(ink));
        let text_style = TextStyleBuilder::new()
            .alignment(self.alignment.into())
            .baseline(Baseline::Middle)
            .build();

        Text::with_text_style(
            &self.text,
            self.text_position(&area),
            character_style,
            text_style,
        )
        .draw(&mut clipped)?;

        Ok(())
    }
}

/// Static text label
#[derive(Debug, Clone, Default)]
pub struct Label {
    pub(crate) text: TextBox,
}

impl Label {
    pub fn text_box(&self) -> &TextBox {
        &self.text
    }

    pub(crate) fn draw<C, D>(
        &self,
        target: &mut D,
        area: Rectangle,
        fonts: &dyn FontResolver,
    ) -> Result<(), D::Error>
    where
        C: ModeColor,
        D: DrawTarget<Color = C>,
    {
        let text = &self.text;
        text.draw_with(
            target,
            area,
            text.background_color(),
            text.text_color(),
            fonts,
        )
    }
}
