// src/ui/components/button.rs
//! Button payload: a text box with a click handler and focus state

use core::fmt;

use alloc::boxed::Box;
use embedded_graphics::Drawable as EgDrawable;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

use crate::object_store::ObjectStore;
use crate::ui::color::ModeColor;
use crate::ui::components::text::TextBox;
use crate::ui::core::ObjectId;
use crate::ui::fonts::FontResolver;

/// Called when a button is clicked (press then release over the same button,
/// or an encoder activate while it has focus).
pub type ClickHandler = Box<dyn FnMut(&mut ObjectStore, ObjectId)>;

/// Button payload
///
/// # Visual states
/// - Normal: background fill, text, one-pixel border in the text color
/// - Selected (focused) or pressed: inverted fill, text in the background color
#[derive(Default)]
pub struct Button {
    pub(crate) text: TextBox,
    pub(crate) on_click: Option<ClickHandler>,
    selected: bool,
    pressed: bool,
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("text", &self.text)
            .field("on_click", &self.on_click.is_some())
            .field("selected", &self.selected)
            .field("pressed", &self.pressed)
            .finish()
    }
}

impl Button {
    pub fn text_box(&self) -> &TextBox {
        &self.text
    }

    /// Focus/selection state set by the caller or by focus navigation.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// True between an accepted press on this button and the next release.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub(crate) fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
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
        if self.selected || self.pressed {
            return text.draw_with(
                target,
                area,
                text.text_color(),
                text.background_color(),
                fonts,
            );
        }

        text.draw_with(
            target,
            area,
            text.background_color(),
            text.text_color(),
            fonts,
        )?;
        area.into_styled(PrimitiveStyle::with_stroke(C::reduce(text.text_color()), 1))
            .draw(&mut target.clipped(&area))
    }
}
