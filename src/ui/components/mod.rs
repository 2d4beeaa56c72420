// src/ui/components/mod.rs
//! Per-variant object payloads and their drawing

pub mod button;
pub mod checkbox;
pub mod sprite;
pub mod text;

pub use button::{Button, ClickHandler};
pub use checkbox::Checkbox;
pub use sprite::Sprite;
pub use text::{Label, MAX_FONT_NAME_LEN, MAX_TEXT_LEN, TextAlignment, TextBox};

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::ui::color::ModeColor;
use crate::ui::core::{DisplayId, ObjectType};
use crate::ui::fonts::FontResolver;

/// Screen payload: the display a screen is bound to
#[derive(Debug, Clone, Copy)]
pub struct Screen {
    display: DisplayId,
}

impl Screen {
    pub(crate) fn new(display: DisplayId) -> Self {
        Self { display }
    }

    pub fn display(&self) -> DisplayId {
        self.display
    }
}

/// Variant payload of an object
#[derive(Debug)]
pub enum ObjectKind {
    Screen(Screen),
    Sprite(Sprite),
    Label(Label),
    Button(Button),
    Checkbox(Checkbox),
}

impl ObjectKind {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectKind::Screen(_) => ObjectType::Screen,
            ObjectKind::Sprite(_) => ObjectType::Sprite,
            ObjectKind::Label(_) => ObjectType::Label,
            ObjectKind::Button(_) => ObjectType::Button,
            ObjectKind::Checkbox(_) => ObjectType::Checkbox,
        }
    }

    /// Text box of a label or button
    pub fn text_box(&self) -> Option<&TextBox> {
        match self {
            ObjectKind::Label(label) => Some(&label.text),
            ObjectKind::Button(button) => Some(&button.text),
            _ => None,
        }
    }

    pub(crate) fn text_box_mut(&mut self) -> Option<&mut TextBox> {
        match self {
            ObjectKind::Label(label) => Some(&mut label.text),
            ObjectKind::Button(button) => Some(&mut button.text),
            _ => None,
        }
    }

    /// Draw this payload into `area` (absolute coordinates). Screens draw
    /// nothing themselves; the frame is cleared before compositing.
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
        match self {
            ObjectKind::Screen(_) => Ok(()),
            ObjectKind::Sprite(sprite) => sprite.draw(target, area),
            ObjectKind::Label(label) => label.draw(target, area, fonts),
            ObjectKind::Button(button) => button.draw(target, area, fonts),
            ObjectKind::Checkbox(checkbox) => checkbox.draw(target, area),
        }
    }
}
