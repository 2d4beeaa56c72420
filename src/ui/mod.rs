// src/ui/mod.rs
//! Object model: handles, events, colors, fonts and per-variant payloads

pub mod color;
pub mod components;
pub mod core;
pub mod fonts;

// Re-export commonly used items
pub use color::{Color, ColorMode, ModeColor};
pub use components::{
    Button, Checkbox, ClickHandler, Label, ObjectKind, Screen, Sprite, TextAlignment, TextBox,
};
pub use self::core::{DisplayId, Event, ObjectId, ObjectType, WidgetType};
pub use fonts::{BuiltinFonts, DEFAULT_FONT, FontResolver};
