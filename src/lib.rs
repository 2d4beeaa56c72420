//! g2ui: a small retained-mode UI toolkit for monochrome embedded displays
//!
//! Applications build a tree of objects (screens, sprites, labels, buttons,
//! checkboxes) in an [`ObjectStore`], then pull frames through the
//! [`DisplayManager`], which renders the active screen into one of two
//! caller-owned buffers and hands it to a HAL callback. Input events are
//! routed to objects by position or by select-index.
//!
//! It is `#![no_std]` with `extern crate alloc`: the object arena and event
//! handlers live on the heap, everything else is fixed-size.

#![no_std]

extern crate alloc;

#[cfg(test)]
use critical_section as _;

pub mod context;
pub mod dispatcher;
pub mod display_manager;
pub mod error;
pub mod framebuffer;
pub mod object_store;
pub mod renderer;
pub mod timer;
pub mod ui;

pub use context::Ui;
pub use dispatcher::{DispatchConfig, Dispatcher, EventChannel};
pub use display_manager::{
    BufferState, DisplayConfig, DisplayGeometry, DisplayHal, DisplayManager, MAX_DISPLAYS,
    UpdateSignal,
};
pub use error::{UiError, UiResult};
pub use framebuffer::MonoFrame;
pub use object_store::{EventHandler, Object, ObjectStore};
pub use timer::{ManualTimer, TimerSource};
pub use ui::{Color, ColorMode, DisplayId, Event, ObjectId, ObjectType, TextAlignment, WidgetType};
