// src/ui/core.rs
//! Core handle and event types for the g2ui scene graph

use embedded_graphics::prelude::*;
use serde::{Deserialize, Serialize};

/// Generation-checked handle to an object in the
/// [`ObjectStore`](crate::object_store::ObjectStore).
///
/// The ID is split into two parts:
/// - Lower 32 bits: slot index in the arena
/// - Upper 32 bits: generation of that slot when the object was created
///
/// A slot's generation is bumped when its object is destroyed, so every handle
/// to a destroyed object stays invalid even after the slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
    #[inline]
    #[must_use]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Slot index portion of the handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

/// Handle to a display registered with the
/// [`DisplayManager`](crate::display_manager::DisplayManager).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayId(pub(crate) u8);

impl DisplayId {
    /// Position of the display in the manager's table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Object variants of the scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Screen,
    Sprite,
    Label,
    Button,
    Checkbox,
}

/// Object variants that can be created under a parent.
///
/// Screens are created against a display instead, see
/// [`Ui::create_screen`](crate::context::Ui::create_screen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetType {
    Sprite,
    Label,
    Button,
    Checkbox,
}

impl From<WidgetType> for ObjectType {
    fn from(kind: WidgetType) -> Self {
        match kind {
            WidgetType::Sprite => ObjectType::Sprite,
            WidgetType::Label => ObjectType::Label,
            WidgetType::Button => ObjectType::Button,
            WidgetType::Checkbox => ObjectType::Checkbox,
        }
    }
}

/// Input events routed by the [`Dispatcher`](crate::dispatcher::Dispatcher)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Pointer pressed at display coordinates
    Press { x: i32, y: i32 },
    /// Pointer released at display coordinates
    Release { x: i32, y: i32 },
    /// Discrete "activate" from a key or encoder push, routed to the focused
    /// select-index rather than by position
    Activate,
}

impl Event {
    pub fn press(x: i32, y: i32) -> Self {
        Event::Press { x, y }
    }

    pub fn release(x: i32, y: i32) -> Self {
        Event::Release { x, y }
    }

    /// Display coordinates carried by the event, if it is positional
    pub fn point(&self) -> Option<Point> {
        match *self {
            Event::Press { x, y } | Event::Release { x, y } => Some(Point::new(x, y)),
            Event::Activate => None,
        }
    }
}
