//! Screen composition
//!
//! Rendering is pull-based: nothing draws when the tree changes. A render
//! clears the target, then walks the screen depth-first, drawing each object
//! before its children and children in composition order. An invisible object
//! hides its whole subtree.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::trace;

use crate::object_store::ObjectStore;
use crate::ui::color::ModeColor;
use crate::ui::core::ObjectId;
use crate::ui::fonts::FontResolver;

/// Render `screen` into `target`.
///
/// With no screen the frame is just cleared. A stale screen handle renders a
/// cleared frame as well.
pub fn render_screen<C, D>(
    store: &ObjectStore,
    screen: Option<ObjectId>,
    target: &mut D,
    fonts: &dyn FontResolver,
) -> Result<(), D::Error>
where
    C: ModeColor,
    D: DrawTarget<Color = C>,
{
    target.clear(C::BACKGROUND)?;

    match screen {
        Some(screen) => render_object(store, screen, Point::zero(), target, fonts),
        None => Ok(()),
    }
}

fn render_object<C, D>(
    store: &ObjectStore,
    id: ObjectId,
    origin: Point,
    target: &mut D,
    fonts: &dyn FontResolver,
) -> Result<(), D::Error>
where
    C: ModeColor,
    D: DrawTarget<Color = C>,
{
    let Ok(object) = store.get(id) else {
        return Ok(());
    };
    if !object.is_visible() {
        return Ok(());
    }

    let top_left = origin + object.position();
    let area = Rectangle::new(top_left, object.size());
    trace!("Drawing {:?} {:?} at {:?}", object.object_type(), id, area);
    object.kind().draw(target, area, fonts)?;

    for &child in object.children() {
        render_object(store, child, top_left, target, fonts)?;
    }
    Ok(())
}
