//! Object store: the generational arena that owns every UI object
//!
//! Objects live in slots addressed by [`ObjectId`]. Each handle carries the
//! slot generation it was issued for; destroying an object bumps the
//! generation, so stale handles fail with [`UiError::InvalidHandle`] instead of
//! reaching whatever reuses the slot.
//!
//! Parent/child links are handle lists. A parent's children are kept sorted by
//! `(index, insertion sequence)`, which is both the composition order used by
//! the renderer and the reverse of the hit-test order. Keeping them sorted at
//! mutation time means traversal never allocates.
//!
//! Mutations never render. The renderer pulls a complete frame when asked.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, trace};

use crate::error::{UiError, UiResult};
use crate::ui::color::Color;
use crate::ui::components::text::bounded;
use crate::ui::components::{
    Button, Checkbox, ClickHandler, Label, ObjectKind, Screen, Sprite, TextAlignment, TextBox,
};
use crate::ui::core::{DisplayId, Event, ObjectId, ObjectType, WidgetType};

/// Maximum diagnostic name length in bytes.
pub const MAX_NAME_LEN: usize = 16;

/// Handler invoked with the resolved object and the event that targeted it.
///
/// The closure's captures are its context. It receives the store mutably so it
/// can update or destroy objects, including the one it is registered on.
pub type EventHandler = Box<dyn FnMut(&mut ObjectStore, ObjectId, Event)>;

/// A node of the scene graph: common attributes plus a variant payload.
pub struct Object {
    name: Option<heapless::String<MAX_NAME_LEN>>,
    position: Point,
    size: Size,
    visible: bool,
    index: u16,
    select_index: Option<u16>,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    seq: u32,
    on_event: Option<EventHandler>,
    handler_epoch: u32,
    click_epoch: u32,
    kind: ObjectKind,
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("size", &self.size)
            .field("visible", &self.visible)
            .field("index", &self.index)
            .field("select_index", &self.select_index)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("on_event", &self.on_event.is_some())
            .field("kind", &self.kind)
            .finish()
    }
}

impl Object {
    fn new(kind: ObjectKind, parent: Option<ObjectId>, seq: u32) -> Self {
        Self {
            name: None,
            position: Point::zero(),
            size: Size::zero(),
            visible: true,
            index: 0,
            select_index: None,
            parent,
            children: Vec::new(),
            seq,
            on_event: None,
            handler_epoch: 0,
            click_epoch: 0,
            kind,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Position relative to the parent
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// The object's own visibility flag. Use
    /// [`ObjectStore::is_effectively_visible`] to include ancestors.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Composition index among siblings
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Focus-navigation key, `None` if the object is not focusable
    pub fn select_index(&self) -> Option<u16> {
        self.select_index
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Children in composition order
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn object_type(&self) -> ObjectType {
        self.kind.object_type()
    }

    pub fn has_event_handler(&self) -> bool {
        self.on_event.is_some()
    }

    /// Bounds relative to the parent
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(self.position, self.size)
    }

    fn sort_key(&self) -> (u16, u32) {
        (self.index, self.seq)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    object: Option<Object>,
}

/// Sole owner of all UI objects.
#[derive(Debug, Default)]
pub struct ObjectStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    next_seq: u32,
    len: usize,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `id` refers to a live object
    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_ok()
    }

    pub fn get(&self, id: ObjectId) -> UiResult<&Object> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.object.as_ref())
            .ok_or(UiError::InvalidHandle)
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> UiResult<&mut Object> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.object.as_mut())
            .ok_or(UiError::InvalidHandle)
    }

    fn alloc(&mut self, kind: ObjectKind, parent: Option<ObjectId>) -> ObjectId {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        let object = Object::new(kind, parent, seq);
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return ObjectId::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        ObjectId::new(index, 0)
    }

    /// Insert `child` into `parent`'s children at its composition position.
    /// Both must be live.
    fn insert_child(&mut self, parent: ObjectId, child: ObjectId) -> UiResult<()> {
        let key = self.get(child)?.sort_key();
        let siblings = self.get(parent)?.children();
        let position = siblings
            .iter()
            .position(|&sibling| {
                self.get(sibling)
                    .map(|s| s.sort_key() > key)
                    .unwrap_or(false)
            })
            .unwrap_or(siblings.len());
        self.get_mut(parent)?.children.insert(position, child);
        Ok(())
    }

    fn detach_from_parent(&mut self, id: ObjectId, parent: Option<ObjectId>) {
        if let Some(parent) = parent
            && let Ok(parent) = self.get_mut(parent)
        {
            parent.children.retain(|&child| child != id);
        }
    }

    /// Create a parentless screen bound to `display`, sized `size`.
    pub(crate) fn create_screen(&mut self, display: DisplayId, size: Size) -> ObjectId {
        let id = self.alloc(ObjectKind::Screen(Screen::new(display)), None);
        if let Ok(screen) = self.get_mut(id) {
            screen.size = size;
        }
        debug!("Created screen {:?} on display {:?}", id, display);
        id
    }

    /// Create a widget appended to the end of `parent`'s children.
    pub fn create(&mut self, kind: WidgetType, parent: ObjectId) -> UiResult<ObjectId> {
        if !self.contains(parent) {
            return Err(UiError::InvalidParent);
        }

        let payload = match kind {
            WidgetType::Sprite => ObjectKind::Sprite(Sprite::default()),
            WidgetType::Label => ObjectKind::Label(Label::default()),
            WidgetType::Button => ObjectKind::Button(Button::default()),
            WidgetType::Checkbox => ObjectKind::Checkbox(Checkbox::default()),
        };
        let id = self.alloc(payload, Some(parent));
        self.insert_child(parent, id)?;
        debug!("Created {:?} {:?} under {:?}", kind, id, parent);
        Ok(id)
    }

    pub fn create_sprite(&mut self, parent: ObjectId) -> UiResult<ObjectId> {
        self.create(WidgetType::Sprite, parent)
    }

    pub fn create_label(&mut self, parent: ObjectId) -> UiResult<ObjectId> {
        self.create(WidgetType::Label, parent)
    }

    pub fn create_button(&mut self, parent: ObjectId) -> UiResult<ObjectId> {
        self.create(WidgetType::Button, parent)
    }

    pub fn create_checkbox(&mut self, parent: ObjectId) -> UiResult<ObjectId> {
        self.create(WidgetType::Checkbox, parent)
    }

    /// Move `id` under `new_parent`, appended after its current children.
    ///
    /// Fails with [`UiError::InvalidParent`] if the new parent is not live, if
    /// `id` is a screen, or if `id` is `new_parent` or one of its ancestors.
    /// The tree is unchanged on failure.
    pub fn set_parent(&mut self, id: ObjectId, new_parent: ObjectId) -> UiResult<()> {
        let object = self.get(id)?;
        if object.object_type() == ObjectType::Screen {
            return Err(UiError::InvalidParent);
        }
        let old_parent = object.parent;

        let mut cursor = Some(new_parent);
        while let Some(ancestor) = cursor {
            if ancestor == id {
                debug!("Rejected attach of {:?} under {:?}: cycle", id, new_parent);
                return Err(UiError::InvalidParent);
            }
            cursor = self.get(ancestor).map_err(|_| UiError::InvalidParent)?.parent;
        }

        self.detach_from_parent(id, old_parent);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        let object = self.get_mut(id)?;
        object.parent = Some(new_parent);
        object.seq = seq;
        self.insert_child(new_parent, id)
    }

    /// Destroy `id` and its whole subtree, descendants first.
    pub fn destroy(&mut self, id: ObjectId) -> UiResult<()> {
        let parent = self.get(id)?.parent;
        self.detach_from_parent(id, parent);
        let count = self.destroy_subtree(id);
        debug!("Destroyed {:?} ({} objects)", id, count);
        Ok(())
    }

    fn destroy_subtree(&mut self, id: ObjectId) -> usize {
        let children = match self.get_mut(id) {
            Ok(object) => core::mem::take(&mut object.children),
            Err(_) => return 0,
        };
        let mut count = 0;
        for child in children {
            count += self.destroy_subtree(child);
        }

        let slot = &mut self.slots[id.index() as usize];
        slot.object = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.len -= 1;
        trace!("Released slot {}", id.index());
        count + 1
    }

    // ------------------------------------------------------------------
    // Common attributes
    // ------------------------------------------------------------------

    pub fn set_name(&mut self, id: ObjectId, name: &str) -> UiResult<()> {
        self.get_mut(id)?.name = Some(bounded(name));
        Ok(())
    }

    pub fn set_position(&mut self, id: ObjectId, x: i32, y: i32) -> UiResult<()> {
        self.get_mut(id)?.position = Point::new(x, y);
        Ok(())
    }

    pub fn set_size(&mut self, id: ObjectId, width: u32, height: u32) -> UiResult<()> {
        self.get_mut(id)?.size = Size::new(width, height);
        Ok(())
    }

    pub fn set_visible(&mut self, id: ObjectId, visible: bool) -> UiResult<()> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }

    /// Set the composition index and re-sort the object among its siblings.
    /// Equal indices keep insertion order.
    pub fn set_index(&mut self, id: ObjectId, index: u16) -> UiResult<()> {
        let object = self.get_mut(id)?;
        object.index = index;
        let parent = object.parent;
        if let Some(parent) = parent {
            self.detach_from_parent(id, Some(parent));
            self.insert_child(parent, id)?;
        }
        Ok(())
    }

    pub fn set_select_index(&mut self, id: ObjectId, select_index: u16) -> UiResult<()> {
        self.get_mut(id)?.select_index = Some(select_index);
        Ok(())
    }

    /// Remove the object from focus navigation.
    pub fn clear_select_index(&mut self, id: ObjectId) -> UiResult<()> {
        self.get_mut(id)?.select_index = None;
        Ok(())
    }

    /// Register the object's event handler, replacing any previous one.
    pub fn set_on_event<F>(&mut self, id: ObjectId, handler: F) -> UiResult<()>
    where
        F: FnMut(&mut ObjectStore, ObjectId, Event) + 'static,
    {
        let object = self.get_mut(id)?;
        object.on_event = Some(Box::new(handler));
        object.handler_epoch = object.handler_epoch.wrapping_add(1);
        Ok(())
    }

    pub fn clear_on_event(&mut self, id: ObjectId) -> UiResult<()> {
        let object = self.get_mut(id)?;
        object.on_event = None;
        object.handler_epoch = object.handler_epoch.wrapping_add(1);
        Ok(())
    }

    pub fn position(&self, id: ObjectId) -> UiResult<Point> {
        Ok(self.get(id)?.position)
    }

    pub fn size(&self, id: ObjectId) -> UiResult<Size> {
        Ok(self.get(id)?.size)
    }

    pub fn is_visible(&self, id: ObjectId) -> UiResult<bool> {
        Ok(self.get(id)?.visible)
    }

    pub fn index(&self, id: ObjectId) -> UiResult<u16> {
        Ok(self.get(id)?.index)
    }

    pub fn select_index(&self, id: ObjectId) -> UiResult<Option<u16>> {
        Ok(self.get(id)?.select_index)
    }

    /// Position resolved through every ancestor
    pub fn absolute_position(&self, id: ObjectId) -> UiResult<Point> {
        let mut object = self.get(id)?;
        let mut position = object.position;
        while let Some(parent) = object.parent {
            object = self.get(parent)?;
            position += object.position;
        }
        Ok(position)
    }

    /// Bounding box in display coordinates
    pub fn absolute_bounds(&self, id: ObjectId) -> UiResult<Rectangle> {
        Ok(Rectangle::new(
            self.absolute_position(id)?,
            self.get(id)?.size,
        ))
    }

    /// Visible itself and through every ancestor
    pub fn is_effectively_visible(&self, id: ObjectId) -> UiResult<bool> {
        let mut object = self.get(id)?;
        loop {
            if !object.visible {
                return Ok(false);
            }
            match object.parent {
                Some(parent) => object = self.get(parent)?,
                None => return Ok(true),
            }
        }
    }

    // ------------------------------------------------------------------
    // Variant payloads
    // ------------------------------------------------------------------

    pub fn sprite(&self, id: ObjectId) -> UiResult<&Sprite> {
        match &self.get(id)?.kind {
            ObjectKind::Sprite(sprite) => Ok(sprite),
            _ => Err(UiError::KindMismatch {
                expected: ObjectType::Sprite,
            }),
        }
    }

    pub fn button(&self, id: ObjectId) -> UiResult<&Button> {
        match &self.get(id)?.kind {
            ObjectKind::Button(button) => Ok(button),
            _ => Err(UiError::KindMismatch {
                expected: ObjectType::Button,
            }),
        }
    }

    pub fn checkbox(&self, id: ObjectId) -> UiResult<&Checkbox> {
        match &self.get(id)?.kind {
            ObjectKind::Checkbox(checkbox) => Ok(checkbox),
            _ => Err(UiError::KindMismatch {
                expected: ObjectType::Checkbox,
            }),
        }
    }

    /// Text box of a label or button
    pub fn text_box(&self, id: ObjectId) -> UiResult<&TextBox> {
        self.get(id)?.kind.text_box().ok_or(UiError::KindMismatch {
            expected: ObjectType::Label,
        })
    }

    fn sprite_mut(&mut self, id: ObjectId) -> UiResult<&mut Sprite> {
        match &mut self.get_mut(id)?.kind {
            ObjectKind::Sprite(sprite) => Ok(sprite),
            _ => Err(UiError::KindMismatch {
                expected: ObjectType::Sprite,
            }),
        }
    }

    pub(crate) fn button_mut(&mut self, id: ObjectId) -> UiResult<&mut Button> {
        match &mut self.get_mut(id)?.kind {
            ObjectKind::Button(button) => Ok(button),
            _ => Err(UiError::KindMismatch {
                expected: ObjectType::Button,
            }),
        }
    }

    fn text_box_mut(&mut self, id: ObjectId) -> UiResult<&mut TextBox> {
        self.get_mut(id)?
            .kind
            .text_box_mut()
            .ok_or(UiError::KindMismatch {
                expected: ObjectType::Label,
            })
    }

    /// Attach image data to a sprite and resize the sprite to one frame.
    pub fn sprite_set_image(
        &mut self,
        id: ObjectId,
        image: &'static [u8],
        width: u16,
        height: u16,
        bpp: u8,
    ) -> UiResult<()> {
        self.sprite_mut(id)?.set_image(image, width, height, bpp);
        self.get_mut(id)?.size = Size::new(width as u32, height as u32);
        Ok(())
    }

    /// Select the frame to draw. Frames outside the image are accepted and
    /// draw nothing.
    pub fn sprite_set_frame(&mut self, id: ObjectId, frame: u16) -> UiResult<()> {
        self.sprite_mut(id)?.set_frame(frame);
        Ok(())
    }

    pub fn sprite_frame_count(&self, id: ObjectId) -> UiResult<usize> {
        Ok(self.sprite(id)?.frame_count())
    }

    pub fn set_text(&mut self, id: ObjectId, text: &str) -> UiResult<()> {
        self.text_box_mut(id)?.set_text(text);
        Ok(())
    }

    pub fn set_text_color(&mut self, id: ObjectId, color: impl Into<Color>) -> UiResult<()> {
        self.text_box_mut(id)?.set_text_color(color.into());
        Ok(())
    }

    pub fn set_background_color(&mut self, id: ObjectId, color: impl Into<Color>) -> UiResult<()> {
        self.text_box_mut(id)?.set_background_color(color.into());
        Ok(())
    }

    pub fn set_font(&mut self, id: ObjectId, font_name: &str) -> UiResult<()> {
        self.text_box_mut(id)?.set_font(font_name);
        Ok(())
    }

    pub fn set_alignment(&mut self, id: ObjectId, alignment: TextAlignment) -> UiResult<()> {
        self.text_box_mut(id)?.set_alignment(alignment);
        Ok(())
    }

    /// Register the button's click handler, replacing any previous one.
    pub fn button_set_on_click<F>(&mut self, id: ObjectId, handler: F) -> UiResult<()>
    where
        F: FnMut(&mut ObjectStore, ObjectId) + 'static,
    {
        self.button_mut(id)?.on_click = Some(Box::new(handler));
        let object = self.get_mut(id)?;
        object.click_epoch = object.click_epoch.wrapping_add(1);
        Ok(())
    }

    pub fn button_set_selected(&mut self, id: ObjectId, selected: bool) -> UiResult<()> {
        self.button_mut(id)?.set_selected(selected);
        Ok(())
    }

    pub fn checkbox_set_selected(&mut self, id: ObjectId, selected: bool) -> UiResult<()> {
        match &mut self.get_mut(id)?.kind {
            ObjectKind::Checkbox(checkbox) => {
                checkbox.set_checked(selected);
                Ok(())
            }
            _ => Err(UiError::KindMismatch {
                expected: ObjectType::Checkbox,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Handler hand-off for the dispatcher
    // ------------------------------------------------------------------

    /// Take the event handler out so it can be called with `&mut self`.
    /// Returns the handler and the registration epoch it belongs to.
    pub(crate) fn take_event_handler(&mut self, id: ObjectId) -> Option<(EventHandler, u32)> {
        let object = self.get_mut(id).ok()?;
        let handler = object.on_event.take()?;
        Some((handler, object.handler_epoch))
    }

    /// Put a handler back unless the object died or its registration changed
    /// while the handler ran.
    pub(crate) fn restore_event_handler(&mut self, id: ObjectId, handler: EventHandler, epoch: u32) {
        if let Ok(object) = self.get_mut(id)
            && object.handler_epoch == epoch
        {
            object.on_event = Some(handler);
        }
    }

    pub(crate) fn take_click_handler(&mut self, id: ObjectId) -> Option<(ClickHandler, u32)> {
        let handler = self.button_mut(id).ok()?.on_click.take()?;
        let epoch = self.get(id).ok()?.click_epoch;
        Some((handler, epoch))
    }

    pub(crate) fn restore_click_handler(&mut self, id: ObjectId, handler: ClickHandler, epoch: u32) {
        let current = self.get(id).map(|object| object.click_epoch);
        if current == Ok(epoch)
            && let Ok(button) = self.button_mut(id)
        {
            button.on_click = Some(handler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::Cell;

    fn store_with_screen() -> (ObjectStore, ObjectId) {
        let mut store = ObjectStore::new();
        let screen = store.create_screen(DisplayId(0), Size::new(64, 32));
        (store, screen)
    }

    #[test]
    fn test_create_appends_in_insertion_order() {
        let (mut store, screen) = store_with_screen();
        let a = store.create_label(screen).unwrap();
        let b = store.create_button(screen).unwrap();
        let c = store.create_sprite(screen).unwrap();

        assert_eq!(store.get(screen).unwrap().children(), &[a, b, c]);
        assert_eq!(store.get(b).unwrap().parent(), Some(screen));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_create_under_dead_parent_fails() {
        let (mut store, screen) = store_with_screen();
        let label = store.create_label(screen).unwrap();
        store.destroy(label).unwrap();

        assert_eq!(
            store.create_button(label).unwrap_err(),
            UiError::InvalidParent
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_attribute_round_trip() {
        let (mut store, screen) = store_with_screen();
        let button = store.create_button(screen).unwrap();

        store.set_position(button, -3, 17).unwrap();
        store.set_size(button, 20, 10).unwrap();
        store.set_visible(button, false).unwrap();
        store.set_select_index(button, 4).unwrap();
        store.set_index(button, 9).unwrap();
        store.set_name(button, "ok-button").unwrap();

        assert_eq!(store.position(button).unwrap(), Point::new(-3, 17));
        assert_eq!(store.size(button).unwrap(), Size::new(20, 10));
        assert!(!store.is_visible(button).unwrap());
        assert_eq!(store.select_index(button).unwrap(), Some(4));
        assert_eq!(store.index(button).unwrap(), 9);
        assert_eq!(store.get(button).unwrap().name(), Some("ok-button"));
    }

    #[test]
    fn test_name_is_truncated() {
        let (mut store, screen) = store_with_screen();
        store
            .set_name(screen, "a-very-long-diagnostic-name")
            .unwrap();
        assert_eq!(store.get(screen).unwrap().name(), Some("a-very-long-diag"));
    }

    #[test]
    fn test_destroy_invalidates_descendants() {
        let (mut store, screen) = store_with_screen();
        let parent = store.create_label(screen).unwrap();
        let child = store.create_button(parent).unwrap();
        let grandchild = store.create_checkbox(child).unwrap();
        let sibling = store.create_sprite(screen).unwrap();

        store.destroy(parent).unwrap();

        for id in [parent, child, grandchild] {
            assert_eq!(store.get(id).unwrap_err(), UiError::InvalidHandle);
            assert_eq!(
                store.set_position(id, 1, 1).unwrap_err(),
                UiError::InvalidHandle
            );
        }
        assert!(store.contains(sibling));
        assert_eq!(store.get(screen).unwrap().children(), &[sibling]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.destroy(parent).unwrap_err(), UiError::InvalidHandle);
    }

    #[test]
    fn test_reused_slot_rejects_stale_handle() {
        let (mut store, screen) = store_with_screen();
        let old = store.create_label(screen).unwrap();
        store.destroy(old).unwrap();
        let new = store.create_label(screen).unwrap();

        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert!(store.get(old).is_err());
        assert!(store.get(new).is_ok());
    }

    #[test]
    fn test_cycle_rejected_and_tree_unchanged() {
        let (mut store, screen) = store_with_screen();
        let a = store.create_label(screen).unwrap();
        let b = store.create_label(a).unwrap();
        let c = store.create_label(b).unwrap();

        assert_eq!(store.set_parent(a, c).unwrap_err(), UiError::InvalidParent);
        assert_eq!(store.set_parent(a, a).unwrap_err(), UiError::InvalidParent);

        assert_eq!(store.get(a).unwrap().parent(), Some(screen));
        assert_eq!(store.get(a).unwrap().children(), &[b]);
        assert_eq!(store.get(b).unwrap().children(), &[c]);
        assert_eq!(store.get(c).unwrap().children(), &[] as &[ObjectId]);
    }

    #[test]
    fn test_screen_cannot_be_reparented() {
        let (mut store, screen) = store_with_screen();
        let other = store.create_screen(DisplayId(0), Size::new(64, 32));
        let label = store.create_label(other).unwrap();
        assert_eq!(
            store.set_parent(screen, label).unwrap_err(),
            UiError::InvalidParent
        );
    }

    #[test]
    fn test_reparent_moves_child() {
        let (mut store, screen) = store_with_screen();
        let a = store.create_label(screen).unwrap();
        let b = store.create_label(screen).unwrap();

        store.set_parent(b, a).unwrap();

        assert_eq!(store.get(screen).unwrap().children(), &[a]);
        assert_eq!(store.get(a).unwrap().children(), &[b]);
        assert_eq!(store.get(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn test_index_orders_siblings_with_stable_ties() {
        let (mut store, screen) = store_with_screen();
        let a = store.create_label(screen).unwrap();
        let b = store.create_label(screen).unwrap();
        let c = store.create_label(screen).unwrap();

        store.set_index(a, 5).unwrap();
        assert_eq!(store.get(screen).unwrap().children(), &[b, c, a]);

        store.set_index(c, 5).unwrap();
        // a and c tie at 5; a was inserted first
        assert_eq!(store.get(screen).unwrap().children(), &[b, a, c]);

        store.set_index(a, 0).unwrap();
        assert_eq!(store.get(screen).unwrap().children(), &[a, b, c]);
    }

    #[test]
    fn test_absolute_position_and_visibility() {
        let (mut store, screen) = store_with_screen();
        let panel = store.create_label(screen).unwrap();
        let button = store.create_button(panel).unwrap();
        store.set_position(panel, 10, 5).unwrap();
        store.set_position(button, 3, 4).unwrap();
        store.set_size(button, 8, 8).unwrap();

        assert_eq!(store.absolute_position(button).unwrap(), Point::new(13, 9));
        assert_eq!(
            store.absolute_bounds(button).unwrap(),
            Rectangle::new(Point::new(13, 9), Size::new(8, 8))
        );

        assert!(store.is_effectively_visible(button).unwrap());
        store.set_visible(panel, false).unwrap();
        assert!(store.is_visible(button).unwrap());
        assert!(!store.is_effectively_visible(button).unwrap());
    }

    #[test]
    fn test_variant_operations_check_kind() {
        let (mut store, screen) = store_with_screen();
        let sprite = store.create_sprite(screen).unwrap();
        let label = store.create_label(screen).unwrap();

        assert_eq!(
            store.set_text(sprite, "nope").unwrap_err(),
            UiError::KindMismatch {
                expected: ObjectType::Label
            }
        );
        assert_eq!(
            store.sprite_set_frame(label, 1).unwrap_err(),
            UiError::KindMismatch {
                expected: ObjectType::Sprite
            }
        );
        assert_eq!(
            store.button_set_selected(label, true).unwrap_err(),
            UiError::KindMismatch {
                expected: ObjectType::Button
            }
        );
        assert_eq!(
            store.checkbox_set_selected(label, true).unwrap_err(),
            UiError::KindMismatch {
                expected: ObjectType::Checkbox
            }
        );
    }

    #[test]
    fn test_text_setters_apply_to_labels_and_buttons() {
        let (mut store, screen) = store_with_screen();
        let label = store.create_label(screen).unwrap();
        let button = store.create_button(screen).unwrap();

        store.set_text(label, "Temp").unwrap();
        store.set_text(button, "OK").unwrap();
        store.set_font(button, "5x8").unwrap();
        store.set_text_color(button, 0x000000u32).unwrap();
        store.set_background_color(button, Color::WHITE).unwrap();
        store.set_alignment(button, TextAlignment::Center).unwrap();

        assert_eq!(store.text_box(label).unwrap().text(), "Temp");
        let text = store.text_box(button).unwrap();
        assert_eq!(text.text(), "OK");
        assert_eq!(text.font(), "5x8");
        assert_eq!(text.text_color(), Color::BLACK);
        assert_eq!(text.background_color(), Color::WHITE);
        assert_eq!(text.alignment(), TextAlignment::Center);
    }

    #[test]
    fn test_sprite_image_resizes_object() {
        static IMAGE: [u8; 8] = [0xFF; 8];
        let (mut store, screen) = store_with_screen();
        let sprite = store.create_sprite(screen).unwrap();

        store.sprite_set_image(sprite, &IMAGE, 8, 4, 1).unwrap();
        assert_eq!(store.size(sprite).unwrap(), Size::new(8, 4));
        assert_eq!(store.sprite_frame_count(sprite).unwrap(), 2);
    }

    #[test]
    fn test_event_handler_replacement_overwrites() {
        let (mut store, screen) = store_with_screen();
        let button = store.create_button(screen).unwrap();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let counter = first.clone();
        store
            .set_on_event(button, move |_, _, _| counter.set(counter.get() + 1))
            .unwrap();
        let counter = second.clone();
        store
            .set_on_event(button, move |_, _, _| counter.set(counter.get() + 1))
            .unwrap();

        let (mut handler, epoch) = store.take_event_handler(button).unwrap();
        handler(&mut store, button, Event::Activate);
        store.restore_event_handler(button, handler, epoch);

        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
        assert!(store.get(button).unwrap().has_event_handler());
    }

    #[test]
    fn test_restore_skipped_when_handler_cleared_during_call() {
        let (mut store, screen) = store_with_screen();
        let button = store.create_button(screen).unwrap();
        store
            .set_on_event(button, |store, id, _| {
                store.clear_on_event(id).unwrap();
            })
            .unwrap();

        let (mut handler, epoch) = store.take_event_handler(button).unwrap();
        handler(&mut store, button, Event::Activate);
        store.restore_event_handler(button, handler, epoch);

        assert!(!store.get(button).unwrap().has_event_handler());
    }
}
