//! Event dispatcher: routes input events to objects of the active screen
//!
//! Coordinate events are hit-tested against absolute bounds, topmost first:
//! descendants before their parent and later siblings before earlier ones,
//! skipping invisible subtrees. Discrete events (`Activate`) go to the object
//! holding focus, which is tracked as a select-index rather than a handle so
//! it survives objects being rebuilt.
//!
//! Handlers run synchronously on the caller's context and may mutate or
//! destroy any object, including the one being dispatched to.

use alloc::vec::Vec;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::object_store::{Object, ObjectStore};
use crate::timer::elapsed_ms;
use crate::ui::core::{Event, ObjectId, ObjectType};

/// Queue of raw events, fillable from interrupt context and drained by
/// [`Ui::dispatch_queued`](crate::context::Ui::dispatch_queued).
///
/// ```ignore
/// static EVENTS: EventChannel<8> = EventChannel::new();
///
/// // touch interrupt
/// EVENTS.try_send(Event::press(x, y)).ok();
/// ```
pub type EventChannel<const N: usize> = Channel<CriticalSectionRawMutex, Event, N>;

/// Dispatcher tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Minimum time between accepted presses, in milliseconds. 0 disables
    /// debouncing.
    #[serde(default)]
    pub debounce_ms: u32,
}

/// Topmost visible object under `point` on `screen`. The screen itself is
/// never a hit.
pub fn hit_test(store: &ObjectStore, screen: ObjectId, point: Point) -> Option<ObjectId> {
    let root = store.get(screen).ok()?;
    if !root.is_visible() {
        return None;
    }
    let origin = root.position();
    root.children()
        .iter()
        .rev()
        .find_map(|&child| hit_subtree(store, child, origin, point))
}

fn hit_subtree(store: &ObjectStore, id: ObjectId, origin: Point, point: Point) -> Option<ObjectId> {
    let object = store.get(id).ok()?;
    if !object.is_visible() {
        return None;
    }
    let top_left = origin + object.position();

    if let Some(hit) = object
        .children()
        .iter()
        .rev()
        .find_map(|&child| hit_subtree(store, child, top_left, point))
    {
        return Some(hit);
    }

    Rectangle::new(top_left, object.size())
        .contains(point)
        .then_some(id)
}

/// Visit the visible descendants of `screen` in composition order.
fn for_each_visible<F>(store: &ObjectStore, screen: ObjectId, visit: &mut F)
where
    F: FnMut(ObjectId, &Object),
{
    let Ok(root) = store.get(screen) else {
        return;
    };
    if !root.is_visible() {
        return;
    }
    for &child in root.children() {
        visit_subtree(store, child, visit);
    }
}

fn visit_subtree<F>(store: &ObjectStore, id: ObjectId, visit: &mut F)
where
    F: FnMut(ObjectId, &Object),
{
    let Ok(object) = store.get(id) else {
        return;
    };
    if !object.is_visible() {
        return;
    }
    visit(id, object);
    for &child in object.children() {
        visit_subtree(store, child, visit);
    }
}

/// Collect every descendant of `id`, hidden ones included, matching `keep`.
fn collect_descendants<F>(store: &ObjectStore, id: ObjectId, keep: &F, out: &mut Vec<ObjectId>)
where
    F: Fn(&Object) -> bool,
{
    let Ok(object) = store.get(id) else {
        return;
    };
    for &child in object.children() {
        if let Ok(descendant) = store.get(child)
            && keep(descendant)
        {
            out.push(child);
        }
        collect_descendants(store, child, keep, out);
    }
}

/// First visible descendant of `screen`, in composition order, carrying
/// `select_index`.
pub fn find_by_select_index(
    store: &ObjectStore,
    screen: ObjectId,
    select_index: u16,
) -> Option<ObjectId> {
    let mut found = None;
    for_each_visible(store, screen, &mut |id: ObjectId, object: &Object| {
        if found.is_none() && object.select_index() == Some(select_index) {
            found = Some(id);
        }
    });
    found
}

fn is_button(store: &ObjectStore, id: ObjectId) -> bool {
    store
        .get(id)
        .map(|object| object.object_type() == ObjectType::Button)
        .unwrap_or(false)
}

/// Run the object's event handler, if any.
fn invoke_event(store: &mut ObjectStore, target: ObjectId, event: Event) {
    if let Some((mut handler, epoch)) = store.take_event_handler(target) {
        handler(store, target, event);
        store.restore_event_handler(target, handler, epoch);
    }
}

fn invoke_click(store: &mut ObjectStore, target: ObjectId) {
    if let Some((mut handler, epoch)) = store.take_click_handler(target) {
        debug!("Click on {:?}", target);
        handler(store, target);
        store.restore_click_handler(target, handler, epoch);
    }
}

/// Routing state carried between events
#[derive(Debug, Default)]
pub struct Dispatcher {
    config: DispatchConfig,
    /// Button that received the last accepted press, until release
    armed: Option<ObjectId>,
    last_press_ms: Option<u32>,
    /// Set when a press is debounced; the release that follows it is dropped
    suppress_release: bool,
    focus: Option<u16>,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> DispatchConfig {
        self.config
    }

    pub fn set_config(&mut self, config: DispatchConfig) {
        self.config = config;
    }

    /// Focused select-index, if any
    pub fn focused(&self) -> Option<u16> {
        self.focus
    }

    /// Route `event` on `screen` and run the target's handlers. Returns the
    /// object the event resolved to; unmatched events are dropped.
    pub fn dispatch(
        &mut self,
        store: &mut ObjectStore,
        screen: Option<ObjectId>,
        event: Event,
        now_ms: u32,
    ) -> Option<ObjectId> {
        let screen = screen?;
        match event {
            Event::Press { x, y } => {
                if self.debounced(now_ms) {
                    debug!("Press at ({}, {}) debounced", x, y);
                    self.suppress_release = true;
                    return None;
                }
                self.last_press_ms = Some(now_ms);
                self.suppress_release = false;
                self.disarm(store);

                let target = hit_test(store, screen, Point::new(x, y));
                trace!("Press at ({}, {}) -> {:?}", x, y, target);
                let target = target?;
                if is_button(store, target) {
                    self.arm(store, target);
                }
                invoke_event(store, target, event);
                Some(target)
            }
            Event::Release { x, y } => {
                if core::mem::take(&mut self.suppress_release) {
                    debug!("Release at ({}, {}) of a debounced press dropped", x, y);
                    return None;
                }
                let armed = self.disarm(store);
                let target = hit_test(store, screen, Point::new(x, y));
                trace!("Release at ({}, {}) -> {:?}", x, y, target);
                let target = target?;
                invoke_event(store, target, event);
                if armed == Some(target) {
                    invoke_click(store, target);
                }
                Some(target)
            }
            Event::Activate => {
                let Some(select_index) = self.focus else {
                    trace!("Activate with no focus dropped");
                    return None;
                };
                self.dispatch_to_select_index(store, Some(screen), select_index, event)
            }
        }
    }

    /// Deliver `event` to the object carrying `select_index`, bypassing hit
    /// testing. An `Activate` delivered to a button also clicks it.
    pub fn dispatch_to_select_index(
        &mut self,
        store: &mut ObjectStore,
        screen: Option<ObjectId>,
        select_index: u16,
        event: Event,
    ) -> Option<ObjectId> {
        let target = find_by_select_index(store, screen?, select_index);
        trace!("{:?} to select-index {} -> {:?}", event, select_index, target);
        let target = target?;
        invoke_event(store, target, event);
        if event == Event::Activate && is_button(store, target) {
            invoke_click(store, target);
        }
        Some(target)
    }

    /// Move focus to `select_index`, updating button selection. Returns the
    /// newly focused object.
    pub fn focus(
        &mut self,
        store: &mut ObjectStore,
        screen: Option<ObjectId>,
        select_index: u16,
    ) -> Option<ObjectId> {
        let screen = screen?;
        if let Some(previous) = self.focus {
            // hidden buttons included
            let mut stale = Vec::new();
            let keep = |object: &Object| {
                object.object_type() == ObjectType::Button
                    && object.select_index() == Some(previous)
            };
            collect_descendants(store, screen, &keep, &mut stale);
            for old in stale {
                store.button_set_selected(old, false).ok();
            }
        }

        self.focus = Some(select_index);
        let target = find_by_select_index(store, screen, select_index);
        if let Some(target) = target
            && is_button(store, target)
        {
            store.button_set_selected(target, true).ok();
        }
        debug!("Focus -> select-index {} ({:?})", select_index, target);
        target
    }

    /// Focus the next larger select-index on `screen`, wrapping to the
    /// smallest.
    pub fn focus_next(
        &mut self,
        store: &mut ObjectStore,
        screen: Option<ObjectId>,
    ) -> Option<ObjectId> {
        let root = screen?;
        let current = self.focus;
        let mut lowest: Option<u16> = None;
        let mut next: Option<u16> = None;
        for_each_visible(store, root, &mut |_: ObjectId, object: &Object| {
            let Some(index) = object.select_index() else {
                return;
            };
            lowest = Some(lowest.map_or(index, |l| l.min(index)));
            if current.is_none_or(|c| index > c) {
                next = Some(next.map_or(index, |n| n.min(index)));
            }
        });
        let index = next.or(lowest)?;
        self.focus(store, screen, index)
    }

    /// Focus the next smaller select-index on `screen`, wrapping to the
    /// largest.
    pub fn focus_prev(
        &mut self,
        store: &mut ObjectStore,
        screen: Option<ObjectId>,
    ) -> Option<ObjectId> {
        let root = screen?;
        let current = self.focus;
        let mut highest: Option<u16> = None;
        let mut prev: Option<u16> = None;
        for_each_visible(store, root, &mut |_: ObjectId, object: &Object| {
            let Some(index) = object.select_index() else {
                return;
            };
            highest = Some(highest.map_or(index, |h| h.max(index)));
            if current.is_none_or(|c| index < c) {
                prev = Some(prev.map_or(index, |p| p.max(index)));
            }
        });
        let index = prev.or(highest)?;
        self.focus(store, screen, index)
    }

    fn debounced(&self, now_ms: u32) -> bool {
        match self.last_press_ms {
            Some(last) if self.config.debounce_ms > 0 => {
                elapsed_ms(now_ms, last) < self.config.debounce_ms
            }
            _ => false,
        }
    }

    fn arm(&mut self, store: &mut ObjectStore, button: ObjectId) {
        if let Ok(state) = store.button_mut(button) {
            state.set_pressed(true);
            self.armed = Some(button);
        }
    }

    /// Clear the pressed state of the armed button, returning it.
    fn disarm(&mut self, store: &mut ObjectStore) -> Option<ObjectId> {
        let armed = self.armed.take()?;
        if let Ok(button) = store.button_mut(armed) {
            button.set_pressed(false);
        }
        Some(armed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::core::DisplayId;
    use alloc::rc::Rc;
    use core::cell::{Cell, RefCell};

    fn screen_store() -> (ObjectStore, ObjectId) {
        let mut store = ObjectStore::new();
        let screen = store.create_screen(DisplayId(0), Size::new(64, 32));
        (store, screen)
    }

    fn boxed(store: &mut ObjectStore, parent: ObjectId, x: i32, y: i32, w: u32, h: u32) -> ObjectId {
        let id = store.create_button(parent).unwrap();
        store.set_position(id, x, y).unwrap();
        store.set_size(id, w, h).unwrap();
        id
    }

    fn counter(store: &mut ObjectStore, id: ObjectId) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        store
            .set_on_event(id, move |_, _, _| c.set(c.get() + 1))
            .unwrap();
        count
    }

    fn click_counter(store: &mut ObjectStore, id: ObjectId) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        store
            .button_set_on_click(id, move |_, _| c.set(c.get() + 1))
            .unwrap();
        count
    }

    #[test]
    fn test_dispatch_config_serde() {
        use serde::de::value::{Error as ValueError, MapDeserializer};

        let config = DispatchConfig { debounce_ms: 80 };
        let bytes = postcard::to_allocvec(&config).unwrap();
        assert_eq!(postcard::from_bytes::<DispatchConfig>(&bytes).unwrap(), config);

        let empty: [(&str, u32); 0] = [];
        let deserializer: MapDeserializer<'_, _, ValueError> =
            MapDeserializer::new(empty.into_iter());
        assert_eq!(
            DispatchConfig::deserialize(deserializer).unwrap(),
            DispatchConfig::default()
        );
    }

    #[test]
    fn test_hit_test_prefers_higher_index_and_descendants() {
        let (mut store, screen) = screen_store();
        let a = boxed(&mut store, screen, 5, 5, 10, 10);
        let b = boxed(&mut store, screen, 5, 5, 10, 10);
        store.set_index(a, 3).unwrap();
        store.set_index(b, 7).unwrap();
        assert_eq!(hit_test(&store, screen, Point::new(10, 10)), Some(b));

        // child of a at its top-left corner, a swapped on top
        let child = boxed(&mut store, a, 0, 0, 2, 2);
        store.set_index(a, 9).unwrap();
        assert_eq!(hit_test(&store, screen, Point::new(5, 5)), Some(child));
        assert_eq!(hit_test(&store, screen, Point::new(10, 10)), Some(a));
    }

    #[test]
    fn test_hit_test_skips_hidden_and_root() {
        let (mut store, screen) = screen_store();
        let panel = boxed(&mut store, screen, 0, 0, 20, 20);
        let inner = boxed(&mut store, panel, 2, 2, 4, 4);

        store.set_visible(panel, false).unwrap();
        assert_eq!(hit_test(&store, screen, Point::new(3, 3)), None);

        store.set_visible(panel, true).unwrap();
        assert_eq!(hit_test(&store, screen, Point::new(3, 3)), Some(inner));
        assert_eq!(hit_test(&store, screen, Point::new(40, 20)), None);
    }

    #[test]
    fn test_press_reaches_handler_with_event() {
        let (mut store, screen) = screen_store();
        let button = boxed(&mut store, screen, 10, 10, 20, 10);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        store
            .set_on_event(button, move |_, id, event| log.borrow_mut().push((id, event)))
            .unwrap();

        let mut dispatcher = Dispatcher::default();
        assert_eq!(
            dispatcher.dispatch(&mut store, Some(screen), Event::press(15, 12), 0),
            Some(button)
        );
        assert_eq!(
            dispatcher.dispatch(&mut store, Some(screen), Event::press(0, 0), 0),
            None
        );
        assert_eq!(*seen.borrow(), [(button, Event::press(15, 12))]);
    }

    #[test]
    fn test_click_requires_press_and_release_on_same_button() {
        let (mut store, screen) = screen_store();
        let ok = boxed(&mut store, screen, 0, 0, 10, 10);
        let cancel = boxed(&mut store, screen, 20, 0, 10, 10);
        let ok_clicks = click_counter(&mut store, ok);
        let cancel_clicks = click_counter(&mut store, cancel);
        let mut dispatcher = Dispatcher::default();

        dispatcher.dispatch(&mut store, Some(screen), Event::press(5, 5), 0);
        assert!(store.button(ok).unwrap().is_pressed());
        dispatcher.dispatch(&mut store, Some(screen), Event::release(6, 6), 0);
        assert!(!store.button(ok).unwrap().is_pressed());
        assert_eq!(ok_clicks.get(), 1);

        // slide off before releasing
        dispatcher.dispatch(&mut store, Some(screen), Event::press(5, 5), 0);
        dispatcher.dispatch(&mut store, Some(screen), Event::release(25, 5), 0);
        assert_eq!(ok_clicks.get(), 1);
        assert_eq!(cancel_clicks.get(), 0);
        assert!(!store.button(ok).unwrap().is_pressed());
    }

    #[test]
    fn test_debounce_drops_rapid_presses() {
        let (mut store, screen) = screen_store();
        let button = boxed(&mut store, screen, 0, 0, 10, 10);
        let presses = counter(&mut store, button);
        let mut dispatcher = Dispatcher::new(DispatchConfig { debounce_ms: 50 });

        assert!(dispatcher.dispatch(&mut store, Some(screen), Event::press(1, 1), 1000).is_some());
        assert!(dispatcher.dispatch(&mut store, Some(screen), Event::press(1, 1), 1020).is_none());
        assert!(dispatcher.dispatch(&mut store, Some(screen), Event::press(1, 1), 1050).is_some());
        assert_eq!(presses.get(), 2);
    }

    #[test]
    fn test_debounce_survives_tick_wrap() {
        let (mut store, screen) = screen_store();
        boxed(&mut store, screen, 0, 0, 10, 10);
        let mut dispatcher = Dispatcher::new(DispatchConfig { debounce_ms: 50 });

        assert!(dispatcher.dispatch(&mut store, Some(screen), Event::press(1, 1), u32::MAX - 10).is_some());
        assert!(dispatcher.dispatch(&mut store, Some(screen), Event::press(1, 1), 20).is_none());
        assert!(dispatcher.dispatch(&mut store, Some(screen), Event::press(1, 1), 40).is_some());
    }

    #[test]
    fn test_focus_wraps_and_selects_buttons() {
        let (mut store, screen) = screen_store();
        let first = boxed(&mut store, screen, 0, 0, 4, 4);
        let second = boxed(&mut store, screen, 10, 0, 4, 4);
        let unfocusable = boxed(&mut store, screen, 20, 0, 4, 4);
        store.set_select_index(first, 1).unwrap();
        store.set_select_index(second, 4).unwrap();
        let mut dispatcher = Dispatcher::default();

        assert_eq!(dispatcher.focus_next(&mut store, Some(screen)), Some(first));
        assert!(store.button(first).unwrap().is_selected());

        assert_eq!(dispatcher.focus_next(&mut store, Some(screen)), Some(second));
        assert!(!store.button(first).unwrap().is_selected());
        assert!(store.button(second).unwrap().is_selected());

        assert_eq!(dispatcher.focus_next(&mut store, Some(screen)), Some(first));
        assert_eq!(dispatcher.focus_prev(&mut store, Some(screen)), Some(second));
        assert_eq!(dispatcher.focused(), Some(4));
        assert!(!store.button(unfocusable).unwrap().is_selected());
    }

    #[test]
    fn test_focus_change_deselects_hidden_button() {
        let (mut store, screen) = screen_store();
        let first = boxed(&mut store, screen, 0, 0, 4, 4);
        let second = boxed(&mut store, screen, 10, 0, 4, 4);
        store.set_select_index(first, 0).unwrap();
        store.set_select_index(second, 1).unwrap();
        let mut dispatcher = Dispatcher::default();

        dispatcher.focus(&mut store, Some(screen), 0);
        assert!(store.button(first).unwrap().is_selected());

        store.set_visible(first, false).unwrap();
        assert_eq!(dispatcher.focus_next(&mut store, Some(screen)), Some(second));
        store.set_visible(first, true).unwrap();

        assert!(!store.button(first).unwrap().is_selected());
        assert!(store.button(second).unwrap().is_selected());
    }

    #[test]
    fn test_release_of_debounced_press_is_dropped() {
        let (mut store, screen) = screen_store();
        let button = boxed(&mut store, screen, 0, 0, 10, 10);
        let events = counter(&mut store, button);
        let clicks = click_counter(&mut store, button);
        let mut dispatcher = Dispatcher::new(DispatchConfig { debounce_ms: 50 });

        dispatcher.dispatch(&mut store, Some(screen), Event::press(1, 1), 1000);
        dispatcher.dispatch(&mut store, Some(screen), Event::release(1, 1), 1005);
        assert_eq!(clicks.get(), 1);

        // bounce: press inside the window, then its release
        assert!(dispatcher.dispatch(&mut store, Some(screen), Event::press(1, 1), 1010).is_none());
        assert!(dispatcher.dispatch(&mut store, Some(screen), Event::release(1, 1), 1012).is_none());
        assert_eq!(events.get(), 2);
        assert_eq!(clicks.get(), 1);

        // the next accepted press clears the suppression
        dispatcher.dispatch(&mut store, Some(screen), Event::press(1, 1), 1100);
        assert_eq!(
            dispatcher.dispatch(&mut store, Some(screen), Event::release(1, 1), 1101),
            Some(button)
        );
        assert_eq!(events.get(), 4);
        assert_eq!(clicks.get(), 2);
    }

    #[test]
    fn test_activate_goes_to_focused_button() {
        let (mut store, screen) = screen_store();
        let button = boxed(&mut store, screen, 0, 0, 4, 4);
        store.set_select_index(button, 2).unwrap();
        let events = counter(&mut store, button);
        let clicks = click_counter(&mut store, button);
        let mut dispatcher = Dispatcher::default();

        assert_eq!(
            dispatcher.dispatch(&mut store, Some(screen), Event::Activate, 0),
            None
        );
        dispatcher.focus(&mut store, Some(screen), 2);
        assert_eq!(
            dispatcher.dispatch(&mut store, Some(screen), Event::Activate, 0),
            Some(button)
        );
        assert_eq!(events.get(), 1);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_select_index_lookup_uses_composition_order() {
        let (mut store, screen) = screen_store();
        let a = boxed(&mut store, screen, 0, 0, 4, 4);
        let b = boxed(&mut store, screen, 0, 0, 4, 4);
        store.set_select_index(a, 0).unwrap();
        store.set_select_index(b, 0).unwrap();
        assert_eq!(find_by_select_index(&store, screen, 0), Some(a));

        store.set_visible(a, false).unwrap();
        assert_eq!(find_by_select_index(&store, screen, 0), Some(b));
        assert_eq!(find_by_select_index(&store, screen, 1), None);
    }

    #[test]
    fn test_handler_may_destroy_its_own_object() {
        let (mut store, screen) = screen_store();
        let button = boxed(&mut store, screen, 0, 0, 10, 10);
        store
            .set_on_event(button, |store, id, _| {
                store.destroy(id).unwrap();
            })
            .unwrap();
        let mut dispatcher = Dispatcher::default();

        assert_eq!(
            dispatcher.dispatch(&mut store, Some(screen), Event::press(1, 1), 0),
            Some(button)
        );
        assert!(!store.contains(button));
        assert_eq!(
            dispatcher.dispatch(&mut store, Some(screen), Event::release(1, 1), 0),
            None
        );
    }

    #[test]
    fn test_no_screen_drops_events() {
        let (mut store, _) = screen_store();
        let mut dispatcher = Dispatcher::default();
        assert_eq!(
            dispatcher.dispatch(&mut store, None, Event::press(1, 1), 0),
            None
        );
        assert_eq!(dispatcher.focus_next(&mut store, None), None);
    }
}
