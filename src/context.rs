//! UI context
//!
//! [`Ui`] bundles everything the toolkit needs at runtime: the object store,
//! the display table, the dispatcher, the tick source and the font resolver.
//! There is no global state; an application creates one `Ui` and drives it
//! from its main loop.
//!
//! ```ignore
//! static TICKS: ManualTimer = ManualTimer::new();
//! static FLUSHED: UpdateSignal = UpdateSignal::new();
//!
//! let mut ui = Ui::new(&TICKS);
//! let display = ui.create_display(DisplayConfig::new(
//!     DisplayGeometry::new(128, 64),
//!     &mut ping,
//!     &mut pong,
//!     |_, frame: &[u8]| oled.start_transfer(frame),
//!     &FLUSHED,
//! ))?;
//! let screen = ui.create_screen(display)?;
//! ui.set_active_screen(screen)?;
//!
//! loop {
//!     ui.dispatch_queued(&EVENTS);
//!     if ui.display_state(display)? == BufferState::Idle {
//!         ui.render_active()?;
//!     }
//! }
//! ```

use log::{debug, info};

use crate::dispatcher::{DispatchConfig, Dispatcher, EventChannel};
use crate::display_manager::{BufferState, DisplayConfig, DisplayManager};
use crate::error::{UiError, UiResult};
use crate::object_store::ObjectStore;
use crate::timer::TimerSource;
use crate::ui::components::ObjectKind;
use crate::ui::core::{DisplayId, Event, ObjectId, ObjectType};
use crate::ui::fonts::{BuiltinFonts, FontResolver};

static BUILTIN_FONTS: BuiltinFonts = BuiltinFonts;

/// Runtime context of the toolkit
pub struct Ui<'a> {
    objects: ObjectStore,
    displays: DisplayManager<'a>,
    dispatcher: Dispatcher,
    timer: &'a dyn TimerSource,
    fonts: &'a dyn FontResolver,
}

impl<'a> Ui<'a> {
    /// Context using the built-in fonts and default dispatch settings
    pub fn new(timer: &'a dyn TimerSource) -> Self {
        Self {
            objects: ObjectStore::new(),
            displays: DisplayManager::new(),
            dispatcher: Dispatcher::default(),
            timer,
            fonts: &BUILTIN_FONTS,
        }
    }

    pub fn with_fonts(mut self, fonts: &'a dyn FontResolver) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_dispatch_config(mut self, config: DispatchConfig) -> Self {
        self.dispatcher.set_config(config);
        self
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut ObjectStore {
        &mut self.objects
    }

    pub fn displays(&self) -> &DisplayManager<'a> {
        &self.displays
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Current tick count of the context's timer
    pub fn now_ms(&self) -> u32 {
        self.timer.ticks_ms()
    }

    // ------------------------------------------------------------------
    // Displays and screens
    // ------------------------------------------------------------------

    /// Register a display; the first one becomes active.
    pub fn create_display(&mut self, config: DisplayConfig<'a>) -> UiResult<DisplayId> {
        self.displays.create(config)
    }

    pub fn set_active_display(&mut self, display: DisplayId) -> UiResult<()> {
        self.displays.set_active(display)?;
        info!("Display {:?} active", display);
        Ok(())
    }

    pub fn active_display(&self) -> Option<DisplayId> {
        self.displays.active()
    }

    /// Create a screen bound to `display`, sized to it.
    pub fn create_screen(&mut self, display: DisplayId) -> UiResult<ObjectId> {
        let geometry = self.displays.geometry(display)?;
        Ok(self.objects.create_screen(display, geometry.size()))
    }

    /// Make `screen` the active screen of the display it is bound to.
    pub fn set_active_screen(&mut self, screen: ObjectId) -> UiResult<()> {
        let display = match self.objects.get(screen)?.kind() {
            ObjectKind::Screen(payload) => payload.display(),
            _ => {
                return Err(UiError::KindMismatch {
                    expected: ObjectType::Screen,
                });
            }
        };
        self.displays.set_active_screen(display, screen)?;
        debug!("Screen {:?} active on display {:?}", screen, display);
        Ok(())
    }

    /// Active screen of the active display, if it is still live
    pub fn active_screen(&self) -> Option<ObjectId> {
        let display = self.displays.active()?;
        self.displays
            .active_screen(display)
            .ok()
            .flatten()
            .filter(|&screen| self.objects.contains(screen))
    }

    // ------------------------------------------------------------------
    // Frame protocol
    // ------------------------------------------------------------------

    /// Render the active screen of `display` and hand the frame to its HAL.
    pub fn render_and_submit(&mut self, display: DisplayId) -> UiResult<()> {
        self.displays
            .render_and_submit(display, &self.objects, self.fonts)
    }

    /// Render and submit the active display.
    pub fn render_active(&mut self) -> UiResult<()> {
        let display = self.displays.active().ok_or(UiError::InvalidHandle)?;
        self.render_and_submit(display)
    }

    pub fn update_complete(&mut self, display: DisplayId) -> UiResult<()> {
        self.displays.update_complete(display)
    }

    pub fn display_state(&self, display: DisplayId) -> UiResult<BufferState> {
        self.displays.state(display)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Route one event on the active screen. Returns the object it resolved
    /// to.
    pub fn dispatch(&mut self, event: Event) -> Option<ObjectId> {
        let screen = self.active_screen();
        let now = self.timer.ticks_ms();
        self.dispatcher
            .dispatch(&mut self.objects, screen, event, now)
    }

    pub fn dispatch_to_select_index(&mut self, select_index: u16, event: Event) -> Option<ObjectId> {
        let screen = self.active_screen();
        self.dispatcher
            .dispatch_to_select_index(&mut self.objects, screen, select_index, event)
    }

    pub fn focus(&mut self, select_index: u16) -> Option<ObjectId> {
        let screen = self.active_screen();
        self.dispatcher.focus(&mut self.objects, screen, select_index)
    }

    pub fn focus_next(&mut self) -> Option<ObjectId> {
        let screen = self.active_screen();
        self.dispatcher.focus_next(&mut self.objects, screen)
    }

    pub fn focus_prev(&mut self) -> Option<ObjectId> {
        let screen = self.active_screen();
        self.dispatcher.focus_prev(&mut self.objects, screen)
    }

    /// Dispatch every event currently queued in `channel`. Returns how many
    /// were taken.
    pub fn dispatch_queued<const N: usize>(&mut self, channel: &EventChannel<N>) -> usize {
        let mut count = 0;
        while let Ok(event) = channel.try_receive() {
            self.dispatch(event);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display_manager::{DisplayGeometry, UpdateSignal};
    use crate::timer::ManualTimer;
    use embedded_graphics::prelude::*;

    #[test]
    fn test_screen_is_sized_to_display() {
        let timer = ManualTimer::new();
        let signal = UpdateSignal::new();
        let (mut ping, mut pong) = ([0u8; 256], [0u8; 256]);
        let mut ui = Ui::new(&timer);
        let display = ui
            .create_display(DisplayConfig::new(
                DisplayGeometry::new(64, 32),
                &mut ping,
                &mut pong,
                |_: DisplayId, _: &[u8]| {},
                &signal,
            ))
            .unwrap();

        let screen = ui.create_screen(display).unwrap();
        assert_eq!(ui.objects().size(screen).unwrap(), Size::new(64, 32));
        assert_eq!(ui.active_display(), Some(display));
        assert_eq!(ui.active_screen(), None);

        ui.set_active_screen(screen).unwrap();
        assert_eq!(ui.active_screen(), Some(screen));

        ui.objects_mut().destroy(screen).unwrap();
        assert_eq!(ui.active_screen(), None);
    }

    #[test]
    fn test_screen_needs_existing_display() {
        let timer = ManualTimer::new();
        let mut ui = Ui::new(&timer);
        assert_eq!(
            ui.create_screen(DisplayId(0)).unwrap_err(),
            UiError::InvalidHandle
        );
    }

    #[test]
    fn test_render_active_targets_active_display() {
        let timer = ManualTimer::new();
        let (first_signal, second_signal) = (UpdateSignal::new(), UpdateSignal::new());
        let (mut ping, mut pong) = ([0u8; 2], [0u8; 2]);
        let (mut ping2, mut pong2) = ([0u8; 2], [0u8; 2]);
        let mut ui = Ui::new(&timer);
        assert_eq!(ui.render_active().unwrap_err(), UiError::InvalidHandle);

        let first = ui
            .create_display(DisplayConfig::new(
                DisplayGeometry::new(4, 4),
                &mut ping,
                &mut pong,
                |_: DisplayId, _: &[u8]| {},
                &first_signal,
            ))
            .unwrap();
        let second = ui
            .create_display(DisplayConfig::new(
                DisplayGeometry::new(4, 4),
                &mut ping2,
                &mut pong2,
                |_: DisplayId, _: &[u8]| {},
                &second_signal,
            ))
            .unwrap();

        ui.set_active_display(second).unwrap();
        ui.render_active().unwrap();
        assert_eq!(ui.display_state(second).unwrap(), BufferState::InFlight);
        assert_eq!(ui.display_state(first).unwrap(), BufferState::Idle);
    }

    #[test]
    fn test_set_active_screen_rejects_widgets() {
        let timer = ManualTimer::new();
        let signal = UpdateSignal::new();
        let (mut ping, mut pong) = ([0u8; 2], [0u8; 2]);
        let mut ui = Ui::new(&timer);
        let display = ui
            .create_display(DisplayConfig::new(
                DisplayGeometry::new(4, 4),
                &mut ping,
                &mut pong,
                |_: DisplayId, _: &[u8]| {},
                &signal,
            ))
            .unwrap();
        let screen = ui.create_screen(display).unwrap();
        let label = ui.objects_mut().create_label(screen).unwrap();

        assert!(matches!(
            ui.set_active_screen(label),
            Err(UiError::KindMismatch { .. })
        ));
    }
}
