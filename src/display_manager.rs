//! Display manager: double-buffered displays and the submit/complete protocol
//!
//! Each display owns two caller-provided pixel buffers (ping and pong) and an
//! [`UpdateSignal`] shared with whoever finishes the transfer, typically a DMA
//! or SPI completion interrupt. The protocol per display:
//!
//! ```text
//!   Idle --render_and_submit--> InFlight --update_complete--> Idle
//! ```
//!
//! `render_and_submit` composes the active screen into the front buffer, hands
//! that buffer to the HAL and flips front to the other buffer, so the next
//! frame never draws into memory the HAL may still be reading. Submitting
//! while in flight, or completing while idle, is a protocol violation and
//! changes nothing.

use alloc::boxed::Box;

use embedded_graphics::prelude::*;
use log::{debug, info, warn};
use portable_atomic::{AtomicU8, Ordering};
use serde::{Deserialize, Serialize};

use crate::error::{UiError, UiResult};
use crate::framebuffer::MonoFrame;
use crate::object_store::ObjectStore;
use crate::renderer::render_screen;
use crate::ui::color::ColorMode;
use crate::ui::core::{DisplayId, ObjectId};
use crate::ui::fonts::FontResolver;

/// Maximum number of displays a manager can hold
pub const MAX_DISPLAYS: usize = 4;

/// Buffer state of a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BufferState {
    /// No frame is being transferred; the next frame may be submitted
    Idle = 0,
    /// A frame was handed to the HAL and has not been completed yet
    InFlight = 1,
}

impl BufferState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => BufferState::Idle,
            _ => BufferState::InFlight,
        }
    }
}

/// Completion flag shared between the render loop and the transfer-complete
/// context.
///
/// Transitions use compare-and-swap, so a completion racing a submit is
/// either accepted or reported, never lost.
#[derive(Debug)]
pub struct UpdateSignal {
    state: AtomicU8,
}

impl Default for UpdateSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateSignal {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(BufferState::Idle as u8),
        }
    }

    pub fn state(&self) -> BufferState {
        BufferState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: BufferState, to: BufferState) -> UiResult<()> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|current| UiError::ProtocolViolation {
                state: BufferState::from_u8(current),
            })
    }

    /// Idle -> InFlight, done by the display manager right before the HAL call
    pub(crate) fn begin(&self) -> UiResult<()> {
        self.transition(BufferState::Idle, BufferState::InFlight)
    }

    /// Mark the in-flight frame as transferred. Safe to call from interrupt
    /// context.
    pub fn complete(&self) -> UiResult<()> {
        self.transition(BufferState::InFlight, BufferState::Idle)
    }
}

/// Hardware side of a display: receives each finished frame.
///
/// The frame stays valid for the HAL until it signals completion; the manager
/// will not draw into it before then. Completion may be signalled from inside
/// `update` for synchronous transfers.
pub trait DisplayHal {
    fn update(&mut self, display: DisplayId, frame: &[u8]);
}

impl<F> DisplayHal for F
where
    F: FnMut(DisplayId, &[u8]),
{
    fn update(&mut self, display: DisplayId, frame: &[u8]) {
        self(display, frame)
    }
}

/// Pixel dimensions and color mode of a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Pixel format of the buffers
    #[serde(default)]
    pub color_mode: ColorMode,
}

impl DisplayGeometry {
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            color_mode: ColorMode::Mono1Bpp,
        }
    }

    /// Bytes needed for one frame
    pub const fn buffer_size(&self) -> usize {
        self.color_mode.buffer_size(self.width, self.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

/// Everything needed to register a display
pub struct DisplayConfig<'a> {
    pub geometry: DisplayGeometry,
    /// Declared frame size; must equal `geometry.buffer_size()`
    pub buffer_size: usize,
    pub ping: &'a mut [u8],
    pub pong: &'a mut [u8],
    pub hal: Box<dyn DisplayHal + 'a>,
    pub signal: &'a UpdateSignal,
}

impl<'a> DisplayConfig<'a> {
    /// Config with `buffer_size` derived from the geometry
    pub fn new(
        geometry: DisplayGeometry,
        ping: &'a mut [u8],
        pong: &'a mut [u8],
        hal: impl DisplayHal + 'a,
        signal: &'a UpdateSignal,
    ) -> Self {
        Self {
            geometry,
            buffer_size: geometry.buffer_size(),
            ping,
            pong,
            hal: Box::new(hal),
            signal,
        }
    }

    fn validate(&self) -> UiResult<()> {
        if self.geometry.width == 0 || self.geometry.height == 0 {
            return Err(UiError::ConfigurationError {
                reason: "display dimensions must be non-zero",
            });
        }
        if self.buffer_size != self.geometry.buffer_size() {
            return Err(UiError::ConfigurationError {
                reason: "buffer size does not match geometry",
            });
        }
        if self.ping.len() < self.buffer_size || self.pong.len() < self.buffer_size {
            return Err(UiError::ConfigurationError {
                reason: "pixel buffer shorter than buffer size",
            });
        }
        if self.signal.state() != BufferState::Idle {
            return Err(UiError::ConfigurationError {
                reason: "update signal is not idle",
            });
        }
        Ok(())
    }
}

/// A registered display
pub struct Display<'a> {
    id: DisplayId,
    geometry: DisplayGeometry,
    buffers: [&'a mut [u8]; 2],
    buffer_size: usize,
    front: usize,
    hal: Box<dyn DisplayHal + 'a>,
    signal: &'a UpdateSignal,
    active_screen: Option<ObjectId>,
    frames_submitted: u32,
}

impl<'a> Display<'a> {
    pub fn id(&self) -> DisplayId {
        self.id
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    pub fn state(&self) -> BufferState {
        self.signal.state()
    }

    /// 0 when the next frame draws into ping, 1 for pong
    pub fn front_buffer_index(&self) -> usize {
        self.front
    }

    pub fn frames_submitted(&self) -> u32 {
        self.frames_submitted
    }

    pub fn active_screen(&self) -> Option<ObjectId> {
        self.active_screen
    }

    /// The shared completion signal
    pub fn signal(&self) -> &'a UpdateSignal {
        self.signal
    }

    /// Contents of buffer `index` (0 = ping, 1 = pong)
    pub fn buffer(&self, index: usize) -> Option<&[u8]> {
        self.buffers
            .get(index)
            .map(|buffer| &buffer[..self.buffer_size])
    }

    fn render_and_submit(&mut self, store: &ObjectStore, fonts: &dyn FontResolver) -> UiResult<()> {
        let state = self.signal.state();
        if state != BufferState::Idle {
            warn!("Display {:?}: submit while {:?}", self.id, state);
            return Err(UiError::ProtocolViolation { state });
        }

        let front = self.front;
        let frame = &mut self.buffers[front][..self.buffer_size];
        let mut target = MonoFrame::new(frame, self.geometry.width, self.geometry.height);
        render_screen(store, self.active_screen, &mut target, fonts)
            .unwrap_or_else(|never| match never {});

        self.signal.begin()?;
        self.frames_submitted = self.frames_submitted.wrapping_add(1);
        debug!(
            "Display {:?}: submitting frame {} from buffer {}",
            self.id, self.frames_submitted, front
        );
        self.hal.update(self.id, &self.buffers[front][..self.buffer_size]);
        self.front = 1 - front;
        Ok(())
    }
}

/// Table of displays and the active-display selection
#[derive(Default)]
pub struct DisplayManager<'a> {
    displays: heapless::Vec<Display<'a>, MAX_DISPLAYS>,
    active: Option<DisplayId>,
}

impl<'a> DisplayManager<'a> {
    pub fn new() -> Self {
        Self {
            displays: heapless::Vec::new(),
            active: None,
        }
    }

    /// Register a display. It starts idle with ping as the front buffer. The
    /// first display registered becomes active.
    pub fn create(&mut self, config: DisplayConfig<'a>) -> UiResult<DisplayId> {
        config.validate()?;
        if self
            .displays
            .iter()
            .any(|display| core::ptr::eq(display.signal, config.signal))
        {
            return Err(UiError::ConfigurationError {
                reason: "update signal already used by another display",
            });
        }
        if self.displays.is_full() {
            return Err(UiError::ConfigurationError {
                reason: "display table is full",
            });
        }

        let id = DisplayId(self.displays.len() as u8);
        let DisplayConfig {
            geometry,
            buffer_size,
            ping,
            pong,
            hal,
            signal,
        } = config;

        let display = Display {
            id,
            geometry,
            buffers: [ping, pong],
            buffer_size,
            front: 0,
            hal,
            signal,
            active_screen: None,
            frames_submitted: 0,
        };
        if self.displays.push(display).is_err() {
            return Err(UiError::ConfigurationError {
                reason: "display table is full",
            });
        }

        info!(
            "Display {:?} registered: {}x{} {:?}, {} bytes per frame",
            id, geometry.width, geometry.height, geometry.color_mode, buffer_size
        );
        if self.active.is_none() {
            self.active = Some(id);
        }
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.displays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displays.is_empty()
    }

    pub fn display(&self, id: DisplayId) -> UiResult<&Display<'a>> {
        self.displays.get(id.index()).ok_or(UiError::InvalidHandle)
    }

    fn display_mut(&mut self, id: DisplayId) -> UiResult<&mut Display<'a>> {
        self.displays
            .get_mut(id.index())
            .ok_or(UiError::InvalidHandle)
    }

    /// Select the display used for rendering and dispatch. Buffer states are
    /// not touched.
    pub fn set_active(&mut self, id: DisplayId) -> UiResult<()> {
        self.display(id)?;
        debug!("Active display is now {:?}", id);
        self.active = Some(id);
        Ok(())
    }

    pub fn active(&self) -> Option<DisplayId> {
        self.active
    }

    pub(crate) fn set_active_screen(&mut self, id: DisplayId, screen: ObjectId) -> UiResult<()> {
        self.display_mut(id)?.active_screen = Some(screen);
        Ok(())
    }

    /// Render the display's active screen and hand it to the HAL.
    pub fn render_and_submit(
        &mut self,
        id: DisplayId,
        store: &ObjectStore,
        fonts: &dyn FontResolver,
    ) -> UiResult<()> {
        self.display_mut(id)?.render_and_submit(store, fonts)
    }

    /// Report that the in-flight frame of `id` has been transferred.
    pub fn update_complete(&mut self, id: DisplayId) -> UiResult<()> {
        let display = self.display(id)?;
        display.signal.complete().inspect_err(|_| {
            warn!("Display {:?}: completion while idle", id);
        })
    }

    pub fn state(&self, id: DisplayId) -> UiResult<BufferState> {
        Ok(self.display(id)?.state())
    }

    pub fn front_buffer_index(&self, id: DisplayId) -> UiResult<usize> {
        Ok(self.display(id)?.front)
    }

    pub fn frames_submitted(&self, id: DisplayId) -> UiResult<u32> {
        Ok(self.display(id)?.frames_submitted)
    }

    pub fn geometry(&self, id: DisplayId) -> UiResult<DisplayGeometry> {
        Ok(self.display(id)?.geometry)
    }

    pub fn active_screen(&self, id: DisplayId) -> UiResult<Option<ObjectId>> {
        Ok(self.display(id)?.active_screen)
    }
}
