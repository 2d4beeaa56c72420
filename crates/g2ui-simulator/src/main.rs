//! Desktop simulator for the g2ui toolkit.
//!
//! Shows a 128x64 mono panel in an SDL2 window via
//! `embedded-graphics-simulator`. Frames go through the same ping/pong
//! protocol as on hardware: the HAL callback copies the submitted buffer and
//! the main loop completes the update after presenting it.
//!
//! # Key bindings
//!
//! | Key           | Action              |
//! |---------------|---------------------|
//! | Right / Down  | Focus next          |
//! | Left / Up     | Focus previous      |
//! | Enter / Space | Activate focused    |
//! | Q / Esc       | Quit                |
//!
//! Mouse down/up are forwarded as press/release events.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use critical_section as _;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
    sdl2::Keycode,
};
use log::{debug, info, warn};

use g2ui::framebuffer::mono_pixel;
use g2ui::{
    BufferState, DispatchConfig, DisplayConfig, DisplayGeometry, DisplayId, Event, EventChannel,
    ObjectId, ObjectStore, TextAlignment, Ui, UiResult, UpdateSignal,
};

// ---------------------------------------------------------------------------
// Display constants
// ---------------------------------------------------------------------------

const WIDTH: u16 = 128;
const HEIGHT: u16 = 64;
const FRAME_BYTES: usize = DisplayGeometry::new(WIDTH, HEIGHT).buffer_size();

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 4;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Interval between sprite animation frames.
const ANIMATION_INTERVAL: Duration = Duration::from_millis(400);

/// Input queue, filled from the SDL event loop.
static EVENTS: EventChannel<16> = EventChannel::new();

/// 8x8 heart, two frames: outline and filled.
static HEART: [u8; 16] = [
    0b0110_0110,
    0b1001_1001,
    0b1000_0001,
    0b1000_0001,
    0b0100_0010,
    0b0010_0100,
    0b0001_1000,
    0b0000_0000,
    0b0110_0110,
    0b1111_1111,
    0b1111_1111,
    0b1111_1111,
    0b0111_1110,
    0b0011_1100,
    0b0001_1000,
    0b0000_0000,
];

// ---------------------------------------------------------------------------
// Demo scene
// ---------------------------------------------------------------------------

struct Scene {
    heart: ObjectId,
}

fn set_count(store: &mut ObjectStore, label: ObjectId, count: i32) {
    if let Err(e) = store.set_text(label, &format!("Count: {count}")) {
        warn!("Counter label update failed: {e}");
    }
}

fn counter_button(
    store: &mut ObjectStore,
    screen: ObjectId,
    text: &str,
    x: i32,
    select_index: u16,
    step: i32,
    count: &Rc<Cell<i32>>,
    label: ObjectId,
) -> UiResult<ObjectId> {
    let button = store.create_button(screen)?;
    store.set_position(button, x, 40)?;
    store.set_size(button, 24, 14)?;
    store.set_text(button, text)?;
    store.set_alignment(button, TextAlignment::Center)?;
    store.set_select_index(button, select_index)?;
    store.set_name(button, text)?;

    let count = count.clone();
    store.button_set_on_click(button, move |store, _| {
        count.set(count.get() + step);
        set_count(store, label, count.get());
    })?;
    Ok(button)
}

fn build_scene(ui: &mut Ui<'_>, display: DisplayId) -> UiResult<Scene> {
    let screen = ui.create_screen(display)?;
    ui.set_active_screen(screen)?;
    let store = ui.objects_mut();

    let title = store.create_label(screen)?;
    store.set_position(title, 0, 0)?;
    store.set_size(title, WIDTH as u32, 12)?;
    store.set_text(title, "g2ui demo")?;
    store.set_alignment(title, TextAlignment::Center)?;
    store.set_text_color(title, 0x000000u32)?;
    store.set_background_color(title, 0xFFFFFFu32)?;

    let heart = store.create_sprite(screen)?;
    store.sprite_set_image(heart, &HEART, 8, 8, 1)?;
    store.set_position(heart, 4, 20)?;

    let count = Rc::new(Cell::new(0));
    let label = store.create_label(screen)?;
    store.set_position(label, 16, 18)?;
    store.set_size(label, 70, 12)?;
    store.set_font(label, "6x10")?;
    set_count(store, label, 0);

    counter_button(store, screen, "-", 4, 0, -1, &count, label)?;
    counter_button(store, screen, "+", 32, 1, 1, &count, label)?;

    let checkbox = store.create_checkbox(screen)?;
    store.set_position(checkbox, 64, 43)?;
    store.set_size(checkbox, 9, 9)?;
    store.set_select_index(checkbox, 2)?;
    store.set_on_event(checkbox, |store, id, event| {
        if matches!(event, Event::Release { .. } | Event::Activate) {
            let checked = store.checkbox(id).map(|c| c.is_checked()).unwrap_or(false);
            if let Err(e) = store.checkbox_set_selected(id, !checked) {
                warn!("Checkbox toggle failed: {e}");
            }
        }
    })?;

    let caption = store.create_label(screen)?;
    store.set_position(caption, 76, 40)?;
    store.set_size(caption, 50, 14)?;
    store.set_text(caption, "enabled")?;
    store.set_font(caption, "5x8")?;

    info!("Scene built: {} objects", store.len());
    Ok(Scene { heart })
}

// ---------------------------------------------------------------------------
// Input mapping
// ---------------------------------------------------------------------------

enum Input {
    Event(Event),
    FocusNext,
    FocusPrev,
    Quit,
}

fn map_event(event: SimulatorEvent) -> Option<Input> {
    match event {
        SimulatorEvent::Quit => Some(Input::Quit),
        SimulatorEvent::KeyDown { keycode, .. } => match keycode {
            Keycode::Q | Keycode::Escape => Some(Input::Quit),
            Keycode::Right | Keycode::Down => Some(Input::FocusNext),
            Keycode::Left | Keycode::Up => Some(Input::FocusPrev),
            Keycode::Return | Keycode::Space => Some(Input::Event(Event::Activate)),
            _ => None,
        },
        SimulatorEvent::MouseButtonDown { point, .. } => {
            Some(Input::Event(Event::press(point.x, point.y)))
        }
        SimulatorEvent::MouseButtonUp { point, .. } => {
            Some(Input::Event(Event::release(point.x, point.y)))
        }
        _ => None,
    }
}

/// Copy a submitted mono frame into the simulator display.
fn present(frame: &[u8], display: &mut SimulatorDisplay<BinaryColor>) {
    let pixels = (0..HEIGHT as u32).flat_map(|y| {
        (0..WIDTH as u32).map(move |x| {
            Pixel(
                Point::new(x as i32, y as i32),
                mono_pixel(frame, WIDTH, HEIGHT, x, y),
            )
        })
    });
    display
        .draw_iter(pixels)
        .unwrap_or_else(|never| match never {});
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting g2ui simulator");
    info!("Display: {}×{} mono (scale {}×)", WIDTH, HEIGHT, WINDOW_SCALE);
    info!("Keys: arrows=focus  Enter=activate  Q=quit");

    let start = Instant::now();
    let clock = move || start.elapsed().as_millis() as u32;

    // Transfer state shared with the HAL callback
    let signal = UpdateSignal::new();
    let submitted = RefCell::new(vec![0u8; FRAME_BYTES]);
    let pending = Cell::new(false);

    let mut ping = [0u8; FRAME_BYTES];
    let mut pong = [0u8; FRAME_BYTES];

    let mut ui = Ui::new(&clock).with_dispatch_config(DispatchConfig { debounce_ms: 20 });
    let display_id = match ui.create_display(DisplayConfig::new(
        DisplayGeometry::new(WIDTH, HEIGHT),
        &mut ping,
        &mut pong,
        |_: DisplayId, frame: &[u8]| {
            submitted.borrow_mut().copy_from_slice(frame);
            pending.set(true);
        },
        &signal,
    )) {
        Ok(id) => id,
        Err(e) => {
            log::error!("Display setup failed: {e}");
            return;
        }
    };

    let scene = match build_scene(&mut ui, display_id) {
        Ok(scene) => scene,
        Err(e) => {
            log::error!("Scene setup failed: {e}");
            return;
        }
    };

    // SDL2 display and window
    let mut display = SimulatorDisplay::<BinaryColor>::new(Size::new(WIDTH as u32, HEIGHT as u32));
    let output_settings = OutputSettingsBuilder::new()
        .theme(BinaryColorTheme::OledBlue)
        .scale(WINDOW_SCALE)
        .build();
    let mut window = Window::new("g2ui Simulator", &output_settings);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    window.update(&display);

    let mut last_animation = Instant::now();
    let mut heart_frame = 0u16;

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match map_event(event) {
                Some(Input::Quit) => break 'running,
                Some(Input::Event(event)) => {
                    if EVENTS.try_send(event).is_err() {
                        warn!("Event queue full, dropping {:?}", event);
                    }
                }
                Some(Input::FocusNext) => {
                    debug!("Focus → {:?}", ui.focus_next());
                }
                Some(Input::FocusPrev) => {
                    debug!("Focus → {:?}", ui.focus_prev());
                }
                None => {}
            }
        }

        ui.dispatch_queued(&EVENTS);

        // --- Animation ----------------------------------------------------
        if last_animation.elapsed() >= ANIMATION_INTERVAL {
            heart_frame = (heart_frame + 1) % 2;
            if let Err(e) = ui.objects_mut().sprite_set_frame(scene.heart, heart_frame) {
                warn!("Animation failed: {e}");
            }
            last_animation = Instant::now();
        }

        // --- Render -------------------------------------------------------
        if ui.display_state(display_id) == Ok(BufferState::Idle)
            && let Err(e) = ui.render_and_submit(display_id)
        {
            log::error!("Submit error: {e}");
        }

        // --- Transfer complete --------------------------------------------
        if pending.replace(false) {
            present(&submitted.borrow(), &mut display);
            if let Err(e) = ui.update_complete(display_id) {
                warn!("Completion rejected: {e}");
            }
        }

        window.update(&display);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting");
}
