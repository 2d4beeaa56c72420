//! Millisecond tick source.
//!
//! The toolkit owns no timer hardware. It reads ticks on demand through
//! [`TimerSource`], which is implemented for plain closures (e.g. wrapping a
//! HAL's monotonic counter) and by [`ManualTimer`], a counter advanced
//! explicitly from a SysTick interrupt or from a test.

use portable_atomic::{AtomicU32, Ordering};

/// Monotonic millisecond counter. Values wrap; compare with `wrapping_sub`.
pub trait TimerSource {
    /// Current tick count in milliseconds.
    fn ticks_ms(&self) -> u32;
}

impl<F> TimerSource for F
where
    F: Fn() -> u32,
{
    fn ticks_ms(&self) -> u32 {
        self()
    }
}

/// Tick counter advanced by the caller.
///
/// Safe to share between the UI loop and a tick interrupt:
///
/// ```ignore
/// static TICKS: ManualTimer = ManualTimer::new();
///
/// #[exception]
/// fn SysTick() {
///     TICKS.increment_ms(1);
/// }
/// ```
#[derive(Debug, Default)]
pub struct ManualTimer {
    ticks: AtomicU32,
}

impl ManualTimer {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Advance the counter by `ms` milliseconds (wrapping).
    pub fn increment_ms(&self, ms: u32) {
        self.ticks.fetch_add(ms, Ordering::Relaxed);
    }

    /// Overwrite the counter.
    pub fn set_ms(&self, ms: u32) {
        self.ticks.store(ms, Ordering::Relaxed);
    }
}

impl TimerSource for ManualTimer {
    fn ticks_ms(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }
}

/// Milliseconds elapsed from `earlier` to `now`, tolerant of counter wrap.
#[inline]
pub fn elapsed_ms(now: u32, earlier: u32) -> u32 {
    now.wrapping_sub(earlier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_timer_increments() {
        let timer = ManualTimer::new();
        assert_eq!(timer.ticks_ms(), 0);
        timer.increment_ms(5);
        timer.increment_ms(10);
        assert_eq!(timer.ticks_ms(), 15);
    }

    #[test]
    fn test_manual_timer_wraps() {
        let timer = ManualTimer::new();
        timer.set_ms(u32::MAX - 1);
        timer.increment_ms(3);
        assert_eq!(timer.ticks_ms(), 1);
        assert_eq!(elapsed_ms(timer.ticks_ms(), u32::MAX - 1), 3);
    }

    #[test]
    fn test_closure_timer() {
        let source = || 42u32;
        assert_eq!(source.ticks_ms(), 42);
    }
}
