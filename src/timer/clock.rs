use core::cell::Cell;
use critical_section::Mutex;

use super::TickTimer;

/// Anything that can report the current tick count.
///
/// Implemented by [`TickClock`]; test doubles implement it to control time
/// directly.
pub trait TickSource {
    /// Current tick count. Wraps at `u32::MAX`.
    fn now(&self) -> u32;

    /// Ticks elapsed since `baseline`, correct across one wraparound.
    fn elapsed_since(&self, baseline: u32) -> u32 {
        self.now().wrapping_sub(baseline)
    }
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> u32 {
        (**self).now()
    }
}

/// The software millisecond timebase.
///
/// A wrapping `u32` counter advanced by exactly one on every timer overflow
/// interrupt. The counter is written only by [`on_interrupt`](TickClock::on_interrupt);
/// every other context only reads it, so readers must tolerate it changing
/// between a load and its use. Compare with [`TickSource::elapsed_since`],
/// never with equality.
///
/// # Example
/// ```rust
/// use radio_repeater::timer::{TickClock, TickSource};
///
/// static TICKS: TickClock = TickClock::new();
///
/// assert_eq!(TICKS.now(), 0);
/// ```
#[derive(Debug)]
pub struct TickClock {
    ticks: Mutex<Cell<u32>>,
}

impl TickClock {
    /// Creates a clock starting at zero.
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a clock starting at `ticks`.
    ///
    /// Useful to exercise the wraparound path without waiting 49 days.
    pub const fn starting_at(ticks: u32) -> Self {
        Self {
            ticks: Mutex::new(Cell::new(ticks)),
        }
    }

    /// Body of the timer overflow interrupt handler.
    ///
    /// Increments the counter, then acknowledges the overflow on `timer`. The
    /// acknowledge is part of this call so a handler cannot return with the
    /// interrupt still pending.
    pub fn on_interrupt<T: TickTimer>(&self, timer: &mut T) {
        critical_section::with(|cs| {
            let ticks = self.ticks.borrow(cs);
            ticks.set(ticks.get().wrapping_add(1));
        });
        timer.clear_pending();
    }
}

impl TickSource for TickClock {
    fn now(&self) -> u32 {
        critical_section::with(|cs| self.ticks.borrow(cs).get())
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Prescaler;

    #[derive(Default)]
    struct CountingTimer {
        cleared: u32,
    }

    impl TickTimer for CountingTimer {
        fn start(&mut self, _prescaler: Prescaler) {}

        fn clear_pending(&mut self) {
            self.cleared += 1;
        }
    }

    #[test]
    fn test_each_interrupt_adds_one_and_acknowledges() {
        let clock = TickClock::new();
        let mut timer = CountingTimer::default();
        for n in 1..=25 {
            clock.on_interrupt(&mut timer);
            assert_eq!(clock.now(), n);
        }
        assert_eq!(timer.cleared, 25);
    }

    #[test]
    fn test_counter_wraps() {
        let clock = TickClock::starting_at(u32::MAX - 1);
        let mut timer = CountingTimer::default();
        let before = clock.now();
        for _ in 0..4 {
            clock.on_interrupt(&mut timer);
        }
        assert_eq!(clock.now(), 2);
        assert_eq!(clock.elapsed_since(before), 4);
    }

    #[test]
    fn test_reference_forwards_to_clock() {
        let clock = TickClock::starting_at(7);
        let by_ref = &clock;
        assert_eq!(TickSource::now(&by_ref), 7);
        assert_eq!(by_ref.elapsed_since(5), 2);
    }
}
