use super::TickSource;
use crate::consts::{NANOS_PER_SECOND, TICK_HZ};
use embedded_hal::delay::DelayNs;

/// Blocking delay that spins on a [`TickSource`].
///
/// Each call captures the current tick count as its baseline and spins until the
/// counter has advanced by the requested amount. Nothing else in the main loop
/// runs meanwhile; interrupts still do, and they are what advance the counter.
///
/// # Guarantees
/// - Returns no earlier than `ticks` counter increments after the call, from
///   any starting value including just below wraparound.
/// - May return later under interrupt load.
///
/// # Example
/// ```rust,no_run
/// use embedded_hal::delay::DelayNs;
/// use radio_repeater::timer::{TickClock, TickDelay};
///
/// static TICKS: TickClock = TickClock::new();
///
/// let mut delay = TickDelay::new(&TICKS);
/// delay.delay_ms(50); // spins until the timer ISR has fired 50 times
/// ```
#[derive(Debug)]
pub struct TickDelay<'a, C: TickSource> {
    clock: &'a C,
}

impl<'a, C: TickSource> TickDelay<'a, C> {
    /// Creates a delay provider reading `clock`.
    pub fn new(clock: &'a C) -> Self {
        Self { clock }
    }

    /// Spins until `ticks` ticks have elapsed.
    pub fn delay_ticks(&mut self, ticks: u32) {
        let baseline = self.clock.now();
        while self.clock.elapsed_since(baseline) < ticks {
            core::hint::spin_loop();
        }
    }
}

/// Converts nanoseconds into ticks, rounding up so a delay is never short.
pub const fn ns_to_ticks(ns: u32) -> u32 {
    (ns as u64 * TICK_HZ as u64).div_ceil(NANOS_PER_SECOND) as u32
}

impl<C: TickSource> DelayNs for TickDelay<'_, C> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ticks(ns_to_ticks(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ticks((us as u64 * TICK_HZ as u64).div_ceil(1_000_000) as u32);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_ticks((ms as u64 * TICK_HZ as u64).div_ceil(1_000) as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimClock;
    use crate::timer::{Prescaler, TickClock, TickTimer};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    struct NullTimer;

    impl TickTimer for NullTimer {
        fn start(&mut self, _prescaler: Prescaler) {}
        fn clear_pending(&mut self) {}
    }

    #[test]
    fn test_zero_ticks_returns_immediately() {
        let clock = SimClock::new(0, 0);
        let mut delay = TickDelay::new(&clock);
        delay.delay_ticks(0);
        assert_eq!(clock.reads(), 2);
    }

    #[test]
    fn test_waits_at_least_requested_ticks() {
        let clock = SimClock::new(100, 1);
        let mut delay = TickDelay::new(&clock);
        delay.delay_ticks(20);
        assert!(clock.peek().wrapping_sub(100) >= 20);
    }

    #[test]
    fn test_waits_across_wraparound() {
        let start = u32::MAX - 3;
        let clock = SimClock::new(start, 1);
        let mut delay = TickDelay::new(&clock);
        delay.delay_ticks(10);
        let end = clock.peek();
        assert!(end < start);
        assert!(end.wrapping_sub(start) >= 10);
    }

    #[test]
    fn test_ns_rounds_up_to_whole_ticks() {
        assert_eq!(ns_to_ticks(0), 0);
        assert_eq!(ns_to_ticks(1), 1);
        assert_eq!(ns_to_ticks(1_000_000), 1);
        assert_eq!(ns_to_ticks(1_000_001), 2);
    }

    #[test]
    fn test_delay_ms_driven_by_timer_interrupts() {
        static CLOCK: TickClock = TickClock::starting_at(u32::MAX - 5);
        static RUNNING: AtomicBool = AtomicBool::new(true);

        let isr = thread::spawn(|| {
            let mut timer = NullTimer;
            while RUNNING.load(Ordering::Relaxed) {
                CLOCK.on_interrupt(&mut timer);
                thread::yield_now();
            }
        });

        let start = CLOCK.now();
        let mut delay = TickDelay::new(&CLOCK);
        delay.delay_ms(15);
        let elapsed = CLOCK.elapsed_since(start);
        RUNNING.store(false, Ordering::Relaxed);
        isr.join().unwrap();

        assert!(elapsed >= 15);
    }
}
