//! Timebase and delay utilities.
//!
//! The timebase is a periodic overflow interrupt of an 8-bit timer that bumps a
//! software tick counter, nominally once per millisecond. Everything time related
//! in the crate (delays, transmit timeouts) is measured in those ticks.
//!
//! Contains:
//! - [`TickClock`] and the [`TickSource`] trait: the tick counter and its readers
//! - [`TickDelay`]: busy-wait delay built on any [`TickSource`]
//! - [`select_prescaler`] / [`overflow_hz`]: runtime prescaler selection
//! - [`const_overflow_millihz`]: compile-time overflow rate
//! - [`global_tick_interrupt`] and `tick_interrupt!()`: interrupt handler wrappers
//!   (feature `isr`)
//!
//! Overflow rates of an 8-bit timer at 16 MHz:
//!
//! | PRESCALER | Overflow rate | Overflow interval |
//! |-----------|---------------|-------------------|
//! |         1 |     62 500 Hz |            16 µs  |
//! |         8 |   7 812.5 Hz  |           128 µs  |
//! |        64 |  976.5625 Hz  |          1.024 ms |
//! |       256 |  244.14 Hz    |          4.096 ms |
//! |      1024 |   61.04 Hz    |         16.384 ms |
//!
//! The clk/64 row is the usual 1 kHz choice; it runs about 2.3 % slow, which is
//! accepted rather than corrected.

use libm::{fabsf, roundf};

use crate::consts::TIMER_COUNTS;

mod clock;
pub use clock::*;

mod delay;
pub use delay::*;

#[cfg(feature = "isr")]
mod isr;
#[cfg(feature = "isr")]
pub use isr::*;

/// Clock prescaler of the tick timer.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Prescaler {
    /// clk/1
    Div1,
    /// clk/8
    Div8,
    /// clk/64
    Div64,
    /// clk/256
    Div256,
    /// clk/1024
    Div1024,
}

impl Prescaler {
    /// Every prescaler, smallest divisor first.
    pub const ALL: [Prescaler; 5] = [
        Prescaler::Div1,
        Prescaler::Div8,
        Prescaler::Div64,
        Prescaler::Div256,
        Prescaler::Div1024,
    ];

    /// The clock divisor.
    pub const fn divisor(self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }

    /// Clock-select bits for the timer control register.
    ///
    /// `0b000` stops the timer and is never returned.
    pub const fn clock_select_bits(self) -> u8 {
        match self {
            Prescaler::Div1 => 0b001,
            Prescaler::Div8 => 0b010,
            Prescaler::Div64 => 0b011,
            Prescaler::Div256 => 0b100,
            Prescaler::Div1024 => 0b101,
        }
    }
}

/// Hardware timer driving the tick counter.
///
/// Implementations wrap the platform's overflow timer. The crate only calls
/// [`start`](TickTimer::start) during setup and
/// [`clear_pending`](TickTimer::clear_pending) from
/// [`TickClock::on_interrupt`].
pub trait TickTimer {
    /// Configures the prescaler, enables the overflow interrupt and starts counting.
    fn start(&mut self, prescaler: Prescaler);

    /// Acknowledges the overflow so the interrupt does not fire again immediately.
    fn clear_pending(&mut self);
}

/// Overflow rate of an 8-bit timer in Hz.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler
pub fn overflow_hz(f_cpu: u32, prescaler: Prescaler) -> f32 {
    f_cpu as f32 / prescaler.divisor() as f32 / TIMER_COUNTS as f32
}

/// Compile-time overflow rate, in millihertz (truncated).
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler
pub const fn const_overflow_millihz(f_cpu: u32, prescaler: Prescaler) -> u32 {
    ((f_cpu as u64 * 1_000) / (prescaler.divisor() as u64 * TIMER_COUNTS as u64)) as u32
}

/// Picks the prescaler whose overflow rate is closest to `target_hz`.
///
/// # Returns
/// - The chosen prescaler
/// - The overflow rate it actually achieves, in Hz
pub fn select_prescaler(f_cpu: u32, target_hz: u32) -> (Prescaler, f32) {
    let target = target_hz as f32;
    let mut best = Prescaler::Div1;
    let mut best_rate = overflow_hz(f_cpu, best);
    for prescaler in Prescaler::ALL {
        let rate = overflow_hz(f_cpu, prescaler);
        if fabsf(rate - target) < fabsf(best_rate - target) {
            best = prescaler;
            best_rate = rate;
        }
    }
    (best, best_rate)
}

/// Deviation of the achieved tick rate from nominal, in parts per million.
///
/// Negative values mean the timebase runs slow.
pub fn drift_ppm(actual_hz: f32, nominal_hz: u32) -> i32 {
    let nominal = nominal_hz as f32;
    roundf((actual_hz - nominal) / nominal * 1_000_000.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TICK_HZ;

    #[test]
    fn test_select_prescaler_for_16mhz() {
        let (prescaler, rate) = select_prescaler(16_000_000, TICK_HZ);
        assert_eq!(prescaler, Prescaler::Div64);
        assert_eq!(prescaler.clock_select_bits(), 0x03);
        assert!(fabsf(rate - 976.5625) < 1e-3);
    }

    #[test]
    fn test_select_prescaler_for_8mhz() {
        // 8 MHz: clk/64 gives 488 Hz, clk/8 gives 3906 Hz
        let (prescaler, _) = select_prescaler(8_000_000, TICK_HZ);
        assert_eq!(prescaler, Prescaler::Div64);
    }

    #[test]
    fn test_const_rate_matches_runtime_rate() {
        for prescaler in Prescaler::ALL {
            let millihz = const_overflow_millihz(16_000_000, prescaler);
            let hz = overflow_hz(16_000_000, prescaler);
            assert!(fabsf(millihz as f32 / 1_000.0 - hz) < 1e-2);
        }
        assert_eq!(const_overflow_millihz(16_000_000, Prescaler::Div64), 976_562);
    }

    #[test]
    fn test_drift_is_negative_when_slow() {
        assert!((-23_439..=-23_437).contains(&drift_ppm(976.5625, 1_000)));
        assert_eq!(drift_ppm(1_000.0, 1_000), 0);
    }
}
