use super::{Prescaler, TickClock, TickTimer, select_prescaler};
use crate::consts::TICK_HZ;
use crate::log::info;
use crate::shared::Shared;

/// Starts the tick timer at the rate closest to [`TICK_HZ`] and installs it in
/// `timer_cell` for use by [`global_tick_interrupt`].
///
/// # Arguments
/// * The global timer cell
/// * The configured but stopped timer peripheral
/// * The CPU frequency in Hz
///
/// # Returns
/// * The prescaler that was programmed
/// * The tick rate it achieves, in Hz (usually a little under nominal)
///
/// # Example
/// ```rust,ignore
/// static TICK_TIMER: Shared<Tc0> = Shared::new();
///
/// fn main() {
///     let (_, rate) = global_tick_timer_setup(&TICK_TIMER, tc0, 16_000_000);
/// }
/// ```
pub fn global_tick_timer_setup<T: TickTimer>(
    timer_cell: &Shared<T>,
    mut timer: T,
    f_cpu: u32,
) -> (Prescaler, f32) {
    let (prescaler, rate) = select_prescaler(f_cpu, TICK_HZ);
    // The first overflow must find the timer already installed.
    critical_section::with(|_| {
        timer.start(prescaler);
        timer.clear_pending();
        let _ = timer_cell.install(timer);
    });
    info!("tick: prescaler /{}", prescaler.divisor());
    (prescaler, rate)
}

/// Runs the tick at each timer overflow interrupt.
///
/// Does nothing until the timer has been installed.
///
/// # Example
/// ```rust,ignore
/// #[avr_device::interrupt(atmega328p)]
/// fn TIMER0_OVF() {
///     global_tick_interrupt(&TICK_CLOCK, &TICK_TIMER);
/// }
/// ```
pub fn global_tick_interrupt<T: TickTimer>(clock: &TickClock, timer_cell: &Shared<T>) {
    let _ = timer_cell.with(|timer| clock.on_interrupt(timer));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TickSource;

    #[derive(Default, Debug)]
    struct FakeTimer {
        started: Option<Prescaler>,
        cleared: u32,
    }

    impl TickTimer for FakeTimer {
        fn start(&mut self, prescaler: Prescaler) {
            self.started = Some(prescaler);
        }

        fn clear_pending(&mut self) {
            self.cleared += 1;
        }
    }

    #[test]
    fn test_setup_programs_prescaler_and_installs() {
        let cell = Shared::new();
        let (prescaler, _) = global_tick_timer_setup(&cell, FakeTimer::default(), 16_000_000);
        assert_eq!(prescaler, Prescaler::Div64);
        let (started, cleared) = cell.with(|t| (t.started, t.cleared)).unwrap();
        assert_eq!(started, Some(Prescaler::Div64));
        assert_eq!(cleared, 1);
    }

    #[test]
    fn test_interrupt_before_setup_is_ignored() {
        let clock = TickClock::new();
        let cell: Shared<FakeTimer> = Shared::new();
        global_tick_interrupt(&clock, &cell);
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn test_interrupt_ticks_and_acknowledges() {
        let clock = TickClock::new();
        let cell = Shared::new();
        let _ = global_tick_timer_setup(&cell, FakeTimer::default(), 16_000_000);
        for _ in 0..10 {
            global_tick_interrupt(&clock, &cell);
        }
        assert_eq!(clock.now(), 10);
        assert_eq!(cell.with(|t| t.cleared).unwrap(), 11);
    }
}
