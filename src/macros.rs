/// Declares the global `TICK_CLOCK` and `TICK_TIMER` statics.
///
/// `TICK_CLOCK` is the millisecond timebase; `TICK_TIMER` holds the timer
/// peripheral once [`global_tick_timer_setup`](crate::timer::global_tick_timer_setup)
/// has run.
///
/// # Arguments
/// - `$timer`: the concrete timer type (must implement [`TickTimer`](crate::timer::TickTimer))
///
/// # Example
/// ```rust,ignore
/// init_tick_timer!(Tc0);
/// ```
#[macro_export]
macro_rules! init_tick_timer {
    ( $timer:ty ) => {
        pub static TICK_CLOCK: $crate::timer::TickClock = $crate::timer::TickClock::new();
        pub static TICK_TIMER: $crate::shared::Shared<$timer> = $crate::shared::Shared::new();
    };
}

/// Body of the timer overflow interrupt handler.
///
/// Assumes `TICK_CLOCK` and `TICK_TIMER` were declared with [`init_tick_timer!`].
///
/// # Example
/// ```rust,ignore
/// #[avr_device::interrupt(atmega328p)]
/// fn TIMER0_OVF() {
///     tick_interrupt!();
/// }
/// ```
#[macro_export]
macro_rules! tick_interrupt {
    () => {
        $crate::timer::global_tick_interrupt(&TICK_CLOCK, &TICK_TIMER)
    };
}

/// Declares the global `RADIO` and `RADIO_IRQ` statics.
///
/// # Arguments
/// - `$radio`: the driver type (must implement [`RadioLink`](crate::radio::RadioLink))
/// - `$line`: the IRQ line type (must implement [`EdgeLine`](crate::exti::EdgeLine))
///
/// # Example
/// ```rust,ignore
/// init_repeater_radio!(Nrf24<Spi, Ce>, Int0);
///
/// fn main() {
///     RADIO.install(nrf24);
///     RADIO_IRQ.install(EdgeInput::new(int0));
/// }
/// ```
#[macro_export]
macro_rules! init_repeater_radio {
    ( $radio:ty, $line:ty ) => {
        pub static RADIO: $crate::shared::Shared<$radio> = $crate::shared::Shared::new();
        pub static RADIO_IRQ: $crate::shared::Shared<$crate::exti::EdgeInput<$line>> =
            $crate::shared::Shared::new();
    };
}

/// Body of the transceiver IRQ handler.
///
/// Assumes `RADIO` and `RADIO_IRQ` were declared with [`init_repeater_radio!`].
///
/// # Example
/// ```rust,ignore
/// #[avr_device::interrupt(atmega328p)]
/// fn INT0() {
///     radio_interrupt!();
/// }
/// ```
#[macro_export]
macro_rules! radio_interrupt {
    () => {
        $crate::exti::global_radio_interrupt(&RADIO_IRQ, &RADIO)
    };
}

#[cfg(test)]
mod tests {
    use crate::exti::{Edge, EdgeInput, EdgeLine, Pull};
    use crate::radio::{OperatingMode, RadioLink};
    use crate::sim::SimRadio;
    use crate::timer::{Prescaler, TickSource, TickTimer};

    #[derive(Debug, Default)]
    pub struct OverflowTimer {
        acknowledged: u32,
    }

    impl TickTimer for OverflowTimer {
        fn start(&mut self, _prescaler: Prescaler) {}

        fn clear_pending(&mut self) {
            self.acknowledged += 1;
        }
    }

    #[derive(Debug, Default)]
    pub struct IrqLine;

    impl EdgeLine for IrqLine {
        fn configure(&mut self, _edge: Edge, _pull: Pull) {}
        fn unmask(&mut self) {}
        fn mask(&mut self) {}
        fn clear_pending(&mut self) {}
        fn is_pending(&self) -> bool {
            false
        }
    }

    mod wiring {
        crate::init_tick_timer!(super::OverflowTimer);
        crate::init_repeater_radio!(crate::sim::SimRadio, super::IrqLine);

        pub fn on_timer0_overflow() {
            crate::tick_interrupt!();
        }

        pub fn on_int0() {
            crate::radio_interrupt!();
        }
    }

    #[test]
    fn test_declared_statics_drive_handlers() {
        let _ = crate::timer::global_tick_timer_setup(
            &wiring::TICK_TIMER,
            OverflowTimer::default(),
            16_000_000,
        );
        for _ in 0..3 {
            wiring::on_timer0_overflow();
        }
        assert_eq!(wiring::TICK_CLOCK.now(), 3);
        assert_eq!(wiring::TICK_TIMER.with(|t| t.acknowledged), Some(4));

        let mut radio = SimRadio::new();
        radio.initialize(OperatingMode::Repeater).unwrap();
        radio.receive(&[0xCA, 0xFE]).unwrap();
        let _ = wiring::RADIO.install(radio);
        let _ = wiring::RADIO_IRQ.install(EdgeInput::new(IrqLine));
        wiring::on_int0();

        let mut out = [0u8; 4];
        let len = wiring::RADIO
            .with(|r| r.copy_buffered_payload(&mut out))
            .unwrap();
        assert_eq!(&out[..len], &[0xCA, 0xFE]);
    }
}
