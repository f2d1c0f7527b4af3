//! Status indicator outputs.
//!
//! Two lines: a liveness indicator toggled on a fixed main-loop cadence, and an
//! activity indicator lit for the duration of a forward cycle.

use embedded_hal::digital::OutputPin;

/// An output line that remembers the level it last drove.
///
/// Tracking the level here means only `OutputPin` is needed, not
/// `StatefulOutputPin`. Pin errors are ignored, as they are for any
/// push-pull GPIO on the supported HALs.
#[derive(Debug)]
pub struct Indicator<P: OutputPin> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> Indicator<P> {
    /// Wraps `pin` and drives it low.
    pub fn new(mut pin: P) -> Self {
        let _ = pin.set_low();
        Self { pin, lit: false }
    }

    /// Drives the line high.
    pub fn on(&mut self) {
        let _ = self.pin.set_high();
        self.lit = true;
    }

    /// Drives the line low.
    pub fn off(&mut self) {
        let _ = self.pin.set_low();
        self.lit = false;
    }

    /// Inverts the line.
    pub fn toggle(&mut self) {
        if self.lit { self.off() } else { self.on() }
    }

    /// The level last driven.
    pub fn is_on(&self) -> bool {
        self.lit
    }

    /// Releases the pin.
    pub fn free(self) -> P {
        self.pin
    }
}

/// The repeater's pair of indicators.
#[derive(Debug)]
pub struct StatusIndicators<L: OutputPin, A: OutputPin> {
    /// Toggled every few main-loop iterations.
    pub liveness: Indicator<L>,
    /// Lit while a packet is being forwarded.
    pub activity: Indicator<A>,
}

impl<L: OutputPin, A: OutputPin> StatusIndicators<L, A> {
    /// Wraps both pins, driving them low.
    pub fn new(liveness: L, activity: A) -> Self {
        Self {
            liveness: Indicator::new(liveness),
            activity: Indicator::new(activity),
        }
    }

    /// Releases both pins.
    pub fn free(self) -> (L, A) {
        (self.liveness.free(), self.activity.free())
    }
}
