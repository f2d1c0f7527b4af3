//! Edge-triggered interrupt inputs.
//!
//! Used for the transceiver's active-low IRQ line and for a user button. The
//! platform supplies an [`EdgeLine`]; [`EdgeInput`] owns it and enforces the
//! configure → clear → unmask setup order and the clear-before-callback rule in
//! the handler.

#[cfg(feature = "isr")]
use crate::radio::RadioLink;
#[cfg(feature = "isr")]
use crate::shared::Shared;

/// Signal transition that raises the interrupt.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Edge {
    /// High to low. Open-drain IRQ outputs and buttons to ground use this.
    #[default]
    Falling,
    /// Low to high.
    Rising,
    /// Any transition.
    Both,
}

/// Input bias of the line.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Pull {
    /// No internal bias.
    Floating,
    /// Internal pull-up enabled.
    #[default]
    Up,
}

/// External interrupt hardware for a single input line.
pub trait EdgeLine {
    /// Sets the pin as input with `pull` and selects the trigger `edge`.
    fn configure(&mut self, edge: Edge, pull: Pull);
    /// Enables the interrupt in the mask register.
    fn unmask(&mut self);
    /// Disables the interrupt in the mask register.
    fn mask(&mut self);
    /// Clears the pending flag.
    fn clear_pending(&mut self);
    /// Reads the pending flag.
    fn is_pending(&self) -> bool;
}

/// A configured edge interrupt line.
///
/// # Example
/// ```rust,ignore
/// let mut irq = EdgeInput::new(pd2_int0);
///
/// #[avr_device::interrupt(atmega328p)]
/// fn INT0() {
///     irq.service(|| radio.isr_callback());
/// }
/// ```
#[derive(Debug)]
pub struct EdgeInput<L: EdgeLine> {
    line: L,
    edge: Edge,
    serviced: u32,
}

impl<L: EdgeLine> EdgeInput<L> {
    /// Configures `line` for a falling edge with pull-up and enables it.
    pub fn new(line: L) -> Self {
        Self::with_trigger(line, Edge::Falling, Pull::Up)
    }

    /// Configures `line` with an explicit trigger and bias and enables it.
    ///
    /// A stale pending flag from before configuration is cleared before the
    /// interrupt is unmasked, so no spurious first call happens.
    pub fn with_trigger(mut line: L, edge: Edge, pull: Pull) -> Self {
        line.configure(edge, pull);
        line.clear_pending();
        line.unmask();
        Self {
            line,
            edge,
            serviced: 0,
        }
    }

    /// Handler body: clears the pending flag, then runs `callback` once.
    ///
    /// The callback must be short and must not wait on anything only another
    /// interrupt of the same line could provide.
    pub fn service<R>(&mut self, callback: impl FnOnce() -> R) -> R {
        self.line.clear_pending();
        self.serviced = self.serviced.wrapping_add(1);
        callback()
    }

    /// Temporarily disables the line.
    pub fn disable(&mut self) {
        self.line.mask();
    }

    /// Re-enables the line after [`disable`](EdgeInput::disable).
    pub fn enable(&mut self) {
        self.line.clear_pending();
        self.line.unmask();
    }

    /// The trigger edge the line was configured with.
    pub fn edge(&self) -> Edge {
        self.edge
    }

    /// Number of edges handled so far (wrapping).
    pub fn serviced(&self) -> u32 {
        self.serviced
    }

    /// Releases the underlying line, masked.
    pub fn free(mut self) -> L {
        self.line.mask();
        self.line
    }
}

/// Services a globally shared edge line, running `callback` if it is installed.
///
/// # Example
/// ```rust,ignore
/// #[avr_device::interrupt(atmega328p)]
/// fn INT1() {
///     global_edge_interrupt(&BUTTON, || PRESSES.fetch_add(1, Ordering::Relaxed));
/// }
/// ```
#[cfg(feature = "isr")]
pub fn global_edge_interrupt<L: EdgeLine, R>(
    line: &Shared<EdgeInput<L>>,
    callback: impl FnOnce() -> R,
) -> Option<R> {
    line.with(|input| input.service(callback))
}

/// Body of the transceiver IRQ handler.
///
/// Clears the line and calls [`RadioLink::isr_callback`] within one critical
/// section, which fills the forward buffer and raises the ready flag. Does
/// nothing until both cells are installed.
///
/// # Example
/// ```rust,ignore
/// #[avr_device::interrupt(atmega328p)]
/// fn INT0() {
///     global_radio_interrupt(&RADIO_IRQ, &RADIO);
/// }
/// ```
#[cfg(feature = "isr")]
pub fn global_radio_interrupt<L: EdgeLine, R: RadioLink>(
    line: &Shared<EdgeInput<L>>,
    radio: &Shared<R>,
) {
    critical_section::with(|cs| {
        let _ = line.with_cs(cs, |input| {
            input.service(|| radio.with_cs(cs, |radio| radio.isr_callback()))
        });
    });
}
