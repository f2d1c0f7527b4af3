//! Simulated radio link and tick source.
//!
//! [`SimRadio`] implements [`RadioLink`] without hardware so the repeater state
//! machine can be exercised off-target. It records every main-loop call as a
//! [`SimEvent`], plays back a script of [`TxOutcome`]s, and models the two
//! meanings of the transceiver IRQ: payload ready while in RX, transmit complete
//! while in TX. [`SimRadio::irq_on_switch`] fires that IRQ from inside a mode
//! switch, the way a real interrupt can preempt the main loop there.
//!
//! [`SimClock`] is a [`TickSource`] that advances on every read, which lets busy
//! waits terminate deterministically in a single thread.

use core::cell::Cell;
use heapless::{Deque, Vec};

use crate::consts::FORWARD_BUF_LEN;
use crate::error::BufferError;
use crate::radio::{ForwardBuffer, OperatingMode, RadioLink, RadioState};
use crate::timer::TickSource;

/// Capacity of the event log.
pub const SIM_EVENT_CAPACITY: usize = 32;

/// Capacity of the transmit script.
pub const SIM_SCRIPT_CAPACITY: usize = 8;

/// A main-loop call observed by [`SimRadio`].
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum SimEvent {
    /// `initialize(mode)`
    Initialize(OperatingMode),
    /// `set_state(state)`
    SetState(RadioState),
    /// `start_transmit(destination, payload)`
    Transmit {
        /// Destination pipe.
        destination: u8,
        /// Bytes handed to the radio.
        payload: Vec<u8, FORWARD_BUF_LEN>,
    },
    /// `abort_transmit()`
    Abort,
}

/// How a scripted transmit ends.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum TxOutcome {
    /// Confirmed on the first poll.
    Complete,
    /// Confirmed after the given number of `WouldBlock` polls.
    CompleteAfter(u32),
    /// The driver reports a failure on the first poll.
    Fail,
    /// Never confirmed unless an IRQ arrives in TX state.
    Hang,
}

/// Errors produced by [`SimRadio`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SimError {
    /// Scripted transmit failure.
    TransmitFailed,
    /// Scripted `set_state` failure.
    StateChangeFailed,
    /// `poll_transmit` without a transmit in flight.
    Idle,
    /// Payload longer than the transceiver FIFO.
    Buffer(BufferError),
}

#[derive(Debug, Clone, Copy)]
enum InFlight {
    Pending { remaining: u32, hang: bool },
    Failed,
    Done,
}

/// A scripted, in-memory [`RadioLink`].
///
/// # Example
/// ```rust
/// use radio_repeater::radio::{OperatingMode, RadioLink};
/// use radio_repeater::sim::SimRadio;
///
/// let mut radio = SimRadio::new();
/// radio.initialize(OperatingMode::Repeater).unwrap();
/// radio.fire_irq(&[1, 2, 3]).unwrap();
/// assert!(radio.repeater_flag());
/// ```
#[derive(Debug)]
pub struct SimRadio {
    mode: OperatingMode,
    state: RadioState,
    forward: ForwardBuffer,
    rx_fifo: Option<Vec<u8, FORWARD_BUF_LEN>>,
    tx: Option<InFlight>,
    script: Deque<TxOutcome, SIM_SCRIPT_CAPACITY>,
    irq_on_switch: Option<(RadioState, Vec<u8, FORWARD_BUF_LEN>)>,
    fail_next_state_change: bool,
    events: Vec<SimEvent, SIM_EVENT_CAPACITY>,
    /// Number of IRQs handled.
    pub irq_count: u32,
    /// Packets that reached the application in plain RX mode.
    pub delivered: u32,
    /// Transmits confirmed by the hardware.
    pub tx_good: u32,
}

impl SimRadio {
    /// Creates an uninitialized radio in RX state with an empty script.
    ///
    /// An empty script completes every transmit on its first poll.
    pub fn new() -> Self {
        Self {
            mode: OperatingMode::Rx,
            state: RadioState::Rx,
            forward: ForwardBuffer::new(),
            rx_fifo: None,
            tx: None,
            script: Deque::new(),
            irq_on_switch: None,
            fail_next_state_change: false,
            events: Vec::new(),
            irq_count: 0,
            delivered: 0,
            tx_good: 0,
        }
    }

    /// Queues the outcome of an upcoming transmit. Outcomes are used in order.
    pub fn script(&mut self, outcome: TxOutcome) -> &mut Self {
        let _ = self.script.push_back(outcome);
        self
    }

    /// Makes the next `set_state` call fail.
    pub fn fail_next_state_change(&mut self) -> &mut Self {
        self.fail_next_state_change = true;
        self
    }

    /// Places a packet in the receive FIFO, as the air interface would.
    pub fn receive(&mut self, payload: &[u8]) -> Result<(), BufferError> {
        self.rx_fifo = Some(Vec::from_slice(payload).map_err(|_| BufferError::Overflow {
            len: payload.len(),
            capacity: FORWARD_BUF_LEN,
        })?);
        Ok(())
    }

    /// Receives `payload` and runs the IRQ handler, as a falling IRQ edge would.
    pub fn fire_irq(&mut self, payload: &[u8]) -> Result<(), BufferError> {
        self.receive(payload)?;
        self.isr_callback();
        Ok(())
    }

    /// Receives `payload` and runs the IRQ handler as soon as the next switch to
    /// `state` has completed, from inside that `set_state` call.
    ///
    /// With `RadioState::Rx` this lands a packet in the window between the
    /// repeater's return to RX and its clearing of the ready flag.
    pub fn irq_on_switch(
        &mut self,
        state: RadioState,
        payload: &[u8],
    ) -> Result<(), BufferError> {
        let payload = Vec::from_slice(payload).map_err(|_| BufferError::Overflow {
            len: payload.len(),
            capacity: FORWARD_BUF_LEN,
        })?;
        self.irq_on_switch = Some((state, payload));
        Ok(())
    }

    /// Every recorded main-loop call, oldest first.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Recorded transmits as `(destination, payload)` pairs.
    pub fn transmits(&self) -> impl Iterator<Item = (u8, &[u8])> {
        self.events.iter().filter_map(|e| match e {
            SimEvent::Transmit {
                destination,
                payload,
            } => Some((*destination, payload.as_slice())),
            _ => None,
        })
    }

    /// Forgets recorded events.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn record(&mut self, event: SimEvent) {
        // A full log keeps the oldest events.
        let _ = self.events.push(event);
    }

    fn take_rx_payload(&mut self) {
        let Some(payload) = self.rx_fifo.take() else {
            return;
        };
        match self.mode {
            OperatingMode::Repeater => {
                let _ = self.forward.store(&payload);
            }
            _ => self.delivered = self.delivered.wrapping_add(1),
        }
    }
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioLink for SimRadio {
    type Error = SimError;

    fn initialize(&mut self, mode: OperatingMode) -> Result<(), Self::Error> {
        self.mode = mode;
        self.state = match mode {
            OperatingMode::Tx => RadioState::Tx,
            OperatingMode::Rx | OperatingMode::Repeater => RadioState::Rx,
        };
        self.forward = ForwardBuffer::new();
        self.record(SimEvent::Initialize(mode));
        Ok(())
    }

    fn operating_mode(&self) -> OperatingMode {
        self.mode
    }

    fn state(&self) -> RadioState {
        self.state
    }

    fn set_state(&mut self, state: RadioState) -> Result<(), Self::Error> {
        self.record(SimEvent::SetState(state));
        if self.fail_next_state_change {
            self.fail_next_state_change = false;
            return Err(SimError::StateChangeFailed);
        }
        self.state = state;
        // Changing direction flushes the receive FIFO.
        self.rx_fifo = None;
        if let Some((_, payload)) = self.irq_on_switch.take_if(|(when, _)| *when == state) {
            self.rx_fifo = Some(payload);
            self.isr_callback();
        }
        Ok(())
    }

    fn start_transmit(&mut self, destination: u8, payload: &[u8]) -> Result<(), Self::Error> {
        let payload = Vec::from_slice(payload).map_err(|_| {
            SimError::Buffer(BufferError::Overflow {
                len: payload.len(),
                capacity: FORWARD_BUF_LEN,
            })
        })?;
        self.record(SimEvent::Transmit {
            destination,
            payload,
        });
        self.tx = Some(match self.script.pop_front().unwrap_or(TxOutcome::Complete) {
            TxOutcome::Complete => InFlight::Done,
            TxOutcome::CompleteAfter(n) => InFlight::Pending {
                remaining: n,
                hang: false,
            },
            TxOutcome::Fail => InFlight::Failed,
            TxOutcome::Hang => InFlight::Pending {
                remaining: 0,
                hang: true,
            },
        });
        Ok(())
    }

    fn poll_transmit(&mut self) -> nb::Result<(), Self::Error> {
        match self.tx {
            None => Err(nb::Error::Other(SimError::Idle)),
            Some(InFlight::Done) => {
                self.tx = None;
                self.tx_good = self.tx_good.wrapping_add(1);
                Ok(())
            }
            Some(InFlight::Failed) => {
                self.tx = None;
                Err(nb::Error::Other(SimError::TransmitFailed))
            }
            Some(InFlight::Pending { remaining, hang }) => {
                if hang {
                    return Err(nb::Error::WouldBlock);
                }
                self.tx = Some(if remaining <= 1 {
                    InFlight::Done
                } else {
                    InFlight::Pending {
                        remaining: remaining - 1,
                        hang,
                    }
                });
                Err(nb::Error::WouldBlock)
            }
        }
    }

    fn abort_transmit(&mut self) {
        self.tx = None;
        self.record(SimEvent::Abort);
    }

    fn isr_callback(&mut self) {
        self.irq_count = self.irq_count.wrapping_add(1);
        match self.state {
            RadioState::Rx => self.take_rx_payload(),
            RadioState::Tx => {
                if let Some(InFlight::Pending { .. }) = self.tx {
                    self.tx = Some(InFlight::Done);
                }
            }
        }
    }

    fn forward_buffer(&self) -> &ForwardBuffer {
        &self.forward
    }

    fn forward_buffer_mut(&mut self) -> &mut ForwardBuffer {
        &mut self.forward
    }
}

/// A [`TickSource`] that moves forward by `step` every time it is read.
#[derive(Debug)]
pub struct SimClock {
    now: Cell<u32>,
    step: u32,
    reads: Cell<u32>,
}

impl SimClock {
    /// Starts at `start` and advances by `step` per read.
    pub fn new(start: u32, step: u32) -> Self {
        Self {
            now: Cell::new(start),
            step,
            reads: Cell::new(0),
        }
    }

    /// The value the next read will return, without advancing.
    pub fn peek(&self) -> u32 {
        self.now.get()
    }

    /// Number of reads so far.
    pub fn reads(&self) -> u32 {
        self.reads.get()
    }
}

impl TickSource for SimClock {
    fn now(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        self.reads.set(self.reads.get().wrapping_add(1));
        now
    }
}
