//! Half-duplex repeater state machine.
//!
//! This module provides [`Repeater`], the main-loop side of a packet repeater.
//! The radio listens in RX. When its IRQ handler has buffered a packet and raised
//! the ready flag, the next main-loop poll copies the packet out, switches the
//! radio to TX, forwards the copy, switches back to RX, and only then clears the
//! flag.
//!
//! ## States
//!
//! ```text
//!          ready flag seen by poll()
//!   Listening ───────────────────────▶ Forwarding
//!   (radio RX) ◀─────────────────────── (radio TX)
//!          transmit done, failed or timed out
//! ```
//!
//! ## Ordering
//!
//! 1. Copy length and bytes into private scratch, in one critical section.
//! 2. Activity indicator on, radio to TX.
//! 3. Transmit, bounded by `transmit_timeout_ticks` per attempt.
//! 4. Radio back to RX, whatever the transmit result.
//! 5. Clear the ready flag, unless a newer packet arrived during 2–4.
//! 6. Activity indicator off.
//!
//! The interrupt path never runs any of these steps. A packet that arrives while
//! forwarding replaces the buffered one and is picked up on the next poll; no
//! queueing happens, so a packet can be lost to a newer one.
//!
//! ## Example
//!
//! ```rust
//! use embedded_hal_mock::eh1::delay::NoopDelay;
//! use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
//! use radio_repeater::repeater::{Repeater, RepeaterConfig};
//! use radio_repeater::shared::Shared;
//! use radio_repeater::sim::{SimClock, SimRadio};
//!
//! let radio = Shared::new();
//! radio.install(SimRadio::new());
//! let clock = SimClock::new(0, 1);
//! let liveness = Pin::new(&[PinTransaction::set(PinState::Low), PinTransaction::set(PinState::High)]);
//! let activity = Pin::new(&[PinTransaction::set(PinState::Low)]);
//!
//! let mut repeater = Repeater::new(&radio, &clock, liveness, activity, RepeaterConfig::default());
//! repeater.start().unwrap();
//! repeater.run_once(&mut NoopDelay::new());
//! let (mut liveness, mut activity) = repeater.free();
//! liveness.done();
//! activity.done();
//! ```

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::consts::{
    DEFAULT_DESTINATION, DEFAULT_LIVENESS_CADENCE, DEFAULT_LOOP_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_TRANSMIT_TIMEOUT_TICKS, FORWARD_BUF_LEN,
};
use crate::error::RepeaterError;
use crate::indicator::StatusIndicators;
use crate::log::{debug, info, log_warn as warn, trace};
use crate::radio::{OperatingMode, RadioLink, RadioState, Snapshot};
use crate::shared::Shared;
use crate::timer::TickSource;

/// Where the repeater is in its cycle.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RepeaterState {
    /// Radio in RX, waiting for the ready flag.
    #[default]
    Listening,
    /// Radio in TX, forwarding the copied payload.
    Forwarding,
}

/// Runtime settings of the [`Repeater`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RepeaterConfig {
    /// Destination handed to every forwarded transmit.
    pub destination: u8,
    /// Main-loop iterations between liveness indicator toggles. `0` disables it.
    pub liveness_cadence: u32,
    /// Pause at the end of [`Repeater::run_once`], in milliseconds.
    pub loop_delay_ms: u32,
    /// Ticks to wait for transmit confirmation before giving up on an attempt.
    pub transmit_timeout_ticks: u32,
    /// Transmit attempts per packet, at least one.
    pub max_attempts: u8,
}

impl Default for RepeaterConfig {
    fn default() -> Self {
        Self {
            destination: DEFAULT_DESTINATION,
            liveness_cadence: DEFAULT_LIVENESS_CADENCE,
            loop_delay_ms: DEFAULT_LOOP_DELAY_MS,
            transmit_timeout_ticks: DEFAULT_TRANSMIT_TIMEOUT_TICKS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Counters kept across forward cycles. All wrap.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RepeaterStats {
    /// Packets confirmed sent.
    pub forwarded: u32,
    /// Packets given up on after a driver error.
    pub failed: u32,
    /// Packets given up on after their last attempt timed out.
    pub timed_out: u32,
    /// Extra attempts made after a failed or timed-out one.
    pub retries: u32,
    /// Cycles that ended with a newer packet already pending.
    pub retained: u32,
}

/// The result of one forward cycle.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Forwarded {
    /// Payload length sent.
    pub len: usize,
    /// Attempts used, including the successful one.
    pub attempts: u8,
    /// `true` when a newer packet arrived meanwhile and is still pending.
    pub newer_pending: bool,
}

/// The main-loop repeater.
///
/// # Type Parameters
///
/// - `R`: the radio driver, shared with its IRQ handler through a [`Shared`] cell
/// - `C`: the tick source used for transmit timeouts
/// - `L`, `A`: liveness and activity indicator pins
pub struct Repeater<'a, R, C, L, A>
where
    R: RadioLink,
    C: TickSource,
    L: OutputPin,
    A: OutputPin,
{
    radio: &'a Shared<R>,
    clock: &'a C,
    indicators: StatusIndicators<L, A>,
    config: RepeaterConfig,
    state: RepeaterState,
    loop_counter: u32,
    scratch: Vec<u8, FORWARD_BUF_LEN>,
    stats: RepeaterStats,
}

impl<'a, R, C, L, A> Repeater<'a, R, C, L, A>
where
    R: RadioLink,
    C: TickSource,
    L: OutputPin,
    A: OutputPin,
{
    /// Creates a repeater around an installed radio cell.
    ///
    /// Both indicators are driven low. Call [`start`](Repeater::start) before
    /// polling.
    pub fn new(
        radio: &'a Shared<R>,
        clock: &'a C,
        liveness: L,
        activity: A,
        config: RepeaterConfig,
    ) -> Self {
        Self {
            radio,
            clock,
            indicators: StatusIndicators::new(liveness, activity),
            config,
            state: RepeaterState::Listening,
            loop_counter: 0,
            scratch: Vec::new(),
            stats: RepeaterStats::default(),
        }
    }

    /// Initializes the radio in repeater mode, listening, with the flag clear.
    pub fn start(&mut self) -> Result<(), RepeaterError<R::Error>> {
        self.radio
            .with(|radio| -> Result<(), R::Error> {
                radio.initialize(OperatingMode::Repeater)?;
                radio.set_state(RadioState::Rx)?;
                radio.set_repeater_flag(false);
                Ok(())
            })
            .ok_or(RepeaterError::NotStarted)?
            .map_err(RepeaterError::Radio)?;
        self.state = RepeaterState::Listening;
        info!("repeater: listening, destination {}", self.config.destination);
        Ok(())
    }

    /// One main-loop iteration, without the trailing delay.
    ///
    /// Toggles the liveness indicator on its cadence, forwards a pending packet
    /// if the radio is in repeater mode, and advances the loop counter.
    ///
    /// # Returns
    /// - `None` when nothing was pending
    /// - `Some(result)` of the forward cycle otherwise
    pub fn poll(&mut self) -> Option<Result<Forwarded, RepeaterError<R::Error>>> {
        if self.config.liveness_cadence != 0
            && self.loop_counter % self.config.liveness_cadence == 0
        {
            self.indicators.liveness.toggle();
        }

        let ready = self
            .radio
            .with(|radio| {
                radio.operating_mode() == OperatingMode::Repeater && radio.repeater_flag()
            })
            .unwrap_or(false);

        let outcome = if ready {
            Some(self.forward_pending())
        } else {
            None
        };

        self.loop_counter = self.loop_counter.wrapping_add(1);
        outcome
    }

    /// [`poll`](Repeater::poll) followed by the configured loop delay.
    pub fn run_once<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Option<Result<Forwarded, RepeaterError<R::Error>>> {
        let outcome = self.poll();
        delay.delay_ms(self.config.loop_delay_ms);
        outcome
    }

    /// The firmware main loop. Never returns.
    ///
    /// Errors are already logged and counted by the forward cycle; the loop
    /// carries on listening after each.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        loop {
            let _ = self.run_once(delay);
        }
    }

    /// Runs one forward cycle if a packet is pending.
    ///
    /// On return the repeater is [`Listening`](RepeaterState::Listening) and the
    /// activity indicator is off, whatever the outcome. The radio is asked to go
    /// back to RX even after a failure, and the ready flag is cleared unless a
    /// newer packet is waiting.
    pub fn forward_pending(&mut self) -> Result<Forwarded, RepeaterError<R::Error>> {
        let scratch = &mut self.scratch;
        let snapshot = self
            .radio
            .with(|radio| radio.forward_buffer().snapshot(scratch))
            .ok_or(RepeaterError::NotStarted)?;
        let Some(snapshot) = snapshot else {
            return Ok(Forwarded {
                len: 0,
                attempts: 0,
                newer_pending: false,
            });
        };

        self.indicators.activity.on();
        self.state = RepeaterState::Forwarding;
        trace!("repeater: forwarding {} bytes", snapshot.len);

        let mut result = self.set_radio_state(RadioState::Tx);
        let mut attempts = 0;
        if result.is_ok() {
            result = self.transmit_with_retry(&mut attempts);
        }

        let restored = self.set_radio_state(RadioState::Rx);
        if restored.is_err() {
            warn!("repeater: radio did not return to rx");
        }
        let newer_pending = self.release(snapshot);

        self.indicators.activity.off();
        self.state = RepeaterState::Listening;

        match &result {
            Ok(()) => {
                self.stats.forwarded = self.stats.forwarded.wrapping_add(1);
                debug!("repeater: forwarded {} bytes", snapshot.len);
            }
            Err(e) if e.is_timeout() => {
                self.stats.timed_out = self.stats.timed_out.wrapping_add(1);
                warn!("repeater: transmit timed out after {} attempts", attempts);
            }
            Err(_) => {
                self.stats.failed = self.stats.failed.wrapping_add(1);
                warn!("repeater: transmit failed after {} attempts", attempts);
            }
        }

        result.and(restored).map(|()| Forwarded {
            len: snapshot.len,
            attempts,
            newer_pending,
        })
    }

    fn set_radio_state(&self, state: RadioState) -> Result<(), RepeaterError<R::Error>> {
        self.radio
            .with(|radio| radio.set_state(state))
            .ok_or(RepeaterError::NotStarted)?
            .map_err(RepeaterError::Radio)
    }

    fn transmit_with_retry(&mut self, attempts: &mut u8) -> Result<(), RepeaterError<R::Error>> {
        let max_attempts = self.config.max_attempts.max(1);
        loop {
            *attempts += 1;
            match self.transmit_once() {
                Ok(()) => return Ok(()),
                Err(e) if *attempts >= max_attempts => return Err(e),
                Err(_) => {
                    self.stats.retries = self.stats.retries.wrapping_add(1);
                    debug!("repeater: retrying transmit, attempt {}", *attempts + 1);
                }
            }
        }
    }

    fn transmit_once(&mut self) -> Result<(), RepeaterError<R::Error>> {
        let destination = self.config.destination;
        let payload = self.scratch.as_slice();
        self.radio
            .with(|radio| radio.start_transmit(destination, payload))
            .ok_or(RepeaterError::NotStarted)?
            .map_err(RepeaterError::Radio)?;

        // Each poll is its own critical section so the tick and IRQ handlers
        // keep running while we wait.
        let timeout = self.config.transmit_timeout_ticks;
        let baseline = self.clock.now();
        loop {
            match self.radio.with(|radio| radio.poll_transmit()) {
                None => return Err(RepeaterError::NotStarted),
                Some(Ok(())) => return Ok(()),
                Some(Err(nb::Error::Other(e))) => return Err(RepeaterError::Radio(e)),
                Some(Err(nb::Error::WouldBlock)) => {
                    if self.clock.elapsed_since(baseline) >= timeout {
                        let _ = self.radio.with(|radio| radio.abort_transmit());
                        return Err(RepeaterError::TransmitTimeout { ticks: timeout });
                    }
                    core::hint::spin_loop();
                }
            }
        }
    }

    /// Clears the ready flag for `snapshot`. Returns `true` if a newer packet
    /// is left pending instead.
    fn release(&mut self, snapshot: Snapshot) -> bool {
        let released = self
            .radio
            .with(|radio| radio.forward_buffer_mut().release(snapshot))
            .unwrap_or(true);
        if !released {
            self.stats.retained = self.stats.retained.wrapping_add(1);
            debug!("repeater: newer packet arrived while forwarding");
        }
        !released
    }

    /// Current state. Always [`Listening`](RepeaterState::Listening) between calls.
    pub fn state(&self) -> RepeaterState {
        self.state
    }

    /// Main-loop iterations so far (wrapping).
    pub fn loop_counter(&self) -> u32 {
        self.loop_counter
    }

    /// Counters across forward cycles.
    pub fn stats(&self) -> RepeaterStats {
        self.stats
    }

    /// The active configuration.
    pub fn config(&self) -> &RepeaterConfig {
        &self.config
    }

    /// The status indicators.
    pub fn indicators(&self) -> &StatusIndicators<L, A> {
        &self.indicators
    }

    /// Releases the indicator pins.
    pub fn free(self) -> (L, A) {
        self.indicators.free()
    }
}

impl<R, C, L, A> fmt::Debug for Repeater<'_, R, C, L, A>
where
    R: RadioLink,
    C: TickSource,
    L: OutputPin,
    A: OutputPin,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repeater")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("loop_counter", &self.loop_counter)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
