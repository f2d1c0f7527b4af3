//! Constants used across the repeater implementation.
//!
//! These values size the handoff buffer, fix the nominal timebase, and provide
//! the defaults for [`RepeaterConfig`](crate::repeater::RepeaterConfig).
//!
//! ## Key Concepts
//!
//! - **Tick**: one overflow of the periodic timer, nominally one millisecond.
//! - **Forward buffer**: the single-slot payload area shared between the radio
//!   interrupt and the main loop.
//! - **Cadence**: counts of main-loop iterations, not ticks.

/// Nominal tick rate of the timebase, in Hz.
///
/// The real rate depends on the prescaler quantization and usually runs a little
/// slow; see [`crate::timer::select_prescaler`].
pub const TICK_HZ: u32 = 1_000;

/// Nanoseconds per second, for [`DelayNs`](embedded_hal::delay::DelayNs) conversions.
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Number of counts in one overflow period of an 8-bit timer.
pub const TIMER_COUNTS: u32 = 256;

/// Capacity (in bytes) of the forward buffer.
///
/// Matches the largest static payload of the transceiver's receive FIFO.
pub const FORWARD_BUF_LEN: usize = 32;

/// Default destination pipe for forwarded packets.
pub const DEFAULT_DESTINATION: u8 = 8;

/// Default number of main-loop iterations between liveness indicator toggles.
pub const DEFAULT_LIVENESS_CADENCE: u32 = 10;

/// Default pause at the end of each main-loop iteration, in milliseconds.
pub const DEFAULT_LOOP_DELAY_MS: u32 = 50;

/// Default bound on a single transmit, in ticks.
pub const DEFAULT_TRANSMIT_TIMEOUT_TICKS: u32 = 100;

/// Default number of transmit attempts per forwarded packet (no retry).
pub const DEFAULT_MAX_ATTEMPTS: u8 = 1;
