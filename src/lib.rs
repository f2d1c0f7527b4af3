//! # radio-repeater
//!
//! A portable, no_std Rust core for a half-duplex packet repeater built on a
//! radio transceiver with an active-low IRQ line (nRF24L01 style).
//!
//! The node listens in RX. When the transceiver signals a received payload, the
//! IRQ handler buffers it and raises a ready flag; the main loop sees the flag,
//! switches the radio to TX, forwards the payload, switches back to RX and
//! clears the flag.
//!
//! This crate provides:
//! - a millisecond tick service driven by a timer overflow interrupt
//! - a busy-wait delay built on the tick counter
//! - edge interrupt inputs with a clear-before-callback handler discipline
//! - the RX/TX repeater state machine with bounded transmit waits
//! - interrupt-safe shared cells built on `critical-section`
//! - a simulated radio for off-target testing
//!
//! ## Crate features
//! | Feature          | Description |
//! |------------------|-------------|
//! | `std`            | Disables `#![no_std]` and enables the `critical-section` std implementation |
//! | `isr` (default)  | Global interrupt handler helpers and the `init_*!` / `*_interrupt!` macros |
//! | `sim`            | Exposes the [`sim`] module outside of tests |
//! | `defmt-0-3`      | Uses `defmt` logging |
//! | `log`            | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use radio_repeater::{init_repeater_radio, init_tick_timer, radio_interrupt, tick_interrupt};
//! use radio_repeater::exti::EdgeInput;
//! use radio_repeater::repeater::{Repeater, RepeaterConfig};
//! use radio_repeater::timer::{TickDelay, global_tick_timer_setup};
//!
//! init_tick_timer!(Tc0);
//! init_repeater_radio!(Nrf24<Spi, Ce>, Int0);
//!
//! #[avr_device::interrupt(atmega328p)]
//! fn TIMER0_OVF() {
//!     tick_interrupt!();
//! }
//!
//! #[avr_device::interrupt(atmega328p)]
//! fn INT0() {
//!     radio_interrupt!();
//! }
//!
//! fn main() -> ! {
//!     global_tick_timer_setup(&TICK_TIMER, tc0, 16_000_000);
//!     RADIO.install(nrf24);
//!     RADIO_IRQ.install(EdgeInput::new(int0));
//!
//!     let mut repeater = Repeater::new(&RADIO, &TICK_CLOCK, red_led, blue_led, RepeaterConfig::default());
//!     repeater.start().unwrap();
//!     repeater.run(&mut TickDelay::new(&TICK_CLOCK))
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - The tick rate is approximate (976.5625 Hz for clk/64 at 16 MHz); this drift
//!   is accepted, not corrected
//! - The IRQ handler must only buffer data; mode changes and transmits happen
//!   in the main loop
//! - One pending packet at most: a newer packet replaces an unforwarded one
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(all(test, not(feature = "std")))]
extern crate std;

pub use critical_section;

pub use heapless;

pub mod consts;
pub mod error;
pub mod exti;
pub mod indicator;
pub(crate) mod log;
#[cfg(feature = "isr")]
mod macros;
pub mod radio;
pub mod repeater;
pub mod shared;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod timer;
