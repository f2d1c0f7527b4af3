//! Radio link driver boundary.
//!
//! The register-level transceiver driver lives outside this crate. It plugs in by
//! implementing [`RadioLink`], which is everything the repeater needs from it:
//! mode control, a transmit path, the interrupt callback, and access to the
//! single-slot [`ForwardBuffer`] that carries a received packet from interrupt
//! context to the main loop.
//!
//! ## Ownership of the forward buffer
//!
//! - Only [`RadioLink::isr_callback`] stores into the buffer and sets the ready flag.
//! - Only the main loop copies out of the buffer and clears the flag.
//! - A store while a packet is still pending replaces it (last-write-wins) and
//!   is counted in [`ForwardBuffer::overwritten`].
//!
//! The driver normally sits in a [`Shared`](crate::shared::Shared) cell, so
//! both sides run with interrupts held off and a copy can never tear.

use heapless::Vec;

use crate::consts::FORWARD_BUF_LEN;
use crate::error::BufferError;

/// Operating variant selected at initialization.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum OperatingMode {
    /// Plain receiver: received packets are consumed by the application.
    #[default]
    Rx,
    /// Plain transmitter.
    Tx,
    /// Received packets are buffered for forwarding and the ready flag is raised.
    Repeater,
}

/// Current direction of the half-duplex transceiver.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RadioState {
    /// Listening. A falling IRQ edge means "payload ready".
    #[default]
    Rx,
    /// Transmitting. A falling IRQ edge means "transmit complete".
    Tx,
}

/// Proof of a copy out of the [`ForwardBuffer`].
///
/// Hand it back to [`ForwardBuffer::release`] to clear the ready flag once the
/// copied payload has been dealt with.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Snapshot {
    /// Number of bytes copied.
    pub len: usize,
    generation: u16,
}

/// The ready flag plus the fixed-capacity payload it guards.
#[derive(Debug, Default)]
pub struct ForwardBuffer<const N: usize = FORWARD_BUF_LEN> {
    data: Vec<u8, N>,
    pending: bool,
    generation: u16,
    overwritten: u16,
}

impl<const N: usize> ForwardBuffer<N> {
    /// Creates an empty buffer with the flag clear.
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            pending: false,
            generation: 0,
            overwritten: 0,
        }
    }

    /// Stores a received payload and raises the ready flag.
    ///
    /// Interrupt side only. Replaces a still-pending payload.
    ///
    /// # Returns
    /// - `Ok(true)` when a pending payload was overwritten
    /// - `Ok(false)` when the buffer was free
    /// - `Err(BufferError::Overflow)` when `payload` is longer than `N`; the buffer is untouched
    pub fn store(&mut self, payload: &[u8]) -> Result<bool, BufferError> {
        if payload.len() > N {
            return Err(BufferError::Overflow {
                len: payload.len(),
                capacity: N,
            });
        }
        self.data.clear();
        // Length checked above.
        let _ = self.data.extend_from_slice(payload);
        let overwrote = self.pending;
        if overwrote {
            self.overwritten = self.overwritten.wrapping_add(1);
        }
        self.pending = true;
        self.generation = self.generation.wrapping_add(1);
        Ok(overwrote)
    }

    /// `true` while a payload is waiting to be forwarded.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Sets or clears the ready flag without touching the payload.
    pub fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    /// Copies the pending payload into `dest`.
    ///
    /// Main-loop side. Returns `None` and leaves `dest` untouched if nothing is
    /// pending.
    pub fn snapshot<const M: usize>(&self, dest: &mut Vec<u8, M>) -> Option<Snapshot> {
        if !self.pending {
            return None;
        }
        dest.clear();
        let len = self.data.len().min(M);
        let _ = dest.extend_from_slice(&self.data[..len]);
        Some(Snapshot {
            len,
            generation: self.generation,
        })
    }

    /// Clears the ready flag if nothing was stored since `snapshot` was taken.
    ///
    /// Returns `false` when a newer payload arrived in the meantime: it stays
    /// pending for the next cycle.
    pub fn release(&mut self, snapshot: Snapshot) -> bool {
        if self.generation == snapshot.generation {
            self.pending = false;
            true
        } else {
            false
        }
    }

    /// Copies the buffered bytes into `dest`, truncating to its length.
    ///
    /// Returns the number of bytes copied. Does not look at the ready flag.
    pub fn copy_to(&self, dest: &mut [u8]) -> usize {
        let len = self.data.len().min(dest.len());
        dest[..len].copy_from_slice(&self.data[..len]);
        len
    }

    /// Length of the buffered payload.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` when no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of pending payloads lost to a newer store (wrapping).
    pub fn overwritten(&self) -> u16 {
        self.overwritten
    }
}

/// The transceiver driver as seen by the repeater.
///
/// `isr_callback` runs in interrupt context; everything else runs from the main
/// loop. An implementation's `isr_callback` must only read the transceiver
/// status and FIFO, fill the forward buffer, and note transmit completion. It
/// must never change the radio state or start a transmit.
pub trait RadioLink {
    /// Driver error type.
    type Error: core::fmt::Debug;

    /// Powers up and configures the transceiver for `mode`.
    fn initialize(&mut self, mode: OperatingMode) -> Result<(), Self::Error>;

    /// The operating variant passed to [`initialize`](RadioLink::initialize).
    fn operating_mode(&self) -> OperatingMode;

    /// The current transceiver direction.
    fn state(&self) -> RadioState;

    /// Switches the transceiver direction.
    ///
    /// Switching may discard the transceiver's receive state, so copy the
    /// forward buffer out first.
    fn set_state(&mut self, state: RadioState) -> Result<(), Self::Error>;

    /// Loads `payload` for `destination` and starts sending it.
    fn start_transmit(&mut self, destination: u8, payload: &[u8]) -> Result<(), Self::Error>;

    /// Polls the transmit started by [`start_transmit`](RadioLink::start_transmit).
    ///
    /// `Err(nb::Error::WouldBlock)` while the hardware has not confirmed yet.
    fn poll_transmit(&mut self) -> nb::Result<(), Self::Error>;

    /// Gives up on an unconfirmed transmit and flushes it.
    fn abort_transmit(&mut self);

    /// Interrupt service routine for the IRQ line.
    fn isr_callback(&mut self);

    /// The ready flag and payload slot.
    fn forward_buffer(&self) -> &ForwardBuffer;

    /// Mutable access to the ready flag and payload slot.
    fn forward_buffer_mut(&mut self) -> &mut ForwardBuffer;

    /// Sends `payload` and waits for the hardware to confirm.
    ///
    /// Unbounded: only use it where the driver's own hardware timeout is
    /// trusted. The repeater uses the split calls with a tick deadline instead.
    fn transmit(&mut self, destination: u8, payload: &[u8]) -> Result<(), Self::Error> {
        self.start_transmit(destination, payload)?;
        nb::block!(self.poll_transmit())
    }

    /// `true` when a packet is buffered for forwarding.
    fn repeater_flag(&self) -> bool {
        self.forward_buffer().is_pending()
    }

    /// Sets or clears the ready flag.
    fn set_repeater_flag(&mut self, flag: bool) {
        self.forward_buffer_mut().set_pending(flag);
    }

    /// Copies the buffered payload into `dest` and returns its length.
    fn copy_buffered_payload(&self, dest: &mut [u8]) -> usize {
        self.forward_buffer().copy_to(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_sets_flag_and_copies() {
        let mut buf: ForwardBuffer = ForwardBuffer::new();
        assert!(!buf.is_pending());
        assert_eq!(buf.store(&[1, 2, 3]), Ok(false));
        assert!(buf.is_pending());
        assert_eq!(buf.len(), 3);

        let mut out = [0u8; 8];
        assert_eq!(buf.copy_to(&mut out), 3);
        assert_eq!(&out[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_second_store_overwrites_pending() {
        let mut buf: ForwardBuffer = ForwardBuffer::new();
        let _ = buf.store(b"first").unwrap();
        assert_eq!(buf.store(b"second"), Ok(true));
        assert_eq!(buf.overwritten(), 1);

        let mut scratch: Vec<u8, FORWARD_BUF_LEN> = Vec::new();
        let snap = buf.snapshot(&mut scratch).unwrap();
        assert_eq!(snap.len, 6);
        assert_eq!(scratch.as_slice(), b"second");
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut buf: ForwardBuffer<4> = ForwardBuffer::new();
        assert_eq!(
            buf.store(&[0; 5]),
            Err(BufferError::Overflow {
                len: 5,
                capacity: 4
            })
        );
        assert!(!buf.is_pending());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_snapshot_requires_pending() {
        let buf: ForwardBuffer = ForwardBuffer::new();
        let mut scratch: Vec<u8, FORWARD_BUF_LEN> = Vec::new();
        assert!(buf.snapshot(&mut scratch).is_none());
    }

    #[test]
    fn test_release_keeps_newer_payload() {
        let mut buf: ForwardBuffer = ForwardBuffer::new();
        let _ = buf.store(&[0xAA]).unwrap();
        let mut scratch: Vec<u8, FORWARD_BUF_LEN> = Vec::new();
        let snap = buf.snapshot(&mut scratch).unwrap();

        // Packet lands while the first one is being forwarded
        let _ = buf.store(&[0xBB]).unwrap();
        assert!(!buf.release(snap));
        assert!(buf.is_pending());

        let snap = buf.snapshot(&mut scratch).unwrap();
        assert_eq!(scratch.as_slice(), &[0xBB]);
        assert!(buf.release(snap));
        assert!(!buf.is_pending());
    }

    #[test]
    fn test_copy_truncates_to_destination() {
        let mut buf: ForwardBuffer = ForwardBuffer::new();
        let _ = buf.store(&[9, 8, 7, 6]).unwrap();
        let mut out = [0u8; 2];
        assert_eq!(buf.copy_to(&mut out), 2);
        assert_eq!(out, [9, 8]);
    }
}
