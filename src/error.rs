//! Error types for the forward buffer and the repeater cycle.
//!
//! Timing drift and packets lost to last-write-wins are deliberately absent:
//! neither is a fault. Drift is reported by [`crate::timer::drift_ppm`] and lost
//! packets are counted by [`crate::radio::ForwardBuffer::overwritten`].

use thiserror::Error;

/// Errors raised when storing a payload into the forward buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The payload does not fit into the fixed-capacity buffer.
    #[error("payload of {len} bytes exceeds the {capacity} byte forward buffer")]
    Overflow {
        /// Length of the rejected payload.
        len: usize,
        /// Capacity of the buffer.
        capacity: usize,
    },
}

/// Errors reported by a forward cycle of the [`Repeater`](crate::repeater::Repeater).
///
/// None of these leave the repeater in the forwarding state: by the time one is
/// returned the radio is back in receive mode and the ready flag is handled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepeaterError<E> {
    /// The radio driver reported an error.
    #[error("radio error: {0:?}")]
    Radio(E),
    /// The radio did not confirm the transmit within the configured bound.
    #[error("transmit not confirmed after {ticks} ticks")]
    TransmitTimeout {
        /// The bound that expired.
        ticks: u32,
    },
    /// No radio has been installed into the shared cell yet.
    #[error("radio not installed")]
    NotStarted,
}

impl<E> RepeaterError<E> {
    /// Returns `true` for a transmit that was abandoned after its time bound.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RepeaterError::TransmitTimeout { .. })
    }
}
