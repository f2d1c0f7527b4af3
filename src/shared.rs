//! Interrupt-safe cells for state shared between the main loop and handlers.
//!
//! A [`Shared`] wraps `critical_section::Mutex<RefCell<Option<T>>>`, the same
//! shape used for a global driver singleton, and exposes closure-based access so
//! a borrow can never outlive its critical section.

use core::cell::RefCell;
use critical_section::Mutex;

/// A peripheral or driver reachable from both interrupt and main-loop context.
///
/// The cell starts empty so it can be declared as a `static` and filled once the
/// hardware has been configured in `main()`.
///
/// # Example
/// ```rust
/// use radio_repeater::shared::Shared;
///
/// static COUNTER: Shared<u32> = Shared::new();
///
/// COUNTER.install(0);
/// COUNTER.with(|c| *c += 1);
/// assert_eq!(COUNTER.with(|c| *c), Some(1));
/// ```
#[derive(Debug)]
pub struct Shared<T> {
    inner: Mutex<RefCell<Option<T>>>,
}

impl<T> Shared<T> {
    /// Creates an empty cell.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Stores `value`, returning any value previously installed.
    pub fn install(&self, value: T) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(value))
    }

    /// Removes and returns the installed value.
    pub fn take(&self) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    /// Returns `true` once a value has been installed.
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    /// Runs `f` on the installed value inside a critical section.
    ///
    /// Returns `None` without calling `f` if the cell is empty. Keep `f` short:
    /// interrupts are held off for its whole duration.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        critical_section::with(|cs| self.with_cs(cs, f))
    }

    /// Like [`Shared::with`], for callers already inside a critical section.
    pub fn with_cs<R>(
        &self,
        cs: critical_section::CriticalSection<'_>,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        self.inner.borrow_ref_mut(cs).as_mut().map(f)
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::new()
    }
}
