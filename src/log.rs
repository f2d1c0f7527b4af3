//! Logger backend agnostic logging.
//!
//! With the `log` feature the macros forward to the `log` crate, with `defmt-0-3`
//! they forward to `defmt`, and with neither they compile to nothing while still
//! evaluating (by reference) their arguments. Keep arguments to primitives so the
//! same format string is accepted by both backends.
//!
//! The warning macro is `log_warn`, since a macro named `warn` collides with the
//! builtin lint attribute; import it as `log_warn as warn`.

#[cfg(all(feature = "defmt-0-3", feature = "log"))]
compile_error!("Cannot select log and defmt-0-3 features together.");

macro_rules! log_backend {
    ($level:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "log")]
        ::log::$level!($fmt $(, $arg)*);
        #[cfg(feature = "defmt-0-3")]
        ::defmt::$level!($fmt $(, $arg)*);
        #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
        {
            $(let _ = &$arg;)*
        }
    }};
}

macro_rules! log_warn {
    ($($t:tt)*) => { $crate::log::log_backend!(warn, $($t)*) };
}

macro_rules! info {
    ($($t:tt)*) => { $crate::log::log_backend!(info, $($t)*) };
}

macro_rules! debug {
    ($($t:tt)*) => { $crate::log::log_backend!(debug, $($t)*) };
}

macro_rules! trace {
    ($($t:tt)*) => { $crate::log::log_backend!(trace, $($t)*) };
}

pub(crate) use {debug, info, log_backend, log_warn, trace};
