//! Logging shims.
//!
//! `trace!`, `debug!`, `warn!` and `error!` forward to `defmt` when the
//! `defmt` feature is enabled, to `log` when the `log` feature is enabled, and
//! expand to nothing (while still borrowing their arguments) otherwise.
#![allow(unused_macros)]

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        macro_rules! trace {
            ($($arg:tt)*) => { ::defmt::trace!($($arg)*) };
        }
        macro_rules! debug {
            ($($arg:tt)*) => { ::defmt::debug!($($arg)*) };
        }
        macro_rules! warn {
            ($($arg:tt)*) => { ::defmt::warn!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { ::defmt::error!($($arg)*) };
        }
    } else if #[cfg(feature = "log")] {
        macro_rules! trace {
            ($($arg:tt)*) => { ::log::trace!($($arg)*) };
        }
        macro_rules! debug {
            ($($arg:tt)*) => { ::log::debug!($($arg)*) };
        }
        macro_rules! warn {
            ($($arg:tt)*) => { ::log::warn!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { ::log::error!($($arg)*) };
        }
    } else {
        macro_rules! trace {
            ($s:literal $(, $x:expr)* $(,)?) => {{ $( let _ = &$x; )* }};
        }
        macro_rules! debug {
            ($s:literal $(, $x:expr)* $(,)?) => {{ $( let _ = &$x; )* }};
        }
        macro_rules! warn {
            ($s:literal $(, $x:expr)* $(,)?) => {{ $( let _ = &$x; )* }};
        }
        macro_rules! error {
            ($s:literal $(, $x:expr)* $(,)?) => {{ $( let _ = &$x; )* }};
        }
    }
}
