//! Internal logging seam
//!
//! The crate logs through two macros, `debug!` and `error!`. With the `defmt`
//! feature they expand to the `defmt` macros of the same name; with the `log`
//! feature (and `defmt` off) they expand to the `log` crate instead. With
//! neither feature enabled they compile to nothing, only borrowing their
//! arguments so no unused-variable warnings leak into callers.
//!
//! Format strings must stay within the subset both backends understand:
//! plain `{}` and the `{:#x}` hex hint.

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { ::defmt::debug!($($arg)*) };
}

#[cfg(feature = "defmt")]
macro_rules! error {
    ($($arg:tt)*) => { ::defmt::error!($($arg)*) };
}

#[cfg(all(feature = "log", not(feature = "defmt")))]
macro_rules! debug {
    ($($arg:tt)*) => { ::log::debug!($($arg)*) };
}

#[cfg(all(feature = "log", not(feature = "defmt")))]
macro_rules! error {
    ($($arg:tt)*) => { ::log::error!($($arg)*) };
}

#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $( let _ = &$arg; )*
    }};
}

#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! error {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $( let _ = &$arg; )*
    }};
}

pub(crate) use debug;
pub(crate) use error;
