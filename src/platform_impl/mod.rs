//! Per-OS access to the monotonic clock.
//!
//! Every platform exposes `monotonic_micros()`: microseconds read from a clock
//! that never goes backwards and ignores wall-clock adjustments.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use self::unix::monotonic_micros;

#[cfg(not(unix))]
mod fallback;
#[cfg(not(unix))]
pub use self::fallback::monotonic_micros;
