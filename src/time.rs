//! Monotonic timer used for frame pacing.
//!
//! Timer values are opaque ticks. Always divide by [`timer_frequency`] to get
//! seconds; the unit is not fixed.

use crate::platform_impl;

/// Ticks per second when the clock reports sub-second precision.
pub const MICROSECOND_FREQUENCY: u64 = 1_000_000;
/// Ticks per second adopted when the first clock sample reads exactly zero.
pub const NANOSECOND_FREQUENCY: u64 = 1_000_000_000;

lazy_static! {
    // Probed once. Later samples never change it, even if they would pick a
    // different unit.
    static ref TIMER_FREQUENCY: u64 = frequency_for_sample(platform_impl::monotonic_micros());
}

/// Picks the tick unit from a first raw clock sample.
///
/// A sample of exactly zero means the clock source only reports whole
/// seconds so far, and nanosecond ticks are used. Anything else selects
/// microsecond ticks.
pub fn frequency_for_sample(sample: u64) -> u64 {
    if sample == 0 {
        NANOSECOND_FREQUENCY
    } else {
        MICROSECOND_FREQUENCY
    }
}

/// Number of ticks in one second. Computed on first use and fixed for the
/// rest of the process.
#[inline]
pub fn timer_frequency() -> u64 {
    *TIMER_FREQUENCY
}

/// Current value of the monotonic timer, in ticks.
pub fn timer_value() -> u64 {
    let frequency = timer_frequency();
    let micros = platform_impl::monotonic_micros();
    micros * (frequency / MICROSECOND_FREQUENCY)
}

/// Handle to the process-wide monotonic timer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimeSource;

impl TimeSource {
    #[inline]
    pub fn now(&self) -> u64 {
        timer_value()
    }

    #[inline]
    pub fn frequency(&self) -> u64 {
        timer_frequency()
    }

    /// Seconds elapsed between two tick values read from this source.
    /// Returns a negative value if `end` precedes `start`.
    pub fn seconds_between(&self, start: u64, end: u64) -> f64 {
        let frequency = self.frequency() as f64;
        if end >= start {
            (end - start) as f64 / frequency
        } else {
            -((start - end) as f64 / frequency)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn zero_sample_selects_nanoseconds() {
        assert_eq!(frequency_for_sample(0), NANOSECOND_FREQUENCY);
        assert_eq!(frequency_for_sample(1), MICROSECOND_FREQUENCY);
        assert_eq!(frequency_for_sample(u64::max_value()), MICROSECOND_FREQUENCY);
    }

    #[test]
    fn frequency_is_memoized() {
        let first = timer_frequency();
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| (0..100).map(|_| timer_frequency()).collect::<Vec<_>>()))
            .collect();
        for handle in handles {
            for frequency in handle.join().unwrap() {
                assert_eq!(frequency, first);
            }
        }
        assert_eq!(TimeSource.frequency(), first);
    }

    #[test]
    fn timer_is_monotonic() {
        let source = TimeSource;
        let mut last = source.now();
        for _ in 0..1_000 {
            let now = source.now();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn seconds_between_divides_by_frequency() {
        let source = TimeSource;
        let frequency = source.frequency();
        assert_eq!(source.seconds_between(0, frequency * 2), 2.0);
        assert_eq!(source.seconds_between(frequency, 0), -1.0);
        assert_eq!(source.seconds_between(5, 5), 0.0);
    }
}
