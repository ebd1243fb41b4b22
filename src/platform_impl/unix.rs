use std::io;
use std::mem;

/// Reads `CLOCK_MONOTONIC`.
///
/// Time is foundational: if the kernel refuses to report it there is nothing
/// sensible left to do, so this panics instead of returning an error.
pub fn monotonic_micros() -> u64 {
    let mut ts: libc::timespec = unsafe { mem::zeroed() };
    let ret = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
    if ret != 0 {
        panic!(
            "clock_gettime(CLOCK_MONOTONIC) failed: {}",
            io::Error::last_os_error(),
        );
    }
    ts.tv_sec as u64 * 1_000_000 + ts.tv_nsec as u64 / 1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_goes_backwards() {
        let mut last = monotonic_micros();
        for _ in 0..1_000 {
            let now = monotonic_micros();
            assert!(now >= last);
            last = now;
        }
    }
}
