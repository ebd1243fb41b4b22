use instant::Instant;

lazy_static! {
    static ref EPOCH: Instant = Instant::now();
}

// `Instant` is opaque, so ticks are measured from the first time the clock is
// read. One microsecond is added so the very first sample is never zero.
pub fn monotonic_micros() -> u64 {
    let epoch = *EPOCH;
    let elapsed = Instant::now().duration_since(epoch);
    elapsed.as_secs() * 1_000_000 + u64::from(elapsed.subsec_micros()) + 1
}
