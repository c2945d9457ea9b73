//! Capture-clock ticks.
//!
//! Observation sets and pose updates are stamped with the tick of the frame
//! they came from. Ticks count nanoseconds of a monotonic capture clock; the
//! pipeline never reads wall time itself.

/// Monotonic capture-clock timestamp in nanoseconds.
pub type Tick = u64;

/// Ticks per second of the capture clock.
pub const TICKS_PER_SECOND: Tick = 1_000_000_000;

/// Sentinel tick that force-sets a pose, bypassing smoothing and timing.
///
/// Used for static placement and manual relocation.
pub const FORCE_POSE: Tick = Tick::MAX;

/// How long after its last sighting an object is still worth displaying.
pub const DISPLAY_WINDOW: Tick = TICKS_PER_SECOND / 10;

/// Seconds elapsed from `earlier` to `later`, saturating at zero.
pub fn seconds_between(earlier: Tick, later: Tick) -> f64 {
    later.saturating_sub(earlier) as f64 / TICKS_PER_SECOND as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_between_saturates() {
        assert_eq!(seconds_between(5, 3), 0.0);
        assert_eq!(seconds_between(0, TICKS_PER_SECOND), 1.0);
        assert_eq!(seconds_between(0, DISPLAY_WINDOW), 0.1);
    }
}
