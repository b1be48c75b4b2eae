use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default epoch: Monday, March 6, 2023 02:09:30.258 UTC
///
/// Every id stores its timestamp relative to this origin. Once ids have been
/// issued against an epoch it must never change; moving it backwards re-bases
/// future ids onto ranges that may already be taken.
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_678_068_570_258);

/// A trait for wall-clock sources.
///
/// The generator reads the clock on every call and while waiting for the next
/// millisecond, so a mock implementation can script arbitrary time sequences,
/// including rollbacks, without touching the real clock.
///
/// The unit is **milliseconds since the Unix epoch**. The generator subtracts
/// its own epoch before packing.
///
/// # Example
///
/// ```
/// use nodeflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_678_068_580_258
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1_678_068_580_258);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// The system wall clock.
///
/// Unlike a monotonic timer this follows NTP steps and manual adjustments,
/// which is exactly what rollback detection needs to observe. A clock set
/// before 1970 reads as `0`, which every generator rejects as being before its
/// epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_default_epoch() {
        let now = SystemClock.current_millis();
        assert!(now > DEFAULT_EPOCH.as_millis() as u64);
    }

    #[test]
    fn references_forward_to_the_clock() {
        let clock = std::sync::Arc::new(SystemClock);
        let by_ref = &clock;
        assert!(by_ref.current_millis() >= DEFAULT_EPOCH.as_millis() as u64);
    }
}
