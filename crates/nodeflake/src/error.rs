use core::num::ParseIntError;

/// A result type defaulting to the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `nodeflake` can produce.
///
/// Validation and configuration errors surface at construction time. At
/// runtime, a generator only fails when the wall clock cannot be encoded into
/// the 41-bit timestamp field or has moved backwards; sequence exhaustion is
/// always absorbed by waiting for the next millisecond.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The datacenter id does not fit in its bit field.
    #[error("datacenter id {value} is out of range, must be between 0 and {max}")]
    InvalidDatacenterId { value: u64, max: u64 },

    /// The worker id does not fit in its bit field.
    #[error("worker id {value} is out of range, must be between 0 and {max}")]
    InvalidWorkerId { value: u64, max: u64 },

    /// The wall clock reported a time earlier than the last issued timestamp.
    ///
    /// This is fatal for the call that observed it. The generator state is
    /// left untouched, so a caller that retries once the clock has caught up
    /// resumes where it left off.
    #[error("clock moved backwards: current timestamp {now} ms is before last used timestamp {last} ms")]
    ClockMovedBackwards { now: u64, last: u64 },

    /// The wall clock reported a time before the configured epoch.
    #[error("clock reads {now} ms which is before the epoch {epoch} ms")]
    ClockBeforeEpoch { now: u64, epoch: u64 },

    /// The time elapsed since the epoch no longer fits in the timestamp field.
    #[error("timestamp delta {delta} ms exceeds the maximum of {max} ms")]
    TimestampOverflow { delta: u64, max: u64 },

    /// The platform process name has a non-numeric prefix before `@`.
    #[error("cannot parse a process id from process name {name:?}")]
    InvalidProcessName { name: String },

    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    /// A string is not the decimal form of an id.
    #[error("invalid id: {0}")]
    ParseId(#[from] ParseIntError),

    /// A parsed value has the reserved top bit set.
    #[error("id {raw} sets the reserved sign bit")]
    ReservedBitSet { raw: u64 },

    /// The generator lock was poisoned by a thread that panicked while holding
    /// it. Not available with the `parking-lot` feature, whose mutexes do not
    /// poison.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
