use core::{cmp::Ordering, time::Duration};

#[cfg(feature = "tracing")]
use tracing::{instrument, warn};

use crate::{
    Error, GeneratorConfig, NodeIdentity, Result, SnowflakeId, SystemClock, TimeSource,
    generator::{Mutex, MutexGuard, Poll},
};

/// Clock and sequence state of the last issued ID.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct State {
    /// Wall-clock millis of the last issued ID, `0` before the first one.
    last_timestamp: u64,
    sequence: u64,
}

/// A lock-based Snowflake ID generator, safe to share across threads.
///
/// The clock/sequence state sits behind a single [`Mutex`]. Every call reads
/// the clock, decides between "clock behind", "same millisecond" and "new
/// millisecond", and writes the new state while holding that lock, so two
/// threads can never observe the same `(timestamp, sequence)` pair.
///
/// When all 4096 sequence values of a millisecond are used, [`Self::next_id`]
/// spins on the [`TimeSource`] until the next millisecond *without* releasing
/// the lock. Other callers block for that time, which caps throughput at
/// 4096 IDs per millisecond per generator. Use [`Self::poll_id`] to get
/// [`Poll::Pending`] instead of spinning.
///
/// ## Recommended When
/// - Several threads share one generator (wrap it in an `Arc`)
/// - You need a hard error, not a silent wait, when the wall clock steps back
///
/// # Example
///
/// ```
/// use nodeflake::{SnowflakeGenerator, SystemClock};
///
/// let generator = SnowflakeGenerator::with_node_ids(1, 2, SystemClock).unwrap();
///
/// let a = generator.next_id().unwrap();
/// let b = generator.next_id().unwrap();
/// assert!(a < b);
/// assert_eq!(b.datacenter_id(), 1);
/// assert_eq!(b.worker_id(), 2);
/// ```
pub struct SnowflakeGenerator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<State>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<State>,
    identity: NodeIdentity,
    /// Epoch in milliseconds since 1970.
    epoch: u64,
    time: T,
}

impl<T> SnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator whose datacenter and worker IDs are both derived
    /// from the local host, using [`DEFAULT_EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns an error if the process ID cannot be resolved.
    ///
    /// [`DEFAULT_EPOCH`]: crate::DEFAULT_EPOCH
    pub fn new(time: T) -> Result<Self> {
        Self::from_config(&GeneratorConfig::default(), time)
    }

    /// Creates a generator with an explicit worker ID and a derived
    /// datacenter ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWorkerId`] if `worker_id` exceeds 31.
    pub fn with_worker_id(worker_id: u64, time: T) -> Result<Self> {
        Self::from_config(&GeneratorConfig::default().with_worker_id(worker_id), time)
    }

    /// Creates a generator with explicit datacenter and worker IDs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDatacenterId`] or [`Error::InvalidWorkerId`] if
    /// either value exceeds 31.
    pub fn with_node_ids(datacenter_id: u64, worker_id: u64, time: T) -> Result<Self> {
        let config = GeneratorConfig::default()
            .with_datacenter_id(datacenter_id)
            .with_worker_id(worker_id);
        Self::from_config(&config, time)
    }

    /// Creates a generator from a [`GeneratorConfig`], deriving whichever IDs
    /// it leaves unset.
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range IDs, or an error if the
    /// process ID cannot be resolved.
    pub fn from_config(config: &GeneratorConfig, time: T) -> Result<Self> {
        let identity = NodeIdentity::from_config(config)?;
        Ok(Self::from_identity(identity, config.epoch, time))
    }

    /// Creates a generator from an already-validated identity.
    pub fn from_identity(identity: NodeIdentity, epoch: Duration, time: T) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(State::default())),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(State::default()),
            identity,
            epoch: epoch.as_millis() as u64,
            time,
        }
    }

    /// Returns the node identity embedded in every ID.
    pub const fn identity(&self) -> NodeIdentity {
        self.identity
    }

    /// Returns the datacenter ID.
    pub const fn datacenter_id(&self) -> u64 {
        self.identity.datacenter_id()
    }

    /// Returns the worker ID.
    pub const fn worker_id(&self) -> u64 {
        self.identity.worker_id()
    }

    /// Returns the epoch timestamps are measured from.
    pub const fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch)
    }

    /// Generates the next ID, blocking through sequence exhaustion.
    ///
    /// IDs from one generator are strictly increasing in call order. If the
    /// 4096 sequence values of the current millisecond are used up, this
    /// busy-waits for the clock to advance while holding the lock.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockMovedBackwards`] if the clock reads earlier than the
    ///   last issued timestamp, either on entry or while waiting. No ID is
    ///   produced and the state is left unchanged.
    /// - [`Error::ClockBeforeEpoch`] or [`Error::TimestampOverflow`] if the
    ///   time cannot be encoded in 41 bits.
    /// - [`Error::LockPoisoned`] if another thread panicked while holding the
    ///   lock (std mutex only).
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut state = self.lock()?;
        let mut now = self.time.current_millis();

        let sequence = match now.cmp(&state.last_timestamp) {
            Ordering::Equal => {
                let sequence = (state.sequence + 1) & SnowflakeId::SEQUENCE_MASK;
                if sequence == 0 {
                    now = self.wait_next_millis(state.last_timestamp)?;
                }
                sequence
            }
            Ordering::Greater => 0,
            Ordering::Less => return Err(Self::cold_clock_behind(now, state.last_timestamp)),
        };

        let id = self.pack(now, sequence)?;
        *state = State {
            last_timestamp: now,
            sequence,
        };
        Ok(id)
    }

    /// Generates the next ID as a decimal string.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    pub fn next_id_string(&self) -> Result<String> {
        self.next_id().map(|id| id.to_string())
    }

    /// Attempts to generate the next ID without waiting.
    ///
    /// Returns [`Poll::Pending`] when the sequence is exhausted for the
    /// current millisecond instead of spinning.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    ///
    /// # Example
    ///
    /// ```
    /// use nodeflake::{Poll, SnowflakeGenerator, SystemClock};
    ///
    /// let generator = SnowflakeGenerator::with_node_ids(0, 0, SystemClock).unwrap();
    ///
    /// let id = loop {
    ///     match generator.poll_id().unwrap() {
    ///         Poll::Ready { id } => break id,
    ///         Poll::Pending { .. } => std::thread::yield_now(),
    ///     }
    /// };
    /// assert_eq!(id.sequence(), 0);
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<Poll> {
        let mut state = self.lock()?;
        let now = self.time.current_millis();

        let sequence = match now.cmp(&state.last_timestamp) {
            Ordering::Equal => {
                if state.sequence < SnowflakeId::MAX_SEQUENCE {
                    state.sequence + 1
                } else {
                    return Ok(Poll::Pending { yield_for: 1 });
                }
            }
            Ordering::Greater => 0,
            Ordering::Less => return Err(Self::cold_clock_behind(now, state.last_timestamp)),
        };

        let id = self.pack(now, sequence)?;
        *state = State {
            last_timestamp: now,
            sequence,
        };
        Ok(Poll::Ready { id })
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }

    /// Spins until the clock passes `last`.
    fn wait_next_millis(&self, last: u64) -> Result<u64> {
        loop {
            let now = self.time.current_millis();
            match now.cmp(&last) {
                Ordering::Greater => break Ok(now),
                Ordering::Equal => core::hint::spin_loop(),
                Ordering::Less => break Err(Self::cold_clock_behind(now, last)),
            }
        }
    }

    fn pack(&self, now: u64, sequence: u64) -> Result<SnowflakeId> {
        let delta = now.checked_sub(self.epoch).ok_or(Error::ClockBeforeEpoch {
            now,
            epoch: self.epoch,
        })?;
        if delta > SnowflakeId::MAX_TIMESTAMP {
            return Err(Error::TimestampOverflow {
                delta,
                max: SnowflakeId::MAX_TIMESTAMP,
            });
        }
        Ok(SnowflakeId::from_components(
            delta,
            self.identity.datacenter_id(),
            self.identity.worker_id(),
            sequence,
        ))
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        #[cfg(feature = "tracing")]
        warn!(now, last, behind_ms = last - now, "clock moved backwards");
        Error::ClockMovedBackwards { now, last }
    }
}
