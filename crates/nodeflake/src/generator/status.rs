use crate::SnowflakeId;

/// The outcome of a non-blocking generation attempt.
///
/// Returned by [`SnowflakeGenerator::poll_id`]:
///
/// - [`Poll::Ready`] carries a newly generated ID.
/// - [`Poll::Pending`] means all 4096 sequence values of the current
///   millisecond are taken and the caller should retry after `yield_for`
///   milliseconds.
///
/// [`SnowflakeGenerator::poll_id`]: crate::SnowflakeGenerator::poll_id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: SnowflakeId,
    },
    /// The sequence is exhausted for the current millisecond.
    Pending {
        /// Milliseconds to wait before trying again.
        yield_for: u64,
    },
}
