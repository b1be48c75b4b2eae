use core::{fmt, str::FromStr, time::Duration};

use crate::{Error, Result};

/// A 64-bit Snowflake ID
///
/// - 1 bit reserved (always zero, so the value is also a non-negative `i64`)
/// - 41 bits timestamp (ms since the generator epoch)
/// - 5 bits datacenter ID
/// - 5 bits worker ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21              17 16          12 11             0
///              +--------------+----------------+------------------+--------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | datacenter ID (5)| worker ID (5)| sequence (12) |
///              +--------------+----------------+------------------+--------------+---------------+
///              |<------------------- MSB ------------ 64 bits ------------ LSB ------------------>|
/// ```
///
/// # Example
///
/// ```
/// use nodeflake::SnowflakeId;
///
/// let id = SnowflakeId::from_components(10_000, 1, 2, 0);
/// assert_eq!(id.to_raw(), (10_000 << 22) | (1 << 17) | (2 << 12));
/// assert_eq!(id.datacenter_id(), 1);
/// assert_eq!(id.worker_id(), 2);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u64", into = "u64"))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Number of bits in the timestamp field.
    pub const TIMESTAMP_BITS: u32 = 41;

    /// Number of bits in the datacenter ID field.
    pub const DATACENTER_ID_BITS: u32 = 5;

    /// Number of bits in the worker ID field.
    pub const WORKER_ID_BITS: u32 = 5;

    /// Number of bits in the sequence field.
    pub const SEQUENCE_BITS: u32 = 12;

    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;

    /// Bitmask for extracting the 5-bit datacenter ID field. Occupies bits 17
    /// through 21.
    pub const DATACENTER_ID_MASK: u64 = (1 << Self::DATACENTER_ID_BITS) - 1;

    /// Bitmask for extracting the 5-bit worker ID field. Occupies bits 12
    /// through 16.
    pub const WORKER_ID_MASK: u64 = (1 << Self::WORKER_ID_BITS) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

    /// Number of bits to shift the worker ID to its position (bit 12).
    pub const WORKER_ID_SHIFT: u32 = Self::SEQUENCE_BITS;

    /// Number of bits to shift the datacenter ID to its position (bit 17).
    pub const DATACENTER_ID_SHIFT: u32 = Self::WORKER_ID_SHIFT + Self::WORKER_ID_BITS;

    /// Number of bits to shift the timestamp to its position (bit 22).
    pub const TIMESTAMP_SHIFT: u32 = Self::DATACENTER_ID_SHIFT + Self::DATACENTER_ID_BITS;

    /// Largest datacenter ID that fits the layout.
    pub const MAX_DATACENTER_ID: u64 = Self::DATACENTER_ID_MASK;

    /// Largest worker ID that fits the layout.
    pub const MAX_WORKER_ID: u64 = Self::WORKER_ID_MASK;

    /// Largest sequence value; the 4097th ID in a millisecond must wait.
    pub const MAX_SEQUENCE: u64 = Self::SEQUENCE_MASK;

    /// Largest encodable timestamp delta, roughly 69 years past the epoch.
    pub const MAX_TIMESTAMP: u64 = Self::TIMESTAMP_MASK;

    /// Packs the components into an ID. Each component is masked to its field
    /// width, so out-of-range input cannot bleed into a neighbouring field.
    pub const fn from_components(
        timestamp: u64,
        datacenter_id: u64,
        worker_id: u64,
        sequence: u64,
    ) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let datacenter_id =
            (datacenter_id & Self::DATACENTER_ID_MASK) << Self::DATACENTER_ID_SHIFT;
        let worker_id = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let sequence = sequence & Self::SEQUENCE_MASK;
        Self {
            id: timestamp | datacenter_id | worker_id | sequence,
        }
    }

    /// Wraps a raw value. The reserved top bit is cleared.
    pub const fn from_raw(raw: u64) -> Self {
        Self {
            id: raw & (u64::MAX >> 1),
        }
    }

    /// Returns the raw 64-bit value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Returns the value as a signed integer. Always non-negative because the
    /// reserved bit is never set.
    pub const fn to_i64(&self) -> i64 {
        self.id as i64
    }

    /// Extracts the milliseconds elapsed between the epoch and generation.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the datacenter ID.
    pub const fn datacenter_id(&self) -> u64 {
        (self.id >> Self::DATACENTER_ID_SHIFT) & Self::DATACENTER_ID_MASK
    }

    /// Extracts the worker ID.
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence number.
    pub const fn sequence(&self) -> u64 {
        self.id & Self::SEQUENCE_MASK
    }

    /// Returns the generation time in milliseconds since the Unix epoch, given
    /// the epoch the ID was generated against.
    pub const fn unix_millis(&self, epoch: Duration) -> u64 {
        self.timestamp() + epoch.as_millis() as u64
    }

    /// Returns the ID as a zero-padded 19-digit string, the width of
    /// `i64::MAX`, so padded IDs sort lexicographically.
    pub fn to_padded_string(&self) -> String {
        format!("{:019}", self.id)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("id", &format_args!("0x{:016x} ({})", self.id, self.id))
            .field("timestamp", &self.timestamp())
            .field("datacenter_id", &self.datacenter_id())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl FromStr for SnowflakeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw: u64 = s.trim().parse()?;
        Self::try_from(raw)
    }
}

impl TryFrom<u64> for SnowflakeId {
    type Error = Error;

    fn try_from(raw: u64) -> Result<Self> {
        if raw > i64::MAX as u64 {
            return Err(Error::ReservedBitSet { raw });
        }
        Ok(Self { id: raw })
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl From<SnowflakeId> for i64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_i64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_EPOCH;

    #[test]
    fn layout_constants() {
        assert_eq!(SnowflakeId::TIMESTAMP_SHIFT, 22);
        assert_eq!(SnowflakeId::DATACENTER_ID_SHIFT, 17);
        assert_eq!(SnowflakeId::WORKER_ID_SHIFT, 12);
        assert_eq!(SnowflakeId::MAX_DATACENTER_ID, 31);
        assert_eq!(SnowflakeId::MAX_WORKER_ID, 31);
        assert_eq!(SnowflakeId::MAX_SEQUENCE, 4095);
        assert_eq!(SnowflakeId::MAX_TIMESTAMP, (1 << 41) - 1);
    }

    #[test]
    fn fields_and_bounds() {
        let ts = SnowflakeId::MAX_TIMESTAMP;
        let dc = SnowflakeId::MAX_DATACENTER_ID;
        let worker = SnowflakeId::MAX_WORKER_ID;
        let seq = SnowflakeId::MAX_SEQUENCE;

        let id = SnowflakeId::from_components(ts, dc, worker, seq);
        assert_eq!(id.timestamp(), ts);
        assert_eq!(id.datacenter_id(), dc);
        assert_eq!(id.worker_id(), worker);
        assert_eq!(id.sequence(), seq);
        assert_eq!(id.to_raw(), u64::MAX >> 1);
        assert_eq!(id.to_i64(), i64::MAX);
    }

    #[test]
    fn oversized_components_do_not_bleed() {
        let id = SnowflakeId::from_components(0, 32, 32, 4096);
        assert_eq!(id.to_raw(), 0);
    }

    #[test]
    fn unix_millis_adds_epoch_back() {
        let id = SnowflakeId::from_components(10_000, 1, 2, 0);
        assert_eq!(id.unix_millis(DEFAULT_EPOCH), 1_678_068_580_258);
    }

    #[test]
    fn display_and_parse() {
        let id = SnowflakeId::from_components(10_000, 1, 2, 3);
        let text = id.to_string();
        assert_eq!(text, ((10_000u64 << 22) | (1 << 17) | (2 << 12) | 3).to_string());
        assert_eq!(text.parse::<SnowflakeId>().unwrap(), id);
        assert_eq!(id.to_padded_string().len(), 19);
        assert!(id.to_padded_string().ends_with(&text));
    }

    #[test]
    fn parse_rejects_garbage_and_negatives() {
        assert!(matches!("abc".parse::<SnowflakeId>(), Err(Error::ParseId(_))));
        assert!(matches!("-1".parse::<SnowflakeId>(), Err(Error::ParseId(_))));
        assert_eq!(
            "9223372036854775808".parse::<SnowflakeId>(),
            Err(Error::ReservedBitSet {
                raw: 9_223_372_036_854_775_808
            })
        );
    }

    #[test]
    fn from_raw_clears_reserved_bit() {
        let id = SnowflakeId::from_raw(u64::MAX);
        assert!(id.to_i64() >= 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_the_integer_form() {
        let id = SnowflakeId::from_components(10_000, 1, 2, 3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, id.to_raw().to_string());
        assert_eq!(serde_json::from_str::<SnowflakeId>(&json).unwrap(), id);
        assert!(serde_json::from_str::<SnowflakeId>("18446744073709551615").is_err());
    }

    #[test]
    fn debug_lists_fields() {
        let id = SnowflakeId::from_components(7, 1, 2, 3);
        let debug = format!("{id:?}");
        assert!(debug.contains("timestamp: 7"));
        assert!(debug.contains("datacenter_id: 1"));
        assert!(debug.contains("worker_id: 2"));
        assert!(debug.contains("sequence: 3"));
    }
}
