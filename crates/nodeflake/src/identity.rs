//! Node identity derivation.
//!
//! A generator is identified by a `(datacenter_id, worker_id)` pair. When the
//! caller does not supply them, both are derived from local signals:
//!
//! - the datacenter ID from the last two octets of a local hardware (MAC)
//!   address, falling back to `1` when none can be read;
//! - the worker ID from an FNV-1a hash over the decimal digits of the
//!   datacenter ID followed by the process ID.
//!
//! These are best-effort heuristics. Two processes on hosts whose hardware
//! addresses share the relevant bits, and whose process IDs hash alike, will
//! collide. Deployments that need a guarantee should assign both IDs
//! explicitly.

use core::fmt;

#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

use crate::{Error, GeneratorConfig, Result, SnowflakeId};

/// FNV-1a 32-bit offset basis.
const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
/// FNV-1a 32-bit prime.
const FNV_PRIME: u32 = 0x0100_0193;

/// Datacenter ID used when no hardware address is available.
pub const FALLBACK_DATACENTER_ID: u64 = 1;

/// Hashes `bytes` with 32-bit FNV-1a.
///
/// ```
/// assert_eq!(nodeflake::fnv1a_32(b""), 0x811c_9dc5);
/// assert_eq!(nodeflake::fnv1a_32(b"a"), 0xe40c_292c);
/// ```
pub const fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// The identifier of the current process, as used to seed the worker ID.
///
/// This is not guaranteed unique across hosts; it only spreads workers on the
/// same host across the worker ID space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Wraps a known process ID.
    pub const fn new(pid: u32) -> Self {
        Self(pid)
    }

    /// Resolves the current process ID from the platform process name
    /// (`"<pid>@<hostname>"`).
    ///
    /// Call this once during startup and pass the value down.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProcessName`] if the name cannot be parsed.
    pub fn resolve() -> Result<Self> {
        Self::from_process_name(&process_name())
    }

    /// Parses a process name of the form `"<pid>@<host>"`.
    ///
    /// - a blank name yields `0`;
    /// - a name with `@` after at least one character yields the decimal
    ///   prefix;
    /// - any other name yields its FNV-1a hash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProcessName`] when the prefix before `@` is not
    /// a decimal number.
    ///
    /// # Example
    ///
    /// ```
    /// use nodeflake::ProcessId;
    ///
    /// assert_eq!(ProcessId::from_process_name("4242@build-01").unwrap().get(), 4242);
    /// assert_eq!(ProcessId::from_process_name("   ").unwrap().get(), 0);
    /// ```
    pub fn from_process_name(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Ok(Self(0));
        }

        match name.find('@') {
            Some(index) if index > 0 => name[..index]
                .parse()
                .map(Self)
                .map_err(|_| Error::InvalidProcessName {
                    name: name.to_owned(),
                }),
            _ => Ok(Self(fnv1a_32(name.as_bytes()))),
        }
    }

    /// Returns the numeric value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds the platform process name, `"<pid>@<hostname>"`.
fn process_name() -> String {
    let host = std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| String::from("localhost"));
    format!("{}@{}", std::process::id(), host)
}

/// Reads the hardware address of a local network interface.
///
/// Lookup failures are expected on hosts without a usable interface (some
/// containers, sandboxes) and are reported as `None`.
fn local_hardware_address() -> Option<[u8; 6]> {
    match mac_address::get_mac_address() {
        Ok(Some(mac)) => Some(mac.bytes()),
        Ok(None) => {
            #[cfg(feature = "tracing")]
            debug!("no local hardware address found");
            None
        }
        Err(_e) => {
            #[cfg(feature = "tracing")]
            debug!(error = %_e, "hardware address lookup failed");
            None
        }
    }
}

/// Derives a datacenter ID from a hardware address.
///
/// The top two bits of the second-to-last octet and the whole last octet are
/// combined (`(mac[len-2] | mac[len-1] << 8) >> 6`) and reduced modulo
/// `max + 1`. Without an address of at least two octets, or with `max == 0`,
/// the result is [`FALLBACK_DATACENTER_ID`]. A `max` of `u64::MAX` is treated
/// as `u64::MAX - 1` so that `max + 1` cannot overflow.
///
/// # Example
///
/// ```
/// use nodeflake::datacenter_id_from_hardware_address;
///
/// let mac = [0x00, 0x1a, 0x2b, 0x3c, 0x12, 0x34];
/// assert_eq!(datacenter_id_from_hardware_address(Some(&mac), 31), 16);
/// assert_eq!(datacenter_id_from_hardware_address(None, 31), 1);
/// ```
pub fn datacenter_id_from_hardware_address(mac: Option<&[u8]>, max: u64) -> u64 {
    let max = if max == u64::MAX { max - 1 } else { max };

    match mac {
        Some(mac) if max > 0 && mac.len() >= 2 => {
            let low = u64::from(mac[mac.len() - 2]);
            let high = u64::from(mac[mac.len() - 1]) << 8;
            ((low | high) >> 6) % (max + 1)
        }
        _ => FALLBACK_DATACENTER_ID,
    }
}

/// Derives a datacenter ID in `0..=max` from the local hardware address.
///
/// Never fails: an unreadable address falls back to
/// [`FALLBACK_DATACENTER_ID`].
#[cfg_attr(feature = "tracing", instrument(level = "debug"))]
pub fn resolve_datacenter_id(max: u64) -> u64 {
    let mac = local_hardware_address();
    datacenter_id_from_hardware_address(mac.as_ref().map(<[u8; 6]>::as_slice), max)
}

/// Derives a worker ID in `0..=max` from the datacenter ID and process ID.
///
/// The decimal digits of `datacenter_id` followed by those of `process_id`
/// are hashed with [`fnv1a_32`], masked to the low 16 bits and reduced modulo
/// `max + 1`. The result is a pure function of its inputs.
///
/// # Example
///
/// ```
/// use nodeflake::{ProcessId, resolve_worker_id};
///
/// let a = resolve_worker_id(1, ProcessId::new(4242), 31);
/// let b = resolve_worker_id(1, ProcessId::new(4242), 31);
/// assert_eq!(a, b);
/// assert!(a <= 31);
/// ```
pub fn resolve_worker_id(datacenter_id: u64, process_id: ProcessId, max: u64) -> u64 {
    let key = format!("{datacenter_id}{process_id}");
    let hash = u64::from(fnv1a_32(key.as_bytes()) & 0xFFFF);
    hash % max.saturating_add(1)
}

/// The `(datacenter_id, worker_id)` pair embedded in every ID a generator
/// emits.
///
/// Both values are validated against the layout on construction and are
/// immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    datacenter_id: u64,
    worker_id: u64,
}

impl NodeIdentity {
    /// Creates an identity from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDatacenterId`] or [`Error::InvalidWorkerId`] if
    /// either value exceeds 31.
    pub fn new(datacenter_id: u64, worker_id: u64) -> Result<Self> {
        if datacenter_id > SnowflakeId::MAX_DATACENTER_ID {
            return Err(Error::InvalidDatacenterId {
                value: datacenter_id,
                max: SnowflakeId::MAX_DATACENTER_ID,
            });
        }
        if worker_id > SnowflakeId::MAX_WORKER_ID {
            return Err(Error::InvalidWorkerId {
                value: worker_id,
                max: SnowflakeId::MAX_WORKER_ID,
            });
        }
        Ok(Self {
            datacenter_id,
            worker_id,
        })
    }

    /// Derives both IDs from the local host.
    ///
    /// # Errors
    ///
    /// Returns an error if the process ID cannot be resolved.
    pub fn resolve() -> Result<Self> {
        let datacenter_id = resolve_datacenter_id(SnowflakeId::MAX_DATACENTER_ID);
        Self::with_datacenter_id(datacenter_id)
    }

    /// Uses the given worker ID and derives the datacenter ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWorkerId`] if `worker_id` exceeds 31.
    pub fn with_worker_id(worker_id: u64) -> Result<Self> {
        let datacenter_id = resolve_datacenter_id(SnowflakeId::MAX_DATACENTER_ID);
        Self::new(datacenter_id, worker_id)
    }

    /// Uses the given datacenter ID and derives the worker ID from it and the
    /// current process ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDatacenterId`] if `datacenter_id` exceeds 31, or
    /// an error if the process ID cannot be resolved.
    pub fn with_datacenter_id(datacenter_id: u64) -> Result<Self> {
        let process_id = ProcessId::resolve()?;
        Self::derive(datacenter_id, process_id)
    }

    /// Uses the given datacenter ID and derives the worker ID from it and an
    /// already-resolved process ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDatacenterId`] if `datacenter_id` exceeds 31.
    pub fn derive(datacenter_id: u64, process_id: ProcessId) -> Result<Self> {
        let worker_id = resolve_worker_id(datacenter_id, process_id, SnowflakeId::MAX_WORKER_ID);
        #[cfg(feature = "tracing")]
        debug!(datacenter_id, worker_id, %process_id, "derived node identity");
        Self::new(datacenter_id, worker_id)
    }

    /// Resolves the identity described by a [`GeneratorConfig`]: explicit
    /// values are validated, missing values are derived.
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range values, or an error if the
    /// process ID cannot be resolved.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        match (config.datacenter_id, config.worker_id) {
            (Some(datacenter_id), Some(worker_id)) => Self::new(datacenter_id, worker_id),
            (None, Some(worker_id)) => Self::with_worker_id(worker_id),
            (Some(datacenter_id), None) => Self::with_datacenter_id(datacenter_id),
            (None, None) => Self::resolve(),
        }
    }

    /// Returns the datacenter ID.
    pub const fn datacenter_id(&self) -> u64 {
        self.datacenter_id
    }

    /// Returns the worker ID.
    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }
}
