use core::time::Duration;
use std::env;

use crate::{DEFAULT_EPOCH, Error, Result};

/// Environment variable holding an explicit datacenter ID.
pub const ENV_DATACENTER_ID: &str = "NODEFLAKE_DATACENTER_ID";
/// Environment variable holding an explicit worker ID.
pub const ENV_WORKER_ID: &str = "NODEFLAKE_WORKER_ID";
/// Environment variable holding the epoch in milliseconds since 1970.
pub const ENV_EPOCH_MILLIS: &str = "NODEFLAKE_EPOCH_MILLIS";

/// Construction options for a [`SnowflakeGenerator`].
///
/// IDs left as `None` are derived from the local host when the generator is
/// built (see [`NodeIdentity::from_config`]).
///
/// ```
/// use nodeflake::GeneratorConfig;
///
/// let config = GeneratorConfig::default().with_worker_id(3);
/// assert_eq!(config.datacenter_id, None);
/// assert_eq!(config.worker_id, Some(3));
/// ```
///
/// [`SnowflakeGenerator`]: crate::SnowflakeGenerator
/// [`NodeIdentity::from_config`]: crate::NodeIdentity::from_config
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Explicit datacenter ID (0..=31).
    pub datacenter_id: Option<u64>,
    /// Explicit worker ID (0..=31).
    pub worker_id: Option<u64>,
    /// Origin of the timestamp field.
    pub epoch: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            datacenter_id: None,
            worker_id: None,
            epoch: DEFAULT_EPOCH,
        }
    }
}

impl GeneratorConfig {
    /// Reads the configuration from `NODEFLAKE_DATACENTER_ID`,
    /// `NODEFLAKE_WORKER_ID` and `NODEFLAKE_EPOCH_MILLIS`. Unset or empty
    /// variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a variable is set to something other
    /// than a decimal integer.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Self::from_env`] but reads variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a value is not a decimal integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let parse = |key: &'static str| -> Result<Option<u64>> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => value
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| Error::InvalidConfig { key, value }),
                _ => Ok(None),
            }
        };

        Ok(Self {
            datacenter_id: parse(ENV_DATACENTER_ID)?,
            worker_id: parse(ENV_WORKER_ID)?,
            epoch: parse(ENV_EPOCH_MILLIS)?.map_or(DEFAULT_EPOCH, Duration::from_millis),
        })
    }

    /// Sets an explicit datacenter ID.
    #[must_use]
    pub fn with_datacenter_id(mut self, datacenter_id: u64) -> Self {
        self.datacenter_id = Some(datacenter_id);
        self
    }

    /// Sets an explicit worker ID.
    #[must_use]
    pub fn with_worker_id(mut self, worker_id: u64) -> Self {
        self.worker_id = Some(worker_id);
        self
    }

    /// Sets the epoch.
    #[must_use]
    pub fn with_epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch;
        self
    }
}
