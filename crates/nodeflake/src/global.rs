//! Process-wide ID generation.
//!
//! A single [`SnowflakeGenerator`] is built on first use from
//! [`GeneratorConfig::from_env`] and the [`SystemClock`], then shared by every
//! caller in the process.
//!
//! # Example
//! ```rust
//! let id = nodeflake::next_id().unwrap();
//! let text = nodeflake::next_id_string().unwrap();
//! assert!(text.parse::<u64>().unwrap() > id.to_raw());
//! ```

use std::sync::OnceLock;

use crate::{GeneratorConfig, Result, SnowflakeGenerator, SnowflakeId, SystemClock};

static GLOBAL_GENERATOR: OnceLock<SnowflakeGenerator<SystemClock>> = OnceLock::new();

/// Returns the process-wide generator, building it on first use.
///
/// # Errors
///
/// Returns an error if the environment configuration is invalid or the node
/// identity cannot be resolved. Nothing is cached on failure, so a later call
/// retries.
pub fn global_generator() -> Result<&'static SnowflakeGenerator<SystemClock>> {
    if let Some(generator) = GLOBAL_GENERATOR.get() {
        return Ok(generator);
    }
    let config = GeneratorConfig::from_env()?;
    let generator = SnowflakeGenerator::from_config(&config, SystemClock)?;
    // Racing initialisers agree on whichever value lands first.
    Ok(GLOBAL_GENERATOR.get_or_init(|| generator))
}

/// Generates an ID from the process-wide generator.
///
/// # Errors
///
/// See [`global_generator`] and [`SnowflakeGenerator::next_id`].
pub fn next_id() -> Result<SnowflakeId> {
    global_generator()?.next_id()
}

/// Generates an ID from the process-wide generator as a decimal string.
///
/// # Errors
///
/// See [`next_id`].
pub fn next_id_string() -> Result<String> {
    global_generator()?.next_id_string()
}
