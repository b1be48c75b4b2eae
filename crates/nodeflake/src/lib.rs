//! Time-ordered 64-bit Snowflake IDs.
//!
//! Every ID packs a 41-bit millisecond timestamp, a 5-bit datacenter ID, a
//! 5-bit worker ID and a 12-bit sequence under an always-zero sign bit, so IDs
//! from one generator are strictly increasing and fit an `i64`.
//!
//! The datacenter and worker IDs are either supplied by the caller or derived
//! once from the local host (see [`NodeIdentity`]).
//!
//! ```
//! use nodeflake::{SnowflakeGenerator, SystemClock};
//!
//! let generator = SnowflakeGenerator::with_node_ids(1, 2, SystemClock)?;
//! let id = generator.next_id()?;
//! assert_eq!((id.datacenter_id(), id.worker_id()), (1, 2));
//! # Ok::<(), nodeflake::Error>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod generator;
mod global;
mod id;
mod identity;
mod time;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::global::*;
pub use crate::id::*;
pub use crate::identity::*;
pub use crate::time::*;
