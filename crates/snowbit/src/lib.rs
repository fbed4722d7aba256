//! Configurable Snowflake-style identifiers.
//!
//! A [`Snowbit`] engine packs a time slot, two location fields and a
//! per-slot sequence into one unsigned integer whose layout is declared at
//! construction:
//!
//! ```text
//!  MSB                                                                  LSB
//!  +--------------+------------+----------------+----------------+----------+
//!  | reserved (1) | time (t)   | location_a (a) | location_b (b) | seq (s)  |
//!  +--------------+------------+----------------+----------------+----------+
//!                  t + a + b + s = total_bits - 1
//! ```
//!
//! The integer is carried in a [`Word`]: `u64`, `u128`, or a 256-bit word with
//! the `wide` feature for layouts up to 213 bits.
//!
//! # Example
//!
//! ```
//! use snowbit::{EngineConfig, Snowbit};
//!
//! let engine = Snowbit::<u64>::new(EngineConfig::new(1, 1)).unwrap();
//! let id = engine.next_id().unwrap();
//! let parts = engine.decompose(id);
//! assert_eq!(parts.location_a, 1);
//! assert_eq!(parts.location_b, 1);
//! ```

mod codec;
mod config;
mod describe;
mod error;
#[cfg(feature = "futures")]
mod futures;
mod generator;
mod layout;
mod radix;
mod time;
mod word;

pub use crate::codec::*;
pub use crate::config::*;
pub use crate::describe::*;
pub use crate::error::*;
#[cfg_attr(docsrs, doc(cfg(feature = "futures")))]
#[cfg(feature = "futures")]
pub use crate::futures::*;
pub use crate::generator::*;
pub use crate::layout::*;
pub use crate::radix::*;
pub use crate::time::*;
pub use crate::word::*;
