//! Incrementally-rehashing chained hash table.
//!
//! The table that backs a data-store keyspace cannot afford a stop-the-world
//! resize: with millions of keys a full migration blocks the event loop for
//! hundreds of milliseconds. This crate spreads the migration over the
//! operations that follow it instead.
//!
//! # Features
//!
//! - **Incremental rehash**: growth allocates a second table and migrates a
//!   bounded number of buckets per subsequent operation, with an explicit
//!   bound on empty buckets visited so sparse tails stay cheap.
//! - **Pausable migration**: safe iterators and scans freeze the two-table
//!   topology via a re-entrant pause counter.
//! - **Resize-tolerant scan**: a reverse-binary cursor enumerates buckets
//!   such that a resize between calls never loses keys.
//! - **Random sampling**: single, fairness-improved and cluster sampling of
//!   entries for eviction pools.
//! - **Pluggable type hooks**: hashing, key equivalence, expansion policy
//!   and per-entry metadata size come from a [`DictType`] implementation.
//!
//! # Example
//!
//! ```rust
//! use ambar_dict::{SipDict, Value};
//!
//! let mut d: SipDict<String, ()> = SipDict::new();
//! d.add("k1".into(), Value::I64(1)).unwrap();
//! d.add("k2".into(), Value::I64(2)).unwrap();
//! d.delete(&"k2".into()).unwrap();
//! assert_eq!(d.fetch_value(&"k1".into()).and_then(|v| v.as_i64()), Some(1));
//! assert_eq!(d.len(), 1);
//! ```

#![warn(missing_docs)]

mod dict;
mod entry;
mod error;
pub mod hash;
mod iter;
mod random;
mod scan;

pub use dict::{
    disable_resize, enable_resize, Dict, DictStats, DictType, SipDict, SipHashType, TableStats,
};
pub use entry::{Entry, Value};
pub use error::DictError;
pub use hash::{gen_case_hash, gen_hash, hash_of, set_hash_seed};
pub use iter::Iter;
