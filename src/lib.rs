//! Ambar: in-memory collection cores for data-store runtimes.
//!
//! This crate is a facade over two independent single-writer containers:
//!
//! - [`dict`]: an incrementally-rehashing chained hash table. Grows and
//!   shrinks in bounded work units so no single operation pays for a full
//!   table migration.
//! - [`quicklist`]: a doubly-linked list of packed element arrays where cold
//!   interior nodes are kept LZF-compressed.
//!
//! Both cores assume a single-threaded event loop: no internal locking, no
//! yield points inside a call. Distinct instances are independent and may
//! live on different threads.
//!
//! # Example
//!
//! ```rust
//! use ambar::dict::{SipDict, Value};
//! use ambar::quicklist::Quicklist;
//!
//! let mut index: SipDict<String, ()> = SipDict::new();
//! index.add("answer".to_string(), Value::U64(42)).unwrap();
//!
//! let mut log = Quicklist::new();
//! log.push_tail(b"first");
//! log.push_tail(b"second");
//! assert_eq!(log.count(), 2);
//! ```

pub use ambar_dict as dict;
pub use ambar_quicklist as quicklist;
