//! A doubly-linked list of packed element arrays with transparent LZF
//! compression of cold interior nodes.
//!
//! Sequence values in a data store want three things at once: memory
//! density (thousands of small elements per allocation), fast head/tail
//! pushes, and bounded per-operation latency. This crate packs small
//! elements into per-node byte arrays, links the nodes both ways, and
//! keeps nodes far from either end compressed.
//!
//! # Features
//!
//! - **Fill policy**: per-node element cap, or a byte budget from 4 KiB to
//!   64 KiB. Overfull nodes split at the insertion point.
//! - **Plain nodes**: single elements above a threshold (default 1 KiB)
//!   get a node of their own, stored verbatim.
//! - **Compression window**: with depth `d`, the first and last `d` nodes
//!   stay raw, the rest are LZF-compressed. Readers borrow nodes
//!   decompressed; releasing the borrow restores the invariant.
//! - **Bookmarks**: up to 15 named anchors for resumable partial walks
//!   over very large lists.
//!
//! # Example
//!
//! ```rust
//! use ambar_quicklist::{Direction, OwnedValue, Quicklist, Where};
//!
//! let mut ql = Quicklist::with_options(-2, 0);
//! ql.push_tail(b"hello");
//! ql.push_tail(b"world");
//! assert_eq!(ql.pop(Where::Head), Some(OwnedValue::Bytes(b"hello".to_vec())));
//! assert_eq!(ql.count(), 1);
//!
//! let mut it = ql.iter(Direction::Forward);
//! assert!(it.next().unwrap().eq_bytes(b"world"));
//! ```

#![warn(missing_docs)]

mod bookmark;
mod compress;
mod error;
mod iter;
mod listpack;
mod node;
mod quicklist;

pub use error::QuicklistError;
pub use iter::{Entry, Iter};
pub use listpack::{Listpack, LpValue};
pub use node::NodeView;
pub use quicklist::{set_packed_threshold, Direction, Nodes, OwnedValue, Quicklist, Where};
