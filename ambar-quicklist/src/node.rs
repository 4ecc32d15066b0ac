//! Quicklist nodes.
//!
//! A node is one segment of the list: either a packed array of small
//! elements or a single large element stored verbatim ("plain"). Either
//! payload kind may be held LZF-compressed while the node is cold.

use std::ptr::NonNull;

use crate::compress;
use crate::listpack::Listpack;

/// What a node stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    /// A single large element, stored verbatim.
    Plain,
    /// A packed array of small elements.
    Packed,
}

/// Payload encoding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Encoding {
    /// Directly readable payload.
    Raw,
    /// LZF-compressed payload.
    Lzf,
}

#[derive(Clone)]
pub(crate) enum Payload {
    Packed(Listpack),
    PackedLzf(Vec<u8>),
    Plain(Vec<u8>),
    PlainLzf(Vec<u8>),
}

pub(crate) struct Node {
    pub(crate) prev: Option<NonNull<Node>>,
    pub(crate) next: Option<NonNull<Node>>,
    pub(crate) payload: Payload,
    /// Uncompressed payload size in bytes.
    pub(crate) sz: usize,
    /// Element count (always 1 for plain nodes).
    pub(crate) count: u32,
    /// Set while a borrower holds the payload transiently decompressed.
    pub(crate) recompress: bool,
    /// Last compression attempt declined (too small or not beneficial).
    pub(crate) attempted_compress: bool,
}

impl Node {
    pub(crate) fn new_packed(lp: Listpack) -> Box<Node> {
        let sz = lp.num_bytes();
        let count = lp.len() as u32;
        Box::new(Node {
            prev: None,
            next: None,
            payload: Payload::Packed(lp),
            sz,
            count,
            recompress: false,
            attempted_compress: false,
        })
    }

    pub(crate) fn new_plain(data: Vec<u8>) -> Box<Node> {
        let sz = data.len();
        Box::new(Node {
            prev: None,
            next: None,
            payload: Payload::Plain(data),
            sz,
            count: 1,
            recompress: false,
            attempted_compress: false,
        })
    }

    pub(crate) fn container(&self) -> Container {
        match self.payload {
            Payload::Packed(_) | Payload::PackedLzf(_) => Container::Packed,
            Payload::Plain(_) | Payload::PlainLzf(_) => Container::Plain,
        }
    }

    pub(crate) fn is_plain(&self) -> bool {
        self.container() == Container::Plain
    }

    pub(crate) fn encoding(&self) -> Encoding {
        match self.payload {
            Payload::Packed(_) | Payload::Plain(_) => Encoding::Raw,
            Payload::PackedLzf(_) | Payload::PlainLzf(_) => Encoding::Lzf,
        }
    }

    pub(crate) fn is_compressed(&self) -> bool {
        self.encoding() == Encoding::Lzf
    }

    /// Compress the payload in place. Best-effort: on a declined attempt
    /// the node stays raw and the attempt is recorded. Either way the
    /// transient-borrow mark is consumed.
    pub(crate) fn try_compress(&mut self) -> bool {
        if self.is_compressed() {
            return true;
        }
        self.recompress = false;
        let packed = match &self.payload {
            Payload::Packed(lp) => compress::compress(lp.as_bytes()),
            Payload::Plain(data) => compress::compress(data),
            _ => unreachable!(),
        };
        match packed {
            Some(buf) => {
                self.payload = match &self.payload {
                    Payload::Packed(_) => Payload::PackedLzf(buf),
                    Payload::Plain(_) => Payload::PlainLzf(buf),
                    _ => unreachable!(),
                };
                self.attempted_compress = false;
                true
            }
            None => {
                self.attempted_compress = true;
                false
            }
        }
    }

    /// Restore the raw payload. No-op when already raw.
    pub(crate) fn decompress_payload(&mut self) {
        self.recompress = false;
        let raw = match &self.payload {
            Payload::PackedLzf(buf) | Payload::PlainLzf(buf) => {
                compress::decompress(buf, self.sz)
            }
            _ => return,
        };
        self.payload = match &self.payload {
            Payload::PackedLzf(_) => Payload::Packed(Listpack::from_raw_parts(raw, self.count)),
            Payload::PlainLzf(_) => Payload::Plain(raw),
            _ => unreachable!(),
        };
    }

    /// Decompress for a transient borrower; the list re-compresses the node
    /// when the borrow ends.
    pub(crate) fn decompress_for_use(&mut self) {
        if self.is_compressed() {
            self.decompress_payload();
            self.recompress = true;
        }
    }

    /// The packed payload. Callers must have decompressed the node.
    pub(crate) fn lp(&self) -> &Listpack {
        match &self.payload {
            Payload::Packed(lp) => lp,
            _ => panic!("node payload is not a raw packed array"),
        }
    }

    pub(crate) fn lp_mut(&mut self) -> &mut Listpack {
        match &mut self.payload {
            Payload::Packed(lp) => lp,
            _ => panic!("node payload is not a raw packed array"),
        }
    }

    pub(crate) fn take_lp(&mut self) -> Listpack {
        match std::mem::replace(&mut self.payload, Payload::Packed(Listpack::new())) {
            Payload::Packed(lp) => lp,
            _ => panic!("node payload is not a raw packed array"),
        }
    }

    pub(crate) fn put_lp(&mut self, lp: Listpack) {
        self.payload = Payload::Packed(lp);
    }

    /// Refresh `sz`/`count` after a packed payload mutation.
    pub(crate) fn sync_packed(&mut self) {
        if let Payload::Packed(lp) = &self.payload {
            self.sz = lp.num_bytes();
            self.count = lp.len() as u32;
            self.attempted_compress = false;
        }
    }

    /// The plain payload. Callers must have decompressed the node.
    pub(crate) fn plain_data(&self) -> &[u8] {
        match &self.payload {
            Payload::Plain(data) => data,
            _ => panic!("node payload is not a raw plain buffer"),
        }
    }

    pub(crate) fn set_plain(&mut self, data: Vec<u8>) {
        self.sz = data.len();
        self.count = 1;
        self.payload = Payload::Plain(data);
        self.attempted_compress = false;
    }
}

/// Per-node statistics, exposed for auditing and tests.
#[derive(Debug, Clone, Copy)]
pub struct NodeView {
    /// Elements stored in the node.
    pub count: usize,
    /// Uncompressed payload bytes.
    pub bytes: usize,
    /// True for single-large-element nodes.
    pub is_plain: bool,
    /// True while the payload is held LZF-compressed.
    pub is_compressed: bool,
    /// True if the last compression attempt was declined.
    pub attempted_compress: bool,
}

impl NodeView {
    pub(crate) fn of(node: &Node) -> NodeView {
        NodeView {
            count: node.count as usize,
            bytes: node.sz,
            is_plain: node.is_plain(),
            is_compressed: node.is_compressed(),
            attempted_compress: node.attempted_compress,
        }
    }
}
