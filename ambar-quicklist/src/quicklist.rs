//! The quicklist core: a doubly-linked chain of packed nodes with a fill
//! policy, a compression window, and positional operations.
//!
//! Node layout is maintained by three rules:
//!
//! 1. A node absorbs a new element only while the fill policy admits it;
//!    otherwise the element goes to a neighbor, a fresh node, or the node
//!    is split at the insertion point.
//! 2. Elements larger than the plain threshold get a node of their own and
//!    are stored verbatim.
//! 3. With a compress depth of `d`, every node further than `d` from both
//!    ends is kept LZF-compressed at rest. Readers borrow a node
//!    decompressed and the list restores the invariant when the borrow
//!    ends.

use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use smallvec::SmallVec;
use tracing::trace;

use crate::bookmark::Bookmark;
use crate::listpack::{Listpack, LpValue};
use crate::node::{Node, NodeView};

/// Per-node byte budgets for negative fill values (`-1` to `-5`).
const SIZE_CLASSES: [usize; 5] = [4096, 8192, 16384, 32768, 65536];
/// Hard byte ceiling for count-limited nodes.
const SIZE_SAFETY_LIMIT: usize = 8192;
/// Default single-element size above which a value gets a plain node.
const DEFAULT_PLAIN_THRESHOLD: usize = 1 << 10;
const FILL_MIN: i32 = -5;
const FILL_MAX: i32 = 32_767;
const COMPRESS_MAX: i32 = 65_535;
const DEFAULT_FILL: i32 = -2;

static PACKED_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PLAIN_THRESHOLD);

/// Set the process-wide default plain threshold, sampled by lists at
/// creation. `0` restores the 1 KiB default. Values of 1 GiB or more are
/// rejected and `false` is returned.
pub fn set_packed_threshold(sz: usize) -> bool {
    if sz >= 1 << 30 {
        return false;
    }
    let sz = if sz == 0 { DEFAULT_PLAIN_THRESHOLD } else { sz };
    PACKED_THRESHOLD.store(sz, Ordering::Relaxed);
    true
}

/// End selector for push and pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Where {
    /// The head of the list.
    Head,
    /// The tail of the list.
    Tail,
}

/// Iteration direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Head to tail.
    Forward,
    /// Tail to head.
    Backward,
}

/// An element copied out of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedValue {
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Integer-encoded element.
    Int(i64),
}

impl OwnedValue {
    /// Compare against raw bytes; integers compare by decimal rendering.
    pub fn eq_bytes(&self, other: &[u8]) -> bool {
        match self {
            OwnedValue::Bytes(b) => b == other,
            OwnedValue::Int(i) => crate::listpack::parse_int(other) == Some(*i),
        }
    }

    /// Render the element as bytes, integers in decimal.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            OwnedValue::Bytes(b) => b,
            OwnedValue::Int(i) => i.to_string().into_bytes(),
        }
    }
}

impl From<LpValue<'_>> for OwnedValue {
    fn from(v: LpValue<'_>) -> OwnedValue {
        match v {
            LpValue::Bytes(b) => OwnedValue::Bytes(b.to_vec()),
            LpValue::Int(i) => OwnedValue::Int(i),
        }
    }
}

fn node_exceeds_limit(fill: i32, new_sz: usize, new_count: usize) -> bool {
    if fill >= 0 {
        new_count > fill as usize || new_sz > SIZE_SAFETY_LIMIT
    } else {
        new_sz > SIZE_CLASSES[(-fill - 1) as usize]
    }
}

fn alloc_node(node: Box<Node>) -> NonNull<Node> {
    NonNull::new(Box::into_raw(node)).unwrap()
}

/// Split `node`'s packed payload at `offset`. With `after` the node keeps
/// `[0, offset]` and the returned node takes the rest; without it the node
/// keeps `[offset, end)`.
fn split_packed(node: &mut Node, offset: usize, after: bool) -> Box<Node> {
    let lp = node.take_lp();
    let (keep, give) = if after {
        let (l, r) = lp.split(offset + 1);
        (l, r)
    } else {
        let (l, r) = lp.split(offset);
        (r, l)
    };
    node.put_lp(keep);
    node.sync_packed();
    let fresh = Node::new_packed(give);
    trace!(kept = node.count, moved = fresh.count, "split packed node");
    fresh
}

/// A doubly-linked list of packed element arrays.
pub struct Quicklist {
    pub(crate) head: Option<NonNull<Node>>,
    pub(crate) tail: Option<NonNull<Node>>,
    /// Total element count across all nodes.
    pub(crate) count: usize,
    /// Node count.
    pub(crate) len: usize,
    pub(crate) fill: i32,
    pub(crate) compress: u32,
    pub(crate) plain_threshold: usize,
    pub(crate) bookmarks: SmallVec<[Bookmark; 2]>,
}

// The list owns every node; distinct instances are independent, and all
// `&self` methods are read-only.
unsafe impl Send for Quicklist {}
unsafe impl Sync for Quicklist {}

impl Default for Quicklist {
    fn default() -> Self {
        Self::new()
    }
}

impl Quicklist {
    /// Empty list with the default fill (8 KiB nodes) and no compression.
    pub fn new() -> Quicklist {
        Quicklist::with_options(DEFAULT_FILL, 0)
    }

    /// Empty list with an explicit fill policy and compress depth.
    ///
    /// `fill >= 0` caps each node's element count; negative values select a
    /// byte budget (`-1` = 4 KiB … `-5` = 64 KiB). `compress` is the number
    /// of nodes at each end kept uncompressed; `0` disables compression.
    pub fn with_options(fill: i32, compress: i32) -> Quicklist {
        Quicklist {
            head: None,
            tail: None,
            count: 0,
            len: 0,
            fill: fill.clamp(FILL_MIN, FILL_MAX),
            compress: compress.clamp(0, COMPRESS_MAX) as u32,
            plain_threshold: PACKED_THRESHOLD.load(Ordering::Relaxed),
            bookmarks: SmallVec::new(),
        }
    }

    /// Change the fill policy for future insertions.
    pub fn set_fill(&mut self, fill: i32) {
        self.fill = fill.clamp(FILL_MIN, FILL_MAX);
    }

    /// Change the compress depth. Existing nodes are reconciled lazily by
    /// subsequent operations.
    pub fn set_compress_depth(&mut self, depth: i32) {
        self.compress = depth.clamp(0, COMPRESS_MAX) as u32;
    }

    /// Set fill policy and compress depth together.
    pub fn set_options(&mut self, fill: i32, depth: i32) {
        self.set_fill(fill);
        self.set_compress_depth(depth);
    }

    /// Override this list's plain threshold (single-element size that gets
    /// a node of its own).
    pub fn set_plain_threshold(&mut self, sz: usize) {
        self.plain_threshold = sz;
    }

    /// Total stored elements.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no elements are stored.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub(crate) fn is_large(&self, sz: usize) -> bool {
        sz > self.plain_threshold
    }

    pub(crate) fn allow_insert(&self, node: NonNull<Node>, sz: usize) -> bool {
        unsafe {
            let n = node.as_ref();
            if n.is_plain() || self.is_large(sz) {
                return false;
            }
            let new_sz = n.sz + Listpack::encoded_size_hint(sz);
            !node_exceeds_limit(self.fill, new_sz, n.count as usize + 1)
        }
    }

    fn allow_merge(&self, a: Option<NonNull<Node>>, b: Option<NonNull<Node>>) -> bool {
        let (Some(a), Some(b)) = (a, b) else {
            return false;
        };
        unsafe {
            let (ar, br) = (a.as_ref(), b.as_ref());
            if ar.is_plain() || br.is_plain() {
                return false;
            }
            let merge_sz = ar.sz + br.sz;
            !node_exceeds_limit(self.fill, merge_sz, (ar.count + br.count) as usize)
        }
    }

    /// Link `new` next to `old` (or as the only node), then re-establish
    /// the compression window around both.
    pub(crate) fn link_node(&mut self, old: Option<NonNull<Node>>, mut new: NonNull<Node>, after: bool) {
        unsafe {
            match old {
                Some(mut oldp) => {
                    if after {
                        let old_next = oldp.as_ref().next;
                        new.as_mut().prev = Some(oldp);
                        new.as_mut().next = old_next;
                        if let Some(mut n) = old_next {
                            n.as_mut().prev = Some(new);
                        }
                        oldp.as_mut().next = Some(new);
                        if self.tail == Some(oldp) {
                            self.tail = Some(new);
                        }
                    } else {
                        let old_prev = oldp.as_ref().prev;
                        new.as_mut().next = Some(oldp);
                        new.as_mut().prev = old_prev;
                        if let Some(mut p) = old_prev {
                            p.as_mut().next = Some(new);
                        }
                        oldp.as_mut().prev = Some(new);
                        if self.head == Some(oldp) {
                            self.head = Some(new);
                        }
                    }
                }
                None => {
                    self.head = Some(new);
                    self.tail = Some(new);
                }
            }
            self.len += 1;
            if let Some(o) = old {
                self.compress_node(Some(o));
            }
            self.compress_node(Some(new));
        }
    }

    /// Unlink and free a node, fixing bookmarks and the compression window.
    pub(crate) fn del_node(&mut self, node: NonNull<Node>) {
        unsafe {
            let (prev, next, cnt) = {
                let n = node.as_ref();
                (n.prev, n.next, n.count as usize)
            };
            self.bookmarks_on_node_removed(node, next);
            if let Some(mut nx) = next {
                nx.as_mut().prev = prev;
            }
            if let Some(mut pv) = prev {
                pv.as_mut().next = next;
            }
            if self.tail == Some(node) {
                self.tail = prev;
            }
            if self.head == Some(node) {
                self.head = next;
            }
            self.len -= 1;
            self.count -= cnt;
            self.compress_window(None);
            drop(Box::from_raw(node.as_ptr()));
        }
    }

    /// Remove one element from a (raw) node; frees the node when it
    /// drains. Returns true when the node was freed.
    pub(crate) fn del_at(&mut self, mut node: NonNull<Node>, idx: usize) -> bool {
        unsafe {
            if node.as_ref().is_plain() {
                self.del_node(node);
                return true;
            }
            let n = node.as_mut();
            n.lp_mut().remove(idx);
            n.sync_packed();
            self.count -= 1;
            if n.count == 0 {
                self.del_node(node);
                true
            } else {
                false
            }
        }
    }

    pub(crate) fn recompress_only(&mut self, mut node: NonNull<Node>) {
        unsafe {
            if node.as_ref().recompress {
                node.as_mut().try_compress();
            }
        }
    }

    /// Restore a transient borrow (recompress flag) or re-establish the
    /// depth window around `node`.
    pub(crate) fn compress_node(&mut self, node: Option<NonNull<Node>>) {
        unsafe {
            if let Some(mut n) = node {
                if n.as_ref().recompress {
                    n.as_mut().try_compress();
                    return;
                }
            }
            self.compress_window(node);
        }
    }

    /// Walk `compress` nodes in from both ends, keeping the window raw and
    /// compressing `node` if it lies outside it.
    fn compress_window(&mut self, node: Option<NonNull<Node>>) {
        if self.len == 0 {
            return;
        }
        unsafe {
            debug_assert!(
                !self.head.unwrap().as_ref().recompress
                    && !self.tail.unwrap().as_ref().recompress
            );
            if self.compress == 0 || self.len < self.compress as usize * 2 {
                return;
            }
            let mut forward = self.head;
            let mut reverse = self.tail;
            let mut in_depth = false;
            let mut depth = 0u32;
            while depth < self.compress {
                depth += 1;
                if let Some(mut f) = forward {
                    f.as_mut().decompress_payload();
                }
                if let Some(mut r) = reverse {
                    r.as_mut().decompress_payload();
                }
                if (node.is_some() && forward == node) || (node.is_some() && reverse == node) {
                    in_depth = true;
                }
                if forward == reverse || forward.unwrap().as_ref().next == reverse {
                    return;
                }
                forward = forward.unwrap().as_ref().next;
                reverse = reverse.unwrap().as_ref().prev;
            }
            if !in_depth {
                if let Some(mut n) = node {
                    n.as_mut().try_compress();
                }
            }
            if let Some(mut f) = forward {
                f.as_mut().try_compress();
            }
            if let Some(mut r) = reverse {
                r.as_mut().try_compress();
            }
        }
    }

    fn insert_plain(&mut self, old: Option<NonNull<Node>>, data: Vec<u8>, after: bool) {
        let node = alloc_node(Node::new_plain(data));
        self.link_node(old, node, after);
        self.count += 1;
    }

    /// Prepend an element. Returns true when a new head node was created.
    pub fn push_head(&mut self, value: &[u8]) -> bool {
        if self.is_large(value.len()) {
            self.insert_plain(self.head, value.to_vec(), false);
            return true;
        }
        let orig_head = self.head;
        unsafe {
            match self.head {
                Some(mut h) if self.allow_insert(h, value.len()) => {
                    h.as_mut().lp_mut().push_head(value);
                    h.as_mut().sync_packed();
                }
                _ => {
                    let mut lp = Listpack::new();
                    lp.push_tail(value);
                    let node = alloc_node(Node::new_packed(lp));
                    self.link_node(orig_head, node, false);
                }
            }
        }
        self.count += 1;
        self.head != orig_head
    }

    /// Append an element. Returns true when a new tail node was created.
    pub fn push_tail(&mut self, value: &[u8]) -> bool {
        if self.is_large(value.len()) {
            self.insert_plain(self.tail, value.to_vec(), true);
            return true;
        }
        let orig_tail = self.tail;
        unsafe {
            match self.tail {
                Some(mut t) if self.allow_insert(t, value.len()) => {
                    t.as_mut().lp_mut().push_tail(value);
                    t.as_mut().sync_packed();
                }
                _ => {
                    let mut lp = Listpack::new();
                    lp.push_tail(value);
                    let node = alloc_node(Node::new_packed(lp));
                    self.link_node(orig_tail, node, true);
                }
            }
        }
        self.count += 1;
        self.tail != orig_tail
    }

    /// Push to the selected end.
    pub fn push(&mut self, wh: Where, value: &[u8]) {
        match wh {
            Where::Head => self.push_head(value),
            Where::Tail => self.push_tail(value),
        };
    }

    /// Take ownership of an externally built packed array as the new tail
    /// node. The element count comes from the buffer's own header.
    pub fn append_listpack(&mut self, lp: Listpack) {
        let added = lp.len();
        let node = alloc_node(Node::new_packed(lp));
        self.link_node(self.tail, node, true);
        self.count += added;
    }

    /// Take ownership of a single large buffer as a new plain tail node.
    pub fn append_plain(&mut self, data: Vec<u8>) {
        self.insert_plain(self.tail, data, true);
    }

    /// Insert next to `(node, offset)`. The caller guarantees the node is
    /// raw and the offset normalized.
    pub(crate) fn insert_at(
        &mut self,
        mut node: NonNull<Node>,
        offset: usize,
        value: &[u8],
        after: bool,
    ) {
        unsafe {
            let count = node.as_ref().count as usize;
            let full = !self.allow_insert(node, value.len());
            let at_tail = after && offset == count.saturating_sub(1);
            let at_head = !after && offset == 0;
            let next = node.as_ref().next;
            let prev = node.as_ref().prev;
            let avail_next = next.map_or(false, |n| self.allow_insert(n, value.len()));
            let avail_prev = prev.map_or(false, |p| self.allow_insert(p, value.len()));

            if self.is_large(value.len()) {
                if node.as_ref().is_plain() || (at_tail && after) || (at_head && !after) {
                    self.insert_plain(Some(node), value.to_vec(), after);
                } else {
                    node.as_mut().decompress_for_use();
                    let rest = alloc_node(split_packed(node.as_mut(), offset, after));
                    let plain = alloc_node(Node::new_plain(value.to_vec()));
                    self.link_node(Some(node), plain, after);
                    self.link_node(Some(plain), rest, after);
                    self.count += 1;
                }
                return;
            }

            if !full && after {
                node.as_mut().decompress_for_use();
                node.as_mut().lp_mut().insert(offset + 1, value);
                node.as_mut().sync_packed();
                self.recompress_only(node);
            } else if !full && !after {
                node.as_mut().decompress_for_use();
                node.as_mut().lp_mut().insert(offset, value);
                node.as_mut().sync_packed();
                self.recompress_only(node);
            } else if at_tail && avail_next && after {
                // Full node, inserting after its last element: spill into
                // the head of the next node.
                let mut nn = next.unwrap();
                nn.as_mut().decompress_for_use();
                nn.as_mut().lp_mut().push_head(value);
                nn.as_mut().sync_packed();
                self.recompress_only(nn);
                self.recompress_only(node);
            } else if at_head && avail_prev && !after {
                let mut pn = prev.unwrap();
                pn.as_mut().decompress_for_use();
                pn.as_mut().lp_mut().push_tail(value);
                pn.as_mut().sync_packed();
                self.recompress_only(pn);
                self.recompress_only(node);
            } else if (at_tail && next.is_some() && !avail_next && after)
                || (at_head && prev.is_some() && !avail_prev && !after)
                || (at_tail && next.is_none() && after)
                || (at_head && prev.is_none() && !after)
            {
                // Boundary insert with no room anywhere: fresh node.
                let mut lp = Listpack::new();
                lp.push_tail(value);
                let fresh = alloc_node(Node::new_packed(lp));
                self.link_node(Some(node), fresh, after);
            } else {
                // Full node, interior offset: split and insert into the
                // carried-away half, then try to merge the pieces back.
                node.as_mut().decompress_for_use();
                let mut rest = split_packed(node.as_mut(), offset, after);
                if after {
                    rest.lp_mut().push_head(value);
                } else {
                    rest.lp_mut().push_tail(value);
                }
                rest.sync_packed();
                let rest = alloc_node(rest);
                self.link_node(Some(node), rest, after);
                self.merge_neighbors(node);
            }
            self.count += 1;
        }
    }

    fn merge_packed(&mut self, mut a: NonNull<Node>, mut b: NonNull<Node>) -> NonNull<Node> {
        unsafe {
            trace!(
                left = a.as_ref().count,
                right = b.as_ref().count,
                "merging packed nodes"
            );
            a.as_mut().decompress_payload();
            b.as_mut().decompress_payload();
            let alp = a.as_mut().take_lp();
            let blp = b.as_mut().take_lp();
            a.as_mut().put_lp(Listpack::merge(alp, blp));
            a.as_mut().sync_packed();
            b.as_mut().count = 0;
            self.del_node(b);
            self.compress_node(Some(a));
            a
        }
    }

    /// After a split, try to merge `center` and its neighbors back into
    /// fill-respecting nodes.
    fn merge_neighbors(&mut self, mut center: NonNull<Node>) {
        unsafe {
            let prev = center.as_ref().prev;
            let prev_prev = prev.and_then(|p| p.as_ref().prev);
            if self.allow_merge(prev_prev, prev) {
                self.merge_packed(prev_prev.unwrap(), prev.unwrap());
            }
            let next = center.as_ref().next;
            let next_next = next.and_then(|n| n.as_ref().next);
            if self.allow_merge(next, next_next) {
                self.merge_packed(next.unwrap(), next_next.unwrap());
            }
            let p = center.as_ref().prev;
            if self.allow_merge(p, Some(center)) {
                center = self.merge_packed(p.unwrap(), center);
            }
            let n = center.as_ref().next;
            if self.allow_merge(Some(center), n) {
                self.merge_packed(center, n.unwrap());
            }
        }
    }

    /// Node and in-node offset of the element at `index`.
    pub(crate) fn locate_index(&self, index: usize) -> Option<(NonNull<Node>, usize)> {
        let mut accum = 0usize;
        let mut cur = self.head;
        unsafe {
            while let Some(p) = cur {
                let c = p.as_ref().count as usize;
                if accum + c > index {
                    return Some((p, index - accum));
                }
                accum += c;
                cur = p.as_ref().next;
            }
        }
        None
    }

    /// Remove from head or tail, handing the payload to `saver` before the
    /// element is destroyed.
    pub fn pop_with<T, F>(&mut self, wh: Where, saver: F) -> Option<T>
    where
        F: FnOnce(LpValue<'_>) -> T,
    {
        if self.count == 0 {
            return None;
        }
        unsafe {
            let (mut node, idx) = match wh {
                Where::Head => (self.head?, 0),
                Where::Tail => {
                    let t = self.tail?;
                    (t, t.as_ref().count as usize - 1)
                }
            };
            node.as_mut().decompress_for_use();
            let out = if node.as_ref().is_plain() {
                saver(LpValue::Bytes(node.as_ref().plain_data()))
            } else {
                saver(node.as_ref().lp().get(idx))
            };
            self.del_at(node, idx);
            Some(out)
        }
    }

    /// Remove and return the element at the selected end.
    pub fn pop(&mut self, wh: Where) -> Option<OwnedValue> {
        self.pop_with(wh, |v| OwnedValue::from(v))
    }

    /// Move the tail element to the head in one step.
    pub fn rotate(&mut self) {
        if self.count <= 1 {
            return;
        }
        unsafe {
            let mut tail = self.tail.unwrap();
            tail.as_mut().decompress_for_use();
            let idx = tail.as_ref().count as usize - 1;
            let value: Vec<u8> = if tail.as_ref().is_plain() {
                tail.as_ref().plain_data().to_vec()
            } else {
                tail.as_ref().lp().get(idx).to_vec()
            };
            self.push_head(&value);
            // Re-resolve: with a single node the push shifted our index.
            let tail = self.tail.unwrap();
            let idx = tail.as_ref().count as usize - 1;
            self.del_at(tail, idx);
        }
    }

    /// Delete the half-open index range `[start, stop)`. Negative indices
    /// resolve against the element count; out-of-range bounds clamp.
    /// Returns the number of elements removed.
    pub fn del_range(&mut self, start: i64, stop: i64) -> usize {
        let total = self.count as i64;
        if total == 0 {
            return 0;
        }
        let s = if start < 0 { total + start } else { start }.clamp(0, total);
        let e = if stop < 0 { total + stop } else { stop }.clamp(0, total);
        if e <= s {
            return 0;
        }
        let extent = (e - s) as usize;
        self.del_count(s as usize, extent);
        extent
    }

    fn del_count(&mut self, start: usize, mut extent: usize) {
        let Some((first, first_offset)) = self.locate_index(start) else {
            return;
        };
        let mut node_opt = Some(first);
        let mut offset = first_offset;
        while extent > 0 {
            let Some(mut node) = node_opt else { break };
            unsafe {
                let next = node.as_ref().next;
                let ncount = node.as_ref().count as usize;
                let del;
                if offset == 0 && extent >= ncount {
                    del = ncount;
                    self.del_node(node);
                } else {
                    del = extent.min(ncount - offset);
                    node.as_mut().decompress_for_use();
                    node.as_mut().lp_mut().remove_range(offset, del);
                    node.as_mut().sync_packed();
                    self.count -= del;
                    if node.as_ref().count == 0 {
                        self.del_node(node);
                    } else {
                        self.recompress_only(node);
                    }
                }
                extent -= del;
                node_opt = next;
                offset = 0;
            }
        }
    }

    /// Overwrite the element at `index`. Returns false when the index is
    /// out of range.
    pub fn replace_at(&mut self, index: i64, value: &[u8]) -> bool {
        let Some(mut it) = self.iter_at(Direction::Forward, index) else {
            return false;
        };
        match it.next() {
            Some(entry) => {
                entry.replace(value);
                true
            }
            None => false,
        }
    }

    /// Copy out the element at `index` (negative counts from the tail).
    pub fn get(&mut self, index: i64) -> Option<OwnedValue> {
        let mut it = self.iter_at(Direction::Forward, index)?;
        let entry = it.next()?;
        let out = OwnedValue::from(entry.value());
        Some(out)
    }

    /// Deep copy, preserving node layout and per-node compression state.
    /// Bookmarks are not copied.
    pub fn dup(&self) -> Quicklist {
        let mut copy = Quicklist {
            head: None,
            tail: None,
            count: 0,
            len: 0,
            fill: self.fill,
            compress: self.compress,
            plain_threshold: self.plain_threshold,
            bookmarks: SmallVec::new(),
        };
        unsafe {
            let mut cur = self.head;
            while let Some(p) = cur {
                let n = p.as_ref();
                let fresh = alloc_node(Box::new(Node {
                    prev: copy.tail,
                    next: None,
                    payload: n.payload.clone(),
                    sz: n.sz,
                    count: n.count,
                    recompress: false,
                    attempted_compress: n.attempted_compress,
                }));
                match copy.tail {
                    Some(mut t) => t.as_mut().next = Some(fresh),
                    None => copy.head = Some(fresh),
                }
                copy.tail = Some(fresh);
                copy.len += 1;
                copy.count += n.count as usize;
                cur = n.next;
            }
        }
        copy
    }

    /// Per-node statistics, head to tail.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            next: self.head,
            _list: std::marker::PhantomData,
        }
    }
}

impl Drop for Quicklist {
    fn drop(&mut self) {
        unsafe {
            let mut cur = self.head;
            while let Some(p) = cur {
                let next = p.as_ref().next;
                drop(Box::from_raw(p.as_ptr()));
                cur = next;
            }
        }
    }
}

impl fmt::Debug for Quicklist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quicklist")
            .field("count", &self.count)
            .field("len", &self.len)
            .field("fill", &self.fill)
            .field("compress", &self.compress)
            .finish_non_exhaustive()
    }
}

/// Iterator over per-node statistics.
pub struct Nodes<'a> {
    next: Option<NonNull<Node>>,
    _list: std::marker::PhantomData<&'a Quicklist>,
}

impl Iterator for Nodes<'_> {
    type Item = NodeView;

    fn next(&mut self) -> Option<NodeView> {
        let p = self.next?;
        unsafe {
            self.next = p.as_ref().next;
            Some(NodeView::of(p.as_ref()))
        }
    }
}
