//! Directional cursor over a quicklist, with a scoped entry view.
//!
//! The iterator owns the decompression guard: entering a cold node
//! decompresses it and marks it for re-compression, leaving a node (or
//! releasing the iterator) restores the compression invariant. [`Entry`] is
//! a borrow of one element; structural edits (insert/replace/delete) go
//! through it so the cursor can be kept consistent.

use std::ptr::NonNull;

use crate::listpack::LpValue;
use crate::node::Node;
use crate::quicklist::{Direction, Quicklist};

/// A directional cursor. Obtain with [`Quicklist::iter`],
/// [`Quicklist::iter_at`] or [`Quicklist::iter_from_bookmark`].
pub struct Iter<'a> {
    pub(crate) list: &'a mut Quicklist,
    pub(crate) current: Option<NonNull<Node>>,
    /// Signed offset within the current node; negative counts from its
    /// tail, which keeps deletion cursors stable during reverse walks.
    pub(crate) offset: i64,
    /// True once `offset` addresses a yielded element (otherwise the next
    /// step seeks instead of advancing).
    pub(crate) at_element: bool,
    pub(crate) direction: Direction,
}

impl Quicklist {
    /// Cursor over the whole list.
    pub fn iter(&mut self, direction: Direction) -> Iter<'_> {
        let (current, offset) = match direction {
            Direction::Forward => (self.head, 0),
            Direction::Backward => (self.tail, -1),
        };
        Iter {
            list: self,
            current,
            offset,
            at_element: false,
            direction,
        }
    }

    /// Cursor positioned on the element at `idx`; negative indices count
    /// from the tail. `None` when the index is out of range.
    pub fn iter_at(&mut self, direction: Direction, idx: i64) -> Option<Iter<'_>> {
        let forward = idx >= 0;
        let index = if forward {
            idx as usize
        } else {
            ((-idx) - 1) as usize
        };
        if index >= self.count() {
            return None;
        }
        let (node, accum) = {
            let mut accum = 0usize;
            let mut cur = if forward { self.head } else { self.tail };
            unsafe {
                loop {
                    let p = cur?;
                    let c = p.as_ref().count as usize;
                    if accum + c > index {
                        break (p, accum);
                    }
                    accum += c;
                    cur = if forward {
                        p.as_ref().next
                    } else {
                        p.as_ref().prev
                    };
                }
            }
        };
        let offset = if forward {
            (index - accum) as i64
        } else {
            accum as i64 - index as i64 - 1
        };
        Some(Iter {
            list: self,
            current: Some(node),
            offset,
            at_element: false,
            direction,
        })
    }
}

impl<'q> Iter<'q> {
    /// Read-only view of the underlying list (e.g. for auditing node state
    /// mid-iteration).
    pub fn list(&self) -> &Quicklist {
        self.list
    }

    /// Reverse the walk without moving: the next [`next`](Iter::next) steps
    /// the other way from the current element.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    fn advance_node(&mut self) {
        if let Some(cur) = self.current {
            // Leaving a node re-establishes its compression state.
            self.list.compress_node(Some(cur));
            unsafe {
                self.current = match self.direction {
                    Direction::Forward => cur.as_ref().next,
                    Direction::Backward => cur.as_ref().prev,
                };
            }
        }
        self.offset = match self.direction {
            Direction::Forward => 0,
            Direction::Backward => -1,
        };
        self.at_element = false;
    }

    /// Step to the next element. The returned [`Entry`] borrows the cursor;
    /// release it before stepping again.
    pub fn next(&mut self) -> Option<Entry<'_, 'q>> {
        loop {
            let mut node = self.current?;
            unsafe {
                let plain = node.as_ref().is_plain();
                if !self.at_element {
                    node.as_mut().decompress_for_use();
                } else if plain {
                    // A plain node holds exactly one element.
                    self.advance_node();
                    continue;
                } else {
                    self.offset += match self.direction {
                        Direction::Forward => 1,
                        Direction::Backward => -1,
                    };
                }
                let count = node.as_ref().count as i64;
                let idx = if self.offset < 0 {
                    count + self.offset
                } else {
                    self.offset
                };
                if idx < 0 || idx >= count {
                    self.advance_node();
                    continue;
                }
                self.at_element = true;
                return Some(Entry {
                    node,
                    idx: idx as usize,
                    iter: self,
                });
            }
        }
    }
}

impl Drop for Iter<'_> {
    fn drop(&mut self) {
        if let Some(cur) = self.current {
            self.list.compress_node(Some(cur));
        }
    }
}

/// A borrow of one element within a node.
pub struct Entry<'i, 'q> {
    iter: &'i mut Iter<'q>,
    node: NonNull<Node>,
    idx: usize,
}

impl Entry<'_, '_> {
    /// Decode the element.
    pub fn value(&self) -> LpValue<'_> {
        unsafe {
            let n = self.node.as_ref();
            if n.is_plain() {
                LpValue::Bytes(n.plain_data())
            } else {
                n.lp().get(self.idx)
            }
        }
    }

    /// Compare the element against raw bytes.
    pub fn eq_bytes(&self, other: &[u8]) -> bool {
        self.value().eq_bytes(other)
    }

    /// Remove this element. The cursor advances to the following element
    /// in its current direction.
    pub fn delete(self) {
        let Entry { iter, node, idx } = self;
        unsafe {
            let prev = node.as_ref().prev;
            let next = node.as_ref().next;
            let node_gone = iter.list.del_at(node, idx);
            iter.at_element = false;
            if node_gone {
                match iter.direction {
                    Direction::Forward => {
                        iter.current = next;
                        iter.offset = 0;
                    }
                    Direction::Backward => {
                        iter.current = prev;
                        iter.offset = -1;
                    }
                }
            }
            // Node survived: the signed offset already addresses the next
            // element in the walk direction.
        }
    }

    /// Insert `value` before this element. Exhausts the cursor: the node
    /// may have been split, so further stepping would be ambiguous.
    pub fn insert_before(self, value: &[u8]) {
        let Entry { iter, node, idx } = self;
        iter.list.insert_at(node, idx, value, false);
        iter.current = None;
        iter.at_element = false;
    }

    /// Insert `value` after this element. Exhausts the cursor.
    pub fn insert_after(self, value: &[u8]) {
        let Entry { iter, node, idx } = self;
        iter.list.insert_at(node, idx, value, true);
        iter.current = None;
        iter.at_element = false;
    }

    /// Overwrite this element, in place when the size class allows,
    /// otherwise by delete-and-insert at the same position. Exhausts the
    /// cursor.
    pub fn replace(self, value: &[u8]) {
        let Entry { iter, mut node, idx } = self;
        unsafe {
            let large = iter.list.is_large(value.len());
            let plain = node.as_ref().is_plain();
            if !plain && !large {
                node.as_mut().lp_mut().replace(idx, value);
                node.as_mut().sync_packed();
                iter.list.compress_node(Some(node));
            } else if plain && large {
                node.as_mut().set_plain(value.to_vec());
                iter.list.compress_node(Some(node));
            } else if plain {
                // Shrinking a plain element: insert packed, drop the node.
                iter.list.insert_at(node, 0, value, true);
                iter.list.del_node(node);
            } else {
                // Growing a packed element past the threshold: plain node
                // next to it, then remove the original element.
                let count_was = node.as_ref().count;
                iter.list.insert_at(node, idx, value, true);
                if count_was == 1 {
                    iter.list.del_node(node);
                } else {
                    // The insert may have re-compressed a marked node.
                    node.as_mut().decompress_for_use();
                    if !iter.list.del_at(node, idx) {
                        iter.list.recompress_only(node);
                    }
                }
            }
            iter.current = None;
            iter.at_element = false;
        }
    }
}
