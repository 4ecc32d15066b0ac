//! Named node anchors for resumable iteration over very large lists.
//!
//! Bookmarks live in a small tail array on the list header (capacity 15,
//! since every node deletion scans it). When a bookmarked node is removed
//! the bookmark slides to its successor, or disappears at the tail.

use std::ptr::NonNull;

use crate::error::QuicklistError;
use crate::iter::Iter;
use crate::node::Node;
use crate::quicklist::{Direction, Quicklist};

/// Bookmark cap; bounds the per-deletion scan.
const BOOKMARK_MAX: usize = 15;

pub(crate) struct Bookmark {
    pub(crate) name: String,
    pub(crate) node: NonNull<Node>,
}

impl Quicklist {
    /// Anchor `name` on the node containing the element at `index`.
    pub fn bookmark_create(&mut self, name: &str, index: i64) -> Result<(), QuicklistError> {
        if self.bookmarks.len() >= BOOKMARK_MAX {
            return Err(QuicklistError::BookmarkTableFull);
        }
        if self.bookmarks.iter().any(|b| b.name == name) {
            return Err(QuicklistError::BookmarkExists);
        }
        let total = self.count() as i64;
        let resolved = if index < 0 { total + index } else { index };
        if resolved < 0 || resolved >= total {
            return Err(QuicklistError::OutOfRange);
        }
        let (node, _) = self
            .locate_index(resolved as usize)
            .ok_or(QuicklistError::OutOfRange)?;
        self.bookmarks.push(Bookmark {
            name: name.to_string(),
            node,
        });
        Ok(())
    }

    /// Drop a bookmark. Returns false if the name is unknown.
    pub fn bookmark_delete(&mut self, name: &str) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|b| b.name != name);
        self.bookmarks.len() != before
    }

    /// Drop every bookmark.
    pub fn bookmarks_clear(&mut self) {
        self.bookmarks.clear();
    }

    /// Number of live bookmarks.
    pub fn bookmark_count(&self) -> usize {
        self.bookmarks.len()
    }

    /// Resume a forward walk from the bookmarked node's first element.
    /// `None` when the name is unknown.
    pub fn iter_from_bookmark(&mut self, name: &str) -> Option<Iter<'_>> {
        let node = self.bookmarks.iter().find(|b| b.name == name)?.node;
        Some(Iter {
            list: self,
            current: Some(node),
            offset: 0,
            at_element: false,
            direction: Direction::Forward,
        })
    }

    /// Called on node deletion: bookmarks on the removed node move to its
    /// successor or are discarded at the tail.
    pub(crate) fn bookmarks_on_node_removed(
        &mut self,
        node: NonNull<Node>,
        successor: Option<NonNull<Node>>,
    ) {
        self.bookmarks.retain(|b| {
            if b.node != node {
                return true;
            }
            match successor {
                Some(s) => {
                    b.node = s;
                    true
                }
                None => false,
            }
        });
    }
}
