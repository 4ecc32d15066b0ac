//! Dictionary iterators.
//!
//! Two flavors, matching the two traversal contracts:
//!
//! - [`Dict::iter`] is the plain iterator. It does not pause incremental
//!   rehashing, and it verifies on release that the table structure did not
//!   change underneath it. The borrow checker already rules that out for
//!   safe callers, so the fingerprint check is kept as a tripwire for
//!   internal bugs.
//! - [`Dict::safe_iter`] pauses rehashing on its first step and resumes it
//!   on release, so the two-table topology stays fixed for the whole walk.
//!
//! Either way, a key present for the iterator's whole lifetime is yielded
//! exactly once; keys inserted mid-walk may or may not be seen.

use crate::dict::{Dict, DictType};
use crate::entry::Entry;

/// Iterator over dictionary entries. See the module docs for the
/// plain/safe distinction.
pub struct Iter<'a, T: DictType> {
    dict: &'a Dict<T>,
    table: usize,
    index: i64,
    entry: Option<&'a Entry<T::Key, T::Val>>,
    safe: bool,
    fingerprint: u64,
}

impl<T: DictType> Dict<T> {
    /// Plain iterator: no rehash pause, fingerprint-checked on drop.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            dict: self,
            table: 0,
            index: -1,
            entry: None,
            safe: false,
            fingerprint: self.fingerprint(),
        }
    }

    /// Safe iterator: pauses rehashing from the first step until release.
    pub fn safe_iter(&self) -> Iter<'_, T> {
        Iter {
            dict: self,
            table: 0,
            index: -1,
            entry: None,
            safe: true,
            fingerprint: 0,
        }
    }

    /// Iterator over keys.
    pub fn keys(&self) -> impl Iterator<Item = &T::Key> {
        self.iter().map(Entry::key)
    }
}

impl<'a, T: DictType> Iterator for Iter<'a, T> {
    type Item = &'a Entry<T::Key, T::Val>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.entry {
                self.entry = e.next.as_deref();
                return Some(e);
            }
            if self.index == -1 && self.table == 0 && self.safe {
                self.dict.pause_rehash();
            }
            self.index += 1;
            if self.index >= self.dict.tables[self.table].size() as i64 {
                // Entries migrated out of table 0 land at arbitrary
                // positions under the larger mask, so table 1 is walked
                // from the start.
                if self.dict.is_rehashing() && self.table == 0 {
                    self.table = 1;
                    self.index = 0;
                } else {
                    return None;
                }
            }
            self.entry = self.dict.tables[self.table].buckets[self.index as usize].as_deref();
        }
    }
}

impl<T: DictType> Drop for Iter<'_, T> {
    fn drop(&mut self) {
        let started = !(self.index == -1 && self.table == 0);
        if self.safe {
            if started {
                self.dict.resume_rehash();
            }
        } else {
            assert!(
                self.fingerprint == self.dict.fingerprint(),
                "dictionary changed while a plain iterator was live"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::SipDict;
    use crate::entry::Value;
    use std::collections::HashSet;

    #[test]
    fn test_iter_yields_every_key_once() {
        let mut d: SipDict<u64, ()> = SipDict::new();
        for i in 0..100 {
            d.add(i, Value::U64(i)).unwrap();
        }
        let seen: Vec<u64> = d.iter().map(|e| *e.key()).collect();
        assert_eq!(seen.len(), 100);
        assert_eq!(seen.iter().copied().collect::<HashSet<_>>().len(), 100);
    }

    #[test]
    fn test_iter_spans_both_tables_mid_rehash() {
        let mut d: SipDict<u64, ()> = SipDict::new();
        for i in 0..64 {
            d.add(i, Value::U64(i)).unwrap();
        }
        // Leave the rehash unfinished so entries straddle both tables.
        while d.rehash(100) {}
        d.expand(256).unwrap();
        d.rehash(2);
        assert!(d.is_rehashing());
        assert!(d.tables[0].used > 0 && d.tables[1].used > 0);
        let seen: HashSet<u64> = d.iter().map(|e| *e.key()).collect();
        assert_eq!(seen.len(), 64);
    }

    #[test]
    fn test_safe_iter_pauses_rehash() {
        let mut d: SipDict<u64, ()> = SipDict::new();
        for i in 0..64 {
            d.add(i, Value::U64(i)).unwrap();
        }
        while d.rehash(100) {}
        d.expand(256).unwrap();
        assert!(d.is_rehashing());
        {
            let mut it = d.safe_iter();
            assert!(!d.rehash_paused());
            let _ = it.next();
            assert!(d.rehash_paused());
            while it.next().is_some() {}
        }
        assert!(!d.rehash_paused());
    }

    #[test]
    fn test_unstarted_safe_iter_releases_cleanly() {
        let d: SipDict<u64, ()> = SipDict::new();
        let it = d.safe_iter();
        drop(it);
        assert!(!d.rehash_paused());
    }

    #[test]
    fn test_empty_dict_iterates_nothing() {
        let d: SipDict<u64, ()> = SipDict::new();
        assert_eq!(d.iter().count(), 0);
    }
}
