//! Reverse-binary-iteration scan cursor.
//!
//! `scan` visits one bucket per call and hands the caller an opaque cursor
//! for the next call. The cursor increments the *reversed* high bits of the
//! bucket index, which is what makes the walk survive resizes: a bucket's
//! preimages under a larger mask are visited consecutively, so growing or
//! shrinking between calls can duplicate a little work but never skips a
//! key that was present throughout. While a rehash is in progress both
//! tables are probed, and the cursor advances modulo the larger mask.

use crate::dict::{Bucket, Dict, DictType, Table};
use crate::entry::Entry;

fn scan_bucket<K, V, F, B>(t: &Table<K, V>, idx: usize, f: &mut F, bucket_f: &mut B)
where
    F: FnMut(&Entry<K, V>),
    B: FnMut(Option<&Entry<K, V>>),
{
    let bucket: &Bucket<K, V> = &t.buckets[idx];
    bucket_f(bucket.as_deref());
    let mut cur = bucket.as_deref();
    while let Some(e) = cur {
        f(e);
        cur = e.next.as_deref();
    }
}

impl<T: DictType> Dict<T> {
    /// Visit one bucket's entries and return the cursor for the next call.
    ///
    /// Start with cursor `0`; a returned `0` means the cycle is complete.
    /// Every key present for the whole cycle is yielded at least once; keys
    /// added or removed mid-cycle may be yielded zero, one or twice.
    pub fn scan<F>(&self, cursor: u64, mut f: F) -> u64
    where
        F: FnMut(&Entry<T::Key, T::Val>),
    {
        self.scan_buckets(cursor, &mut f, |_| {})
    }

    /// Like [`scan`](Dict::scan), with an additional per-bucket callback
    /// invoked with each visited bucket's chain head (defragmentation
    /// hook).
    pub fn scan_buckets<F, B>(&self, mut v: u64, mut f: F, mut bucket_f: B) -> u64
    where
        F: FnMut(&Entry<T::Key, T::Val>),
        B: FnMut(Option<&Entry<T::Key, T::Val>>),
    {
        if self.len() == 0 {
            return 0;
        }
        // Freeze the two-table topology for the duration of the call.
        self.pause_rehash();
        if !self.is_rehashing() {
            let t = &self.tables[0];
            let m0 = t.mask();
            scan_bucket(t, (v & m0) as usize, &mut f, &mut bucket_f);
            v |= !m0;
            v = v.reverse_bits().wrapping_add(1).reverse_bits();
        } else {
            let (mut small, mut large) = (0usize, 1usize);
            if self.tables[small].size() > self.tables[large].size() {
                std::mem::swap(&mut small, &mut large);
            }
            let m0 = self.tables[small].mask();
            let m1 = self.tables[large].mask();
            scan_bucket(&self.tables[small], (v & m0) as usize, &mut f, &mut bucket_f);
            loop {
                scan_bucket(&self.tables[large], (v & m1) as usize, &mut f, &mut bucket_f);
                v |= !m1;
                v = v.reverse_bits().wrapping_add(1).reverse_bits();
                if v & (m0 ^ m1) == 0 {
                    break;
                }
            }
        }
        self.resume_rehash();
        v
    }
}
