//! Random entry sampling, used by hosts for eviction candidate pools.

use rand::Rng;

use crate::dict::{Dict, DictType};
use crate::entry::Entry;

/// Cluster width for the fairness-improved picker.
const FAIR_SAMPLE_WIDTH: usize = 15;

impl<T: DictType> Dict<T> {
    /// Pick a random entry: a random non-empty bucket, then a random chain
    /// position. Amortized-uniform; long chains are slightly favored per
    /// element.
    pub fn random_entry(&mut self) -> Option<&Entry<T::Key, T::Val>> {
        if self.len() == 0 {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let mut rng = rand::thread_rng();
        let (ti, idx) = if self.is_rehashing() {
            let s0 = self.tables[0].size() as u64;
            let s1 = self.tables[1].size() as u64;
            let ri = self.rehash_idx as u64;
            loop {
                // Buckets below the rehash cursor are already drained.
                let h = ri + rng.gen_range(0..s0 + s1 - ri);
                let (ti, idx) = if h >= s0 {
                    (1, (h - s0) as usize)
                } else {
                    (0, h as usize)
                };
                if self.tables[ti].buckets[idx].is_some() {
                    break (ti, idx);
                }
            }
        } else {
            let m = self.tables[0].mask();
            loop {
                let idx = (rng.gen::<u64>() & m) as usize;
                if self.tables[0].buckets[idx].is_some() {
                    break (0, idx);
                }
            }
        };
        let mut chain_len = 0;
        let mut cur = self.tables[ti].buckets[idx].as_deref();
        while let Some(e) = cur {
            chain_len += 1;
            cur = e.next.as_deref();
        }
        let pos = rng.gen_range(0..chain_len);
        Some(self.entry_at((ti, idx, pos)))
    }

    /// Like [`random_entry`](Dict::random_entry), but samples a cluster of
    /// candidates first to reduce chain-length bias.
    pub fn fair_random_entry(&mut self) -> Option<&Entry<T::Key, T::Val>> {
        let positions = self.sample_positions(FAIR_SAMPLE_WIDTH);
        if positions.is_empty() {
            return self.random_entry();
        }
        let pick = rand::thread_rng().gen_range(0..positions.len());
        Some(self.entry_at(positions[pick]))
    }

    /// Sample up to `count` entries by cluster sampling: a random start
    /// bucket, then consecutive buckets until enough entries are found.
    /// Entries are not guaranteed unique across calls and the result may be
    /// shorter than `count` for sparse tables.
    pub fn some_entries(&mut self, count: usize) -> Vec<&Entry<T::Key, T::Val>> {
        let positions = self.sample_positions(count);
        positions.into_iter().map(|p| self.entry_at(p)).collect()
    }

    /// Positions are (table, bucket, chain index) triples, valid until the
    /// next mutation.
    fn sample_positions(&mut self, mut count: usize) -> Vec<(usize, usize, usize)> {
        count = count.min(self.len());
        if count == 0 {
            return Vec::new();
        }
        let mut maxsteps = count * 10;
        for _ in 0..count {
            if self.is_rehashing() {
                self.rehash_step();
            } else {
                break;
            }
        }
        let tables = if self.is_rehashing() { 2 } else { 1 };
        let mut maxsizemask = self.tables[0].mask();
        if tables > 1 {
            maxsizemask = maxsizemask.max(self.tables[1].mask());
        }
        let mut rng = rand::thread_rng();
        let mut i = rng.gen::<u64>() & maxsizemask;
        let mut emptylen = 0usize;
        let mut out = Vec::with_capacity(count);
        while out.len() < count && maxsteps > 0 {
            maxsteps -= 1;
            for ti in 0..tables {
                // Invariant: table-0 buckets below the rehash cursor are
                // empty, so skip them (or wrap onto the cursor when the
                // index is past the small table entirely).
                if tables == 2 && ti == 0 && i < self.rehash_idx as u64 {
                    if i >= self.tables[1].size() as u64 {
                        i = self.rehash_idx as u64;
                    } else {
                        continue;
                    }
                }
                if i >= self.tables[ti].size() as u64 {
                    continue;
                }
                match self.tables[ti].buckets[i as usize].as_deref() {
                    None => {
                        emptylen += 1;
                        if emptylen >= 5 && emptylen > count {
                            i = rng.gen::<u64>() & maxsizemask;
                            emptylen = 0;
                        }
                    }
                    Some(mut e) => {
                        emptylen = 0;
                        let mut pos = 0;
                        loop {
                            out.push((ti, i as usize, pos));
                            if out.len() == count {
                                return out;
                            }
                            match e.next.as_deref() {
                                Some(n) => {
                                    e = n;
                                    pos += 1;
                                }
                                None => break,
                            }
                        }
                    }
                }
            }
            i = (i + 1) & maxsizemask;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::dict::SipDict;
    use crate::entry::Value;
    use std::collections::HashSet;

    #[test]
    fn test_random_entry_returns_live_keys() {
        let mut d: SipDict<u64, u64> = SipDict::new();
        for i in 0..100 {
            d.add(i, Value::U64(i)).unwrap();
        }
        for _ in 0..50 {
            let k = *d.random_entry().unwrap().key();
            assert!(k < 100);
        }
    }

    #[test]
    fn test_random_entry_on_empty_dict() {
        let mut d: SipDict<u64, u64> = SipDict::new();
        assert!(d.random_entry().is_none());
        assert!(d.fair_random_entry().is_none());
        assert!(d.some_entries(10).is_empty());
    }

    #[test]
    fn test_some_entries_bounded_by_len() {
        let mut d: SipDict<u64, u64> = SipDict::new();
        for i in 0..7 {
            d.add(i, Value::U64(i)).unwrap();
        }
        let sample = d.some_entries(100);
        assert!(sample.len() <= 7);
        assert!(!sample.is_empty());
        for e in &sample {
            assert!(*e.key() < 7);
        }
    }

    #[test]
    fn test_random_entry_eventually_covers_small_dict() {
        let mut d: SipDict<u64, u64> = SipDict::new();
        for i in 0..4 {
            d.add(i, Value::U64(i)).unwrap();
        }
        let mut seen = HashSet::new();
        for _ in 0..400 {
            seen.insert(*d.random_entry().unwrap().key());
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_sampling_during_rehash() {
        let mut d: SipDict<u64, u64> = SipDict::new();
        for i in 0..256 {
            d.add(i, Value::U64(i)).unwrap();
        }
        while d.rehash(100) {}
        d.expand(2048).unwrap();
        d.rehash(2);
        assert!(d.is_rehashing());
        let sample = d.some_entries(32);
        assert!(!sample.is_empty());
        for e in &sample {
            assert!(*e.key() < 256);
        }
    }
}
