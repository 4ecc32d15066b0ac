//! The dictionary core: two bucket tables, an incremental rehash driver,
//! and the grow/shrink policy.
//!
//! A dictionary always owns exactly two tables. At rest only table 0 is
//! allocated. A resize allocates table 1 at the new size and sets the
//! `rehash_idx` cursor to 0; from then on every mutating or probing
//! operation migrates a little work until table 0 drains, at which point
//! table 1 is promoted into slot 0. Entries with a bucket index below
//! `rehash_idx` are guaranteed to live in table 1 already.

use std::cell::Cell;
use std::cmp;
use std::hash::Hash;
use std::marker::PhantomData;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::entry::{Entry, Value};
use crate::error::DictError;
use crate::hash;

/// Initial table size for the first allocation and the shrink floor.
pub(crate) const INITIAL_SIZE: usize = 4;
const INITIAL_EXP: i8 = 2;
/// Load ratio that forces growth even while auto-resize is disabled.
const FORCE_RESIZE_RATIO: usize = 5;
/// Empty buckets visited per unit of rehash work.
const EMPTY_VISITS_PER_STEP: usize = 10;
/// Buckets cleared between callback invocations in [`Dict::clear_with`].
const CLEAR_CALLBACK_STRIDE: usize = 65_536;

static RESIZE_ENABLED: AtomicBool = AtomicBool::new(true);

/// Allow automatic table growth again after [`disable_resize`].
pub fn enable_resize() {
    RESIZE_ENABLED.store(true, Ordering::Relaxed);
}

/// Suppress automatic table growth process-wide.
///
/// Intended for fork windows: while a child process shares pages with the
/// parent, growing tables would touch large copy-on-write regions. Explicit
/// [`Dict::expand`] is unaffected, and a table whose load reaches five times
/// its size still grows.
pub fn disable_resize() {
    RESIZE_ENABLED.store(false, Ordering::Relaxed);
}

pub(crate) fn resize_enabled() -> bool {
    RESIZE_ENABLED.load(Ordering::Relaxed)
}

/// Per-dictionary hook table.
///
/// One implementation is shared by every dictionary of that type and must
/// stay stable for a dictionary's lifetime. Keys and values are owned by
/// the dictionary; dropping an entry drops both, so there are no destructor
/// or dup hooks.
pub trait DictType {
    /// Key type stored by dictionaries of this type.
    type Key;
    /// Payload type of the owned-value variant of the value slot.
    type Val;

    /// Hash a key.
    fn hash(&self, key: &Self::Key) -> u64;

    /// Key equivalence. Must agree with `hash`.
    fn key_eq(&self, a: &Self::Key, b: &Self::Key) -> bool;

    /// Whether an automatic grow that would allocate `more_mem` additional
    /// bytes is admissible at the given load ratio.
    fn expand_allowed(&self, _more_mem: usize, _used_ratio: f64) -> bool {
        true
    }

    /// Size in bytes of the per-entry caller metadata region.
    fn metadata_bytes(&self) -> usize {
        0
    }
}

/// Default type for any `Hash + Eq` key: seeded SipHash-1-3 and `==`.
pub struct SipHashType<K, V>(PhantomData<fn() -> (K, V)>);

impl<K, V> Default for SipHashType<K, V> {
    fn default() -> Self {
        SipHashType(PhantomData)
    }
}

impl<K: Hash + Eq, V> DictType for SipHashType<K, V> {
    type Key = K;
    type Val = V;

    fn hash(&self, key: &K) -> u64 {
        hash::hash_of(key)
    }

    fn key_eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Dictionary over the default SipHash type.
pub type SipDict<K, V> = Dict<SipHashType<K, V>>;

pub(crate) type Bucket<K, V> = Option<Box<Entry<K, V>>>;

pub(crate) struct Table<K, V> {
    pub(crate) buckets: Box<[Bucket<K, V>]>,
    pub(crate) used: usize,
    pub(crate) size_exp: i8,
}

impl<K, V> Table<K, V> {
    fn unallocated() -> Self {
        Table {
            buckets: Box::default(),
            used: 0,
            size_exp: -1,
        }
    }

    fn with_exp(exp: i8) -> Self {
        let size = 1usize << exp;
        let buckets: Vec<Bucket<K, V>> = (0..size).map(|_| None).collect();
        Table {
            buckets: buckets.into_boxed_slice(),
            used: 0,
            size_exp: exp,
        }
    }

    fn try_with_exp(exp: i8) -> Result<Self, DictError> {
        let size = 1usize << exp;
        let mut buckets: Vec<Bucket<K, V>> = Vec::new();
        buckets
            .try_reserve_exact(size)
            .map_err(|_| DictError::NoMem)?;
        buckets.extend((0..size).map(|_| None));
        Ok(Table {
            buckets: buckets.into_boxed_slice(),
            used: 0,
            size_exp: exp,
        })
    }

    pub(crate) fn size(&self) -> usize {
        if self.size_exp < 0 {
            0
        } else {
            1usize << self.size_exp
        }
    }

    pub(crate) fn mask(&self) -> u64 {
        if self.size_exp < 0 {
            0
        } else {
            (1u64 << self.size_exp) - 1
        }
    }
}

impl<K, V> Drop for Table<K, V> {
    fn drop(&mut self) {
        // Chains are dropped iteratively; a pathological bucket could
        // otherwise overflow the stack through recursive Box drops.
        for bucket in self.buckets.iter_mut() {
            drop_chain(bucket.take());
        }
    }
}

pub(crate) fn drop_chain<K, V>(mut chain: Bucket<K, V>) {
    while let Some(mut e) = chain {
        chain = e.next.take();
    }
}

/// Smallest exponent whose table holds at least `size` buckets.
fn next_exp(size: usize) -> i8 {
    if size <= INITIAL_SIZE {
        return INITIAL_EXP;
    }
    (usize::BITS - (size - 1).leading_zeros()) as i8
}

/// Aggregate statistics for one table.
#[derive(Debug, Clone, Default)]
pub struct TableStats {
    /// Bucket count.
    pub size: usize,
    /// Stored entries.
    pub used: usize,
    /// Buckets with at least one entry.
    pub non_empty_buckets: usize,
    /// Longest chain.
    pub max_chain_len: usize,
    /// Chain-length histogram; the last slot counts chains of 15 or more.
    pub chain_lengths: [usize; 16],
}

/// Statistics for a dictionary's table pair.
#[derive(Debug, Clone)]
pub struct DictStats {
    /// The main table.
    pub main: TableStats,
    /// The rehash destination table, while a rehash is in progress.
    pub rehashing: Option<TableStats>,
}

/// An incrementally-rehashing chained hash table.
pub struct Dict<T: DictType> {
    pub(crate) dtype: T,
    pub(crate) tables: [Table<T::Key, T::Val>; 2],
    pub(crate) rehash_idx: i64,
    pub(crate) pause_rehash: Cell<i32>,
}

impl<T: DictType + Default> Dict<T> {
    /// Create an empty dictionary with the type's default hook table.
    pub fn new() -> Self {
        Self::with_type(T::default())
    }
}

impl<T: DictType + Default> Default for Dict<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DictType> Dict<T> {
    /// Create an empty dictionary. No table is allocated until the first
    /// insertion or an explicit [`expand`](Dict::expand).
    pub fn with_type(dtype: T) -> Self {
        Dict {
            dtype,
            tables: [Table::unallocated(), Table::unallocated()],
            rehash_idx: -1,
            pause_rehash: Cell::new(0),
        }
    }

    /// The hook table this dictionary was created with.
    pub fn dict_type(&self) -> &T {
        &self.dtype
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.tables[0].used + self.tables[1].used
    }

    /// True if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bucket count across both tables.
    pub fn slots(&self) -> usize {
        self.tables[0].size() + self.tables[1].size()
    }

    /// True while an incremental rehash is in progress.
    pub fn is_rehashing(&self) -> bool {
        self.rehash_idx != -1
    }

    /// The next table-0 bucket to migrate, or -1 at rest.
    pub fn rehash_index(&self) -> i64 {
        self.rehash_idx
    }

    /// Hash a key with this dictionary's hash hook.
    pub fn hash_key(&self, key: &T::Key) -> u64 {
        self.dtype.hash(key)
    }

    /// Forbid incremental migration steps until the matching
    /// [`resume_rehash`](Dict::resume_rehash). Re-entrant.
    pub fn pause_rehash(&self) {
        self.pause_rehash.set(self.pause_rehash.get() + 1);
    }

    /// Undo one [`pause_rehash`](Dict::pause_rehash).
    ///
    /// # Panics
    ///
    /// Panics on underflow; an unbalanced resume is a programming error.
    pub fn resume_rehash(&self) {
        let p = self.pause_rehash.get() - 1;
        assert!(p >= 0, "rehash pause counter underflow");
        self.pause_rehash.set(p);
    }

    /// True while migration steps are forbidden.
    pub fn rehash_paused(&self) -> bool {
        self.pause_rehash.get() > 0
    }

    /// Grow (or shrink) toward the smallest power of two holding `size`
    /// buckets. Aborts the process on allocation failure.
    pub fn expand(&mut self, size: usize) -> Result<(), DictError> {
        self.expand_inner(size, false)
    }

    /// Like [`expand`](Dict::expand), but allocation failure is reported as
    /// [`DictError::NoMem`] instead of aborting.
    pub fn try_expand(&mut self, size: usize) -> Result<(), DictError> {
        self.expand_inner(size, true)
    }

    fn expand_inner(&mut self, size: usize, try_alloc: bool) -> Result<(), DictError> {
        if self.is_rehashing() {
            return Err(DictError::Rehashing);
        }
        let target = cmp::max(size, self.tables[0].used);
        let exp = next_exp(target);
        if exp == self.tables[0].size_exp {
            // Already at that size.
            return Ok(());
        }
        let table = if try_alloc {
            Table::try_with_exp(exp)?
        } else {
            Table::with_exp(exp)
        };
        debug!(
            from = self.tables[0].size(),
            to = table.size(),
            "resizing hash table"
        );
        if self.tables[0].size_exp < 0 {
            // First allocation: nothing to migrate, install directly.
            self.tables[0] = table;
        } else {
            self.tables[1] = table;
            self.rehash_idx = 0;
        }
        Ok(())
    }

    /// Shrink toward the current usage (floor 4). Fails while rehashing or
    /// when resizing is disallowed.
    pub fn resize(&mut self) -> Result<(), DictError> {
        if !resize_enabled() {
            return Err(DictError::ResizeForbidden);
        }
        if self.is_rehashing() {
            return Err(DictError::Rehashing);
        }
        let minimal = cmp::max(self.tables[0].used, INITIAL_SIZE);
        let exp = next_exp(minimal);
        let more_mem = mem::size_of::<Bucket<T::Key, T::Val>>() << cmp::max(exp, 0);
        let used = self.tables[0].used;
        let size = cmp::max(self.tables[0].size(), 1);
        if !self.dtype.expand_allowed(more_mem, used as f64 / size as f64) {
            return Err(DictError::ResizeForbidden);
        }
        self.expand(minimal)
    }

    /// Perform up to `n` units of incremental rehashing, where one unit
    /// migrates one non-empty bucket. At most `10 * n` empty buckets are
    /// visited per call so a sparse tail cannot stall the caller.
    ///
    /// Returns `true` while more migration work remains. A paused
    /// dictionary reports `false` without doing anything.
    pub fn rehash(&mut self, n: usize) -> bool {
        if self.rehash_paused() || !self.is_rehashing() {
            return false;
        }
        let mut empty_visits = n * EMPTY_VISITS_PER_STEP;
        let mut remaining = n;
        while remaining > 0 && self.tables[0].used != 0 {
            // The cursor never runs off the table while entries remain.
            while self.tables[0].buckets[self.rehash_idx as usize].is_none() {
                self.rehash_idx += 1;
                empty_visits -= 1;
                if empty_visits == 0 {
                    return true;
                }
            }
            let idx = self.rehash_idx as usize;
            let mut chain = self.tables[0].buckets[idx].take();
            while let Some(mut e) = chain {
                chain = e.next.take();
                let h = self.dtype.hash(&e.key);
                let didx = (h & self.tables[1].mask()) as usize;
                e.next = self.tables[1].buckets[didx].take();
                self.tables[1].buckets[didx] = Some(e);
                self.tables[0].used -= 1;
                self.tables[1].used += 1;
            }
            self.rehash_idx += 1;
            remaining -= 1;
        }
        if self.tables[0].used == 0 {
            self.tables[0] = mem::replace(&mut self.tables[1], Table::unallocated());
            self.rehash_idx = -1;
            debug!(size = self.tables[0].size(), "incremental rehash complete");
            return false;
        }
        true
    }

    /// Rehash in bursts of 100 units until roughly `ms` milliseconds of
    /// wall clock have elapsed. Returns the number of units performed.
    pub fn rehash_ms(&mut self, ms: u64) -> usize {
        if self.rehash_paused() {
            return 0;
        }
        let budget = Duration::from_millis(ms);
        let start = Instant::now();
        let mut units = 0;
        while self.rehash(100) {
            units += 100;
            if start.elapsed() >= budget {
                break;
            }
        }
        units
    }

    /// One bounded migration step, called from the top of mutating and
    /// probing operations.
    pub(crate) fn rehash_step(&mut self) {
        if !self.rehash_paused() {
            self.rehash(1);
        }
    }

    /// Growth policy, evaluated before an insertion picks its bucket.
    fn expand_if_needed(&mut self) {
        if self.is_rehashing() {
            return;
        }
        if self.tables[0].size_exp < 0 {
            // Ignoring the result: the non-try allocation path aborts.
            let _ = self.expand(INITIAL_SIZE);
            return;
        }
        let used = self.tables[0].used;
        let size = self.tables[0].size();
        if used >= size && (resize_enabled() || used / size >= FORCE_RESIZE_RATIO) {
            let new_size = 1usize << next_exp(used + 1);
            let more_mem = mem::size_of::<Bucket<T::Key, T::Val>>() * new_size;
            if self.dtype.expand_allowed(more_mem, used as f64 / size as f64) {
                let _ = self.expand(used + 1);
            }
        }
    }

    /// Locate an existing key as (table, bucket, chain position).
    fn locate(&self, h: u64, key: &T::Key) -> Option<(usize, usize, usize)> {
        for ti in 0..2 {
            let t = &self.tables[ti];
            if t.size() == 0 {
                if self.is_rehashing() {
                    continue;
                }
                break;
            }
            let idx = (h & t.mask()) as usize;
            let mut pos = 0;
            let mut cur = t.buckets[idx].as_deref();
            while let Some(e) = cur {
                if self.dtype.key_eq(&e.key, key) {
                    return Some((ti, idx, pos));
                }
                pos += 1;
                cur = e.next.as_deref();
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    pub(crate) fn entry_at(&self, loc: (usize, usize, usize)) -> &Entry<T::Key, T::Val> {
        let (ti, idx, pos) = loc;
        let mut e = self.tables[ti].buckets[idx].as_deref().unwrap();
        for _ in 0..pos {
            e = e.next.as_deref().unwrap();
        }
        e
    }

    fn entry_at_mut(&mut self, loc: (usize, usize, usize)) -> &mut Entry<T::Key, T::Val> {
        let (ti, idx, pos) = loc;
        let mut e = self.tables[ti].buckets[idx].as_deref_mut().unwrap();
        for _ in 0..pos {
            e = e.next.as_deref_mut().unwrap();
        }
        e
    }

    /// Low-level insert. Returns the entry for `key` and whether it already
    /// existed. A fresh entry has an empty value slot and zeroed metadata;
    /// the caller is expected to assign a value.
    pub fn add_raw(&mut self, key: T::Key) -> (&mut Entry<T::Key, T::Val>, bool) {
        if self.is_rehashing() {
            self.rehash_step();
        }
        let h = self.dtype.hash(&key);
        if let Some(loc) = self.locate(h, &key) {
            return (self.entry_at_mut(loc), true);
        }
        self.expand_if_needed();
        // While rehashing, fresh entries go straight to the destination
        // table so table 0 only ever drains.
        let target = if self.is_rehashing() { 1 } else { 0 };
        let idx = (h & self.tables[target].mask()) as usize;
        let mut entry = Box::new(Entry::new(key, self.dtype.metadata_bytes()));
        entry.next = self.tables[target].buckets[idx].take();
        self.tables[target].buckets[idx] = Some(entry);
        self.tables[target].used += 1;
        (
            self.tables[target].buckets[idx].as_deref_mut().unwrap(),
            false,
        )
    }

    /// Insert a key with a value. Fails with [`DictError::Exists`] if the
    /// key is present, leaving the stored value untouched.
    pub fn add(&mut self, key: T::Key, val: Value<T::Val>) -> Result<(), DictError> {
        let (entry, existing) = self.add_raw(key);
        if existing {
            return Err(DictError::Exists);
        }
        entry.set_value(val);
        Ok(())
    }

    /// Insert or overwrite. Returns `true` when the key was new.
    pub fn replace(&mut self, key: T::Key, val: Value<T::Val>) -> bool {
        let (entry, existing) = self.add_raw(key);
        // Store the new value before dropping the old one so replacing a
        // shared handle with itself stays safe.
        let old = entry.set_value(val);
        drop(old);
        !existing
    }

    /// Insert `key` if absent, then return its entry either way.
    pub fn add_or_find(&mut self, key: T::Key) -> &mut Entry<T::Key, T::Val> {
        self.add_raw(key).0
    }

    /// Look a key up. Drives one rehash step first.
    pub fn find(&mut self, key: &T::Key) -> Option<&Entry<T::Key, T::Val>> {
        if self.len() == 0 {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let h = self.dtype.hash(key);
        self.locate(h, key).map(|loc| self.entry_at(loc))
    }

    /// Look a key up, with mutable access to its entry.
    pub fn find_mut(&mut self, key: &T::Key) -> Option<&mut Entry<T::Key, T::Val>> {
        if self.len() == 0 {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let h = self.dtype.hash(key);
        self.locate(h, key).map(|loc| self.entry_at_mut(loc))
    }

    /// The value stored for a key, if any.
    pub fn fetch_value(&mut self, key: &T::Key) -> Option<&Value<T::Val>> {
        self.find(key).and_then(Entry::value)
    }

    /// Remove an entry from its chain without destroying it. The returned
    /// box owns the entry; dropping it frees key and value.
    pub fn unlink(&mut self, key: &T::Key) -> Option<Box<Entry<T::Key, T::Val>>> {
        if self.len() == 0 {
            return None;
        }
        if self.is_rehashing() {
            self.rehash_step();
        }
        let h = self.dtype.hash(key);
        let (ti, idx, pos) = self.locate(h, key)?;
        let mut link = &mut self.tables[ti].buckets[idx];
        for _ in 0..pos {
            link = &mut link.as_deref_mut().unwrap().next;
        }
        let mut removed = link.take().unwrap();
        *link = removed.next.take();
        self.tables[ti].used -= 1;
        Some(removed)
    }

    /// Remove and destroy an entry.
    pub fn delete(&mut self, key: &T::Key) -> Result<(), DictError> {
        self.unlink(key).map(drop).ok_or(DictError::NotFound)
    }

    /// Remove every entry, keeping the dictionary usable.
    pub fn clear(&mut self) {
        self.clear_with(|| {});
    }

    /// Like [`clear`](Dict::clear); `callback` is invoked once per 65 536
    /// buckets so a host tearing down a huge keyspace can yield.
    pub fn clear_with<F: FnMut()>(&mut self, mut callback: F) {
        let mut visited = 0usize;
        for t in self.tables.iter_mut() {
            for bucket in t.buckets.iter_mut() {
                if visited & (CLEAR_CALLBACK_STRIDE - 1) == 0 {
                    callback();
                }
                visited += 1;
                drop_chain(bucket.take());
            }
        }
        self.tables = [Table::unallocated(), Table::unallocated()];
        self.rehash_idx = -1;
        self.pause_rehash.set(0);
    }

    /// Chain-length statistics for both tables.
    pub fn stats(&self) -> DictStats {
        DictStats {
            main: table_stats(&self.tables[0]),
            rehashing: if self.is_rehashing() {
                Some(table_stats(&self.tables[1]))
            } else {
                None
            },
        }
    }

    /// Deterministic digest of the structural fields, used to detect
    /// mutation across a plain iterator's lifetime.
    pub(crate) fn fingerprint(&self) -> u64 {
        let words = [
            self.tables[0].buckets.as_ptr() as u64,
            self.tables[0].size() as u64,
            self.tables[0].used as u64,
            self.tables[1].buckets.as_ptr() as u64,
            self.tables[1].size() as u64,
            self.tables[1].used as u64,
        ];
        let mut h: u64 = 0;
        for w in words {
            // Tomas Wang's 64-bit integer mix, applied per word.
            h = h.wrapping_add(w);
            h = (!h).wrapping_add(h << 21);
            h ^= h >> 24;
            h = h.wrapping_add(h << 3).wrapping_add(h << 8);
            h ^= h >> 14;
            h = h.wrapping_add(h << 2).wrapping_add(h << 4);
            h ^= h >> 28;
            h = h.wrapping_add(h << 31);
        }
        h
    }
}

fn table_stats<K, V>(t: &Table<K, V>) -> TableStats {
    let mut stats = TableStats {
        size: t.size(),
        used: t.used,
        ..TableStats::default()
    };
    for bucket in t.buckets.iter() {
        let mut len = 0;
        let mut cur = bucket.as_deref();
        while let Some(e) = cur {
            len += 1;
            cur = e.next.as_deref();
        }
        if len > 0 {
            stats.non_empty_buckets += 1;
            stats.max_chain_len = cmp::max(stats.max_chain_len, len);
            stats.chain_lengths[cmp::min(len, 15)] += 1;
        } else {
            stats.chain_lengths[0] += 1;
        }
    }
    stats
}
