//! Seeded hashing for dictionary keys.
//!
//! Every provided hash function is SipHash-1-3 keyed from a process-wide
//! 16-byte seed. A host can install the seed once at startup with
//! [`set_hash_seed`]; if nothing does, the first hash computation draws a
//! random one. Either way the seed is fixed for the life of the process so
//! hashes stay comparable across tables.

use std::hash::{Hash, Hasher};

use once_cell::sync::OnceCell;
use rand::RngCore;
use siphasher::sip::SipHasher13;

static HASH_SEED: OnceCell<[u8; 16]> = OnceCell::new();

/// Install the process-wide hash seed.
///
/// Returns `false` if a seed was already in place (explicitly installed, or
/// lazily drawn by an earlier hash computation).
pub fn set_hash_seed(seed: [u8; 16]) -> bool {
    HASH_SEED.set(seed).is_ok()
}

/// The active process-wide hash seed.
pub fn hash_seed() -> [u8; 16] {
    *HASH_SEED.get_or_init(|| {
        let mut seed = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut seed);
        seed
    })
}

#[inline]
fn seed_keys() -> (u64, u64) {
    let seed = hash_seed();
    let k0 = u64::from_le_bytes(seed[..8].try_into().unwrap());
    let k1 = u64::from_le_bytes(seed[8..].try_into().unwrap());
    (k0, k1)
}

/// Hash an arbitrary byte string.
pub fn gen_hash(data: &[u8]) -> u64 {
    let (k0, k1) = seed_keys();
    let mut h = SipHasher13::new_with_keys(k0, k1);
    h.write(data);
    h.finish()
}

/// Case-insensitive variant of [`gen_hash`] (ASCII folding).
pub fn gen_case_hash(data: &[u8]) -> u64 {
    let (k0, k1) = seed_keys();
    let mut h = SipHasher13::new_with_keys(k0, k1);
    for &b in data {
        h.write_u8(b.to_ascii_lowercase());
    }
    h.finish()
}

/// Hash any `Hash` key with the seeded SipHash-1-3.
pub fn hash_of<K: Hash + ?Sized>(key: &K) -> u64 {
    let (k0, k1) = seed_keys();
    let mut h = SipHasher13::new_with_keys(k0, k1);
    key.hash(&mut h);
    h.finish()
}
