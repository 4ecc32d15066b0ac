use ambar_dict::{SipDict, Value};
use std::collections::HashSet;

#[test]
fn test_rehash_preserves_live_keys() {
    let mut d: SipDict<u64, u64> = SipDict::new();
    for i in 0..500 {
        d.add(i, Value::U64(i * 2)).unwrap();
        // Interleave explicit migration work with the inserts.
        if i % 10 == 0 {
            d.rehash(2);
        }
    }
    assert_eq!(d.len(), 500);
    for i in 0..500 {
        assert_eq!(d.fetch_value(&i).and_then(|v| v.as_u64()), Some(i * 2));
    }
}

#[test]
fn test_load_triggers_growth() {
    let mut d: SipDict<u64, ()> = SipDict::new();
    for i in 0..4 {
        d.add(i, Value::U64(i)).unwrap();
    }
    assert!(!d.is_rehashing());
    // The insert that finds used == size starts a rehash.
    d.add(4, Value::U64(4)).unwrap();
    assert!(d.is_rehashing());
    assert!(d.rehash_index() >= 0);

    while d.rehash(100) {}
    assert!(d.slots() >= d.len());
}

#[test]
fn test_pause_freezes_migration_cursor() {
    let mut d: SipDict<u64, u64> = SipDict::new();
    for i in 0..256 {
        d.add(i, Value::U64(i)).unwrap();
    }
    while d.rehash(100) {}
    d.expand(2048).unwrap();
    d.rehash(3);
    assert!(d.is_rehashing());
    let frozen = d.rehash_index();

    d.pause_rehash();
    assert!(!d.rehash(5));
    assert_eq!(d.rehash_index(), frozen);
    // Probing operations normally migrate a step; not while paused.
    let _ = d.find(&0);
    assert_eq!(d.rehash_index(), frozen);

    d.resume_rehash();
    d.rehash(1);
    assert!(d.rehash_index() != frozen || !d.is_rehashing());
}

#[test]
fn test_nested_pause_needs_matching_resumes() {
    let mut d: SipDict<u64, u64> = SipDict::new();
    for i in 0..64 {
        d.add(i, Value::U64(i)).unwrap();
    }
    while d.rehash(100) {}
    d.expand(1024).unwrap();

    d.pause_rehash();
    d.pause_rehash();
    d.resume_rehash();
    assert!(d.rehash_paused());
    assert!(!d.rehash(1));
    d.resume_rehash();
    assert!(!d.rehash_paused());
    assert!(d.rehash(1) || !d.is_rehashing());
}

#[test]
fn test_lookups_drive_migration_to_completion() {
    let mut d: SipDict<u64, u64> = SipDict::new();
    for i in 0..128 {
        d.add(i, Value::U64(i)).unwrap();
    }
    while d.rehash(100) {}
    d.expand(1024).unwrap();
    assert!(d.is_rehashing());
    // Every probe moves at least one bucket; enough probes finish the job.
    for _ in 0..4096 {
        let _ = d.find(&1);
        if !d.is_rehashing() {
            break;
        }
    }
    assert!(!d.is_rehashing());
    assert_eq!(d.len(), 128);
}

#[test]
fn test_rehash_ms_reports_work() {
    let mut d: SipDict<u64, u64> = SipDict::new();
    for i in 0..4096 {
        d.add(i, Value::U64(i)).unwrap();
    }
    while d.rehash(100) {}
    d.expand(1 << 15).unwrap();
    assert!(d.is_rehashing());
    let units = d.rehash_ms(50);
    assert!(units > 0);
    while d.rehash(100) {}
    assert_eq!(d.len(), 4096);
}

#[test]
fn test_shrink_after_mass_deletion() {
    let mut d: SipDict<u64, u64> = SipDict::new();
    for i in 0..4096 {
        d.add(i, Value::U64(i)).unwrap();
    }
    while d.rehash(1000) {}
    let big = d.slots();

    for i in 16..4096 {
        d.delete(&i).unwrap();
    }
    d.resize().unwrap();
    while d.rehash(1000) {}
    assert!(d.slots() < big);
    assert_eq!(d.len(), 16);

    let seen: HashSet<u64> = d.iter().map(|e| *e.key()).collect();
    assert_eq!(seen, (0..16).collect());
}

#[test]
fn test_insert_during_rehash_lands_in_new_table() {
    let mut d: SipDict<u64, u64> = SipDict::new();
    for i in 0..64 {
        d.add(i, Value::U64(i)).unwrap();
    }
    while d.rehash(100) {}
    d.expand(1024).unwrap();
    assert!(d.is_rehashing());
    d.add(1000, Value::U64(1000)).unwrap();
    // New keys must be findable immediately, mid-migration.
    assert_eq!(d.fetch_value(&1000).and_then(|v| v.as_u64()), Some(1000));
    while d.rehash(100) {}
    assert_eq!(d.len(), 65);
}
