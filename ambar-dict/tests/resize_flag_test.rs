//! Tests for the process-wide auto-resize switch. Kept in their own binary
//! because the flag is global state shared by every test thread.

use ambar_dict::{disable_resize, enable_resize, SipDict, Value};

#[test]
fn test_disable_resize_defers_growth_until_forced() {
    disable_resize();

    let mut d: SipDict<u64, u64> = SipDict::new();
    // The first allocation still happens; only growth is suppressed.
    for i in 0..8 {
        d.add(i, Value::U64(i)).unwrap();
    }
    assert_eq!(d.slots(), 4);
    assert!(!d.is_rehashing());

    // Explicit expansion ignores the flag.
    let mut explicit: SipDict<u64, u64> = SipDict::new();
    explicit.expand(64).unwrap();
    assert_eq!(explicit.slots(), 64);

    // At five times the table size, growth happens anyway to keep chains
    // bounded.
    for i in 8..21 {
        d.add(i, Value::U64(i)).unwrap();
    }
    assert!(d.is_rehashing());

    enable_resize();
    while d.rehash(100) {}
    assert_eq!(d.len(), 21);
    for i in 0..21 {
        assert_eq!(d.fetch_value(&i).and_then(|v| v.as_u64()), Some(i));
    }
}
