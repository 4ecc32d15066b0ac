//! A miniature keyspace: fill a dictionary, watch the incremental rehash,
//! then scan it without blocking.

use ambar_dict::{SipDict, Value};

fn main() {
    let mut d: SipDict<String, ()> = SipDict::new();

    for i in 0..10_000u64 {
        d.add(format!("user:{i}"), Value::U64(i)).unwrap();
    }
    println!(
        "{} keys over {} buckets, rehashing: {}",
        d.len(),
        d.slots(),
        d.is_rehashing()
    );

    // Spread the remaining migration over 1ms time slices, as an event
    // loop would between commands.
    let mut slices = 0;
    while d.is_rehashing() {
        d.rehash_ms(1);
        slices += 1;
    }
    println!("migration finished after {slices} time slices");

    // Cursor-based scan: the host can mutate between calls.
    let mut cursor = 0;
    let mut visited = 0usize;
    loop {
        cursor = d.scan(cursor, |_| visited += 1);
        if cursor == 0 {
            break;
        }
    }
    println!("scan visited {visited} entries");

    let sample = d.some_entries(5);
    println!(
        "eviction candidates: {:?}",
        sample.iter().map(|e| e.key().as_str()).collect::<Vec<_>>()
    );
}
