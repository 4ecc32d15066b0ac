//! An append-mostly journal: dense packed nodes, cold interior kept
//! compressed, a bookmark for resumable replay.

use ambar_quicklist::{Direction, Quicklist, Where};

fn main() {
    let mut log = Quicklist::with_options(128, 2);
    for i in 0..50_000 {
        log.push_tail(format!("event-{i:08}").as_bytes());
    }

    let compressed = log.nodes().filter(|v| v.is_compressed).count();
    let raw_bytes: usize = log.nodes().map(|v| v.bytes).sum();
    println!(
        "{} events in {} nodes ({} compressed, {} KiB raw payload)",
        log.count(),
        log.len(),
        compressed,
        raw_bytes / 1024
    );

    // Remember where replay stopped.
    log.bookmark_create("replay", 25_000).unwrap();

    // Consume a little from the head, like a trimming job would.
    for _ in 0..100 {
        log.pop(Where::Head);
    }

    // Resume from the bookmark; the node decompresses for the walk and
    // recompresses when the iterator drops.
    let mut it = log.iter_from_bookmark("replay").unwrap();
    let first = it.next().unwrap().value().to_vec();
    drop(it);
    println!("replay resumes at {}", String::from_utf8_lossy(&first));

    log.rotate();
    println!("after rotate, head is {:?}", log.get(0).unwrap());
}
