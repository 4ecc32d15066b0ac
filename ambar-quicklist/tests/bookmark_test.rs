use ambar_quicklist::{LpValue, Quicklist, QuicklistError};

/// One element per node, so element indices map onto nodes.
fn node_per_element(n: usize) -> Quicklist {
    let mut ql = Quicklist::with_options(1, 0);
    for i in 0..n {
        ql.push_tail(format!("n{i}").as_bytes());
    }
    assert_eq!(ql.len(), n);
    ql
}

#[test]
fn test_bookmark_create_find_iterate() {
    let mut ql = node_per_element(5);
    ql.bookmark_create("resume", 2).unwrap();

    let mut it = ql.iter_from_bookmark("resume").unwrap();
    assert_eq!(it.next().unwrap().value(), LpValue::Bytes(b"n2"));
    assert_eq!(it.next().unwrap().value(), LpValue::Bytes(b"n3"));
    drop(it);

    assert!(ql.iter_from_bookmark("missing").is_none());
}

#[test]
fn test_bookmark_follows_deleted_node_to_successor() {
    let mut ql = node_per_element(5);
    ql.bookmark_create("mark", 1).unwrap();

    // Deleting the bookmarked node slides the mark onto its successor.
    ql.del_range(1, 2);
    let mut it = ql.iter_from_bookmark("mark").unwrap();
    assert_eq!(it.next().unwrap().value(), LpValue::Bytes(b"n2"));
    drop(it);
    assert_eq!(ql.bookmark_count(), 1);
}

#[test]
fn test_bookmark_on_deleted_tail_disappears() {
    let mut ql = node_per_element(4);
    ql.bookmark_create("edge", 3).unwrap();
    ql.del_range(3, 4);
    assert!(ql.iter_from_bookmark("edge").is_none());
    assert_eq!(ql.bookmark_count(), 0);
}

#[test]
fn test_bookmark_name_collision_is_reported() {
    let mut ql = node_per_element(3);
    ql.bookmark_create("a", 0).unwrap();
    assert_eq!(
        ql.bookmark_create("a", 1),
        Err(QuicklistError::BookmarkExists)
    );
}

#[test]
fn test_bookmark_table_caps_at_fifteen() {
    let mut ql = node_per_element(20);
    for i in 0..15 {
        ql.bookmark_create(&format!("bm{i}"), i as i64).unwrap();
    }
    assert_eq!(
        ql.bookmark_create("one-too-many", 16),
        Err(QuicklistError::BookmarkTableFull)
    );
    assert_eq!(ql.bookmark_count(), 15);
}

#[test]
fn test_bookmark_delete_and_clear() {
    let mut ql = node_per_element(6);
    ql.bookmark_create("x", 1).unwrap();
    ql.bookmark_create("y", -1).unwrap();
    assert!(ql.bookmark_delete("x"));
    assert!(!ql.bookmark_delete("x"));
    assert_eq!(ql.bookmark_count(), 1);
    ql.bookmarks_clear();
    assert_eq!(ql.bookmark_count(), 0);
}

#[test]
fn test_bookmark_out_of_range_index() {
    let mut ql = node_per_element(3);
    assert_eq!(
        ql.bookmark_create("far", 10),
        Err(QuicklistError::OutOfRange)
    );
    assert_eq!(
        ql.bookmark_create("neg", -4),
        Err(QuicklistError::OutOfRange)
    );
}
