use ambar_quicklist::{Direction, LpValue, OwnedValue, Quicklist};

fn filled(fill: i32, n: usize) -> Quicklist {
    let mut ql = Quicklist::with_options(fill, 0);
    for i in 0..n {
        ql.push_tail(format!("{i}").as_bytes());
    }
    ql
}

#[test]
fn test_forward_and_backward_walks() {
    let mut ql = filled(4, 20);

    let mut it = ql.iter(Direction::Forward);
    let mut expect = 0i64;
    while let Some(entry) = it.next() {
        assert_eq!(entry.value(), LpValue::Int(expect));
        expect += 1;
    }
    assert_eq!(expect, 20);
    drop(it);

    let mut it = ql.iter(Direction::Backward);
    while let Some(entry) = it.next() {
        expect -= 1;
        assert_eq!(entry.value(), LpValue::Int(expect));
    }
    assert_eq!(expect, 0);
}

#[test]
fn test_iter_at_positions_cursor() {
    let mut ql = filled(3, 30);
    let mut it = ql.iter_at(Direction::Forward, 17).unwrap();
    assert_eq!(it.next().unwrap().value(), LpValue::Int(17));
    assert_eq!(it.next().unwrap().value(), LpValue::Int(18));
    drop(it);

    let mut it = ql.iter_at(Direction::Backward, -1).unwrap();
    assert_eq!(it.next().unwrap().value(), LpValue::Int(29));
    assert_eq!(it.next().unwrap().value(), LpValue::Int(28));
    drop(it);

    assert!(ql.iter_at(Direction::Forward, 30).is_none());
    assert!(ql.iter_at(Direction::Forward, -31).is_none());
}

#[test]
fn test_set_direction_reverses_from_current() {
    let mut ql = filled(5, 10);
    let mut it = ql.iter(Direction::Forward);
    for want in 0..4 {
        assert_eq!(it.next().unwrap().value(), LpValue::Int(want));
    }
    it.set_direction(Direction::Backward);
    assert_eq!(it.next().unwrap().value(), LpValue::Int(2));
    assert_eq!(it.next().unwrap().value(), LpValue::Int(1));
}

#[test]
fn test_delete_every_other_element() {
    let mut ql = filled(4, 20);
    let mut it = ql.iter(Direction::Forward);
    let mut keep = true;
    loop {
        let Some(entry) = it.next() else { break };
        if !keep {
            entry.delete();
        }
        keep = !keep;
    }
    drop(it);
    assert_eq!(ql.count(), 10);
    for i in 0..10 {
        assert_eq!(ql.get(i), Some(OwnedValue::Int(i * 2)));
    }
}

#[test]
fn test_delete_all_forward_drains_list() {
    let mut ql = filled(3, 25);
    let mut it = ql.iter(Direction::Forward);
    while let Some(entry) = it.next() {
        entry.delete();
    }
    drop(it);
    assert!(ql.is_empty());
    assert_eq!(ql.len(), 0);
}

#[test]
fn test_delete_all_backward_drains_list() {
    let mut ql = filled(3, 25);
    let mut it = ql.iter(Direction::Backward);
    while let Some(entry) = it.next() {
        entry.delete();
    }
    drop(it);
    assert!(ql.is_empty());
}

#[test]
fn test_delete_advances_in_direction() {
    let mut ql = filled(4, 8);
    let mut it = ql.iter_at(Direction::Forward, 3).unwrap();
    it.next().unwrap().delete();
    // The cursor lands on the element that followed the deleted one.
    assert_eq!(it.next().unwrap().value(), LpValue::Int(4));
    drop(it);

    let mut it = ql.iter_at(Direction::Backward, -3).unwrap();
    let entry = it.next().unwrap();
    assert_eq!(entry.value(), LpValue::Int(5));
    entry.delete();
    assert_eq!(it.next().unwrap().value(), LpValue::Int(4));
}

#[test]
fn test_insert_before_and_after() {
    let mut ql = filled(10, 5);

    let mut it = ql.iter_at(Direction::Forward, 2).unwrap();
    it.next().unwrap().insert_before(b"pre");
    drop(it);
    assert_eq!(ql.count(), 6);
    assert_eq!(ql.get(2), Some(OwnedValue::Bytes(b"pre".to_vec())));
    assert_eq!(ql.get(3), Some(OwnedValue::Int(2)));

    let mut it = ql.iter_at(Direction::Forward, 3).unwrap();
    it.next().unwrap().insert_after(b"post");
    drop(it);
    assert_eq!(ql.count(), 7);
    assert_eq!(ql.get(4), Some(OwnedValue::Bytes(b"post".to_vec())));
    assert_eq!(ql.get(5), Some(OwnedValue::Int(3)));
}

#[test]
fn test_insert_into_full_node_splits() {
    let mut ql = filled(4, 8);
    assert_eq!(ql.len(), 2);
    // Interior insert into a full node forces a split.
    let mut it = ql.iter_at(Direction::Forward, 1).unwrap();
    it.next().unwrap().insert_after(b"wedge");
    drop(it);
    assert_eq!(ql.count(), 9);
    let order: Vec<OwnedValue> = (0..9).map(|i| ql.get(i).unwrap()).collect();
    assert_eq!(order[1], OwnedValue::Int(1));
    assert_eq!(order[2], OwnedValue::Bytes(b"wedge".to_vec()));
    assert_eq!(order[3], OwnedValue::Int(2));
    let total: usize = ql.nodes().map(|v| v.count).sum();
    assert_eq!(total, 9);
}

#[test]
fn test_insert_spills_into_neighbor_with_room() {
    let mut ql = Quicklist::with_options(4, 0);
    for i in 0..6 {
        ql.push_tail(format!("{i}").as_bytes());
    }
    // Nodes: [0,1,2,3], [4,5]. Insert after element 3 (tail of the full
    // node): the element must land at the head of the second node.
    let mut it = ql.iter_at(Direction::Forward, 3).unwrap();
    it.next().unwrap().insert_after(b"spill");
    drop(it);
    assert_eq!(ql.len(), 2);
    assert_eq!(ql.get(4), Some(OwnedValue::Bytes(b"spill".to_vec())));
    assert_eq!(ql.get(5), Some(OwnedValue::Int(4)));
}

#[test]
fn test_replace_mid_iteration_lands_in_place() {
    let mut ql = filled(6, 12);
    let mut it = ql.iter_at(Direction::Forward, 7).unwrap();
    it.next().unwrap().replace(b"swapped");
    drop(it);
    assert_eq!(ql.count(), 12);
    assert_eq!(ql.get(7), Some(OwnedValue::Bytes(b"swapped".to_vec())));
    assert_eq!(ql.get(6), Some(OwnedValue::Int(6)));
    assert_eq!(ql.get(8), Some(OwnedValue::Int(8)));
}

#[test]
fn test_iteration_covers_plain_nodes() {
    let mut ql = Quicklist::new();
    ql.push_tail(b"a");
    ql.push_tail(&vec![7u8; 4096]);
    ql.push_tail(b"b");

    let mut it = ql.iter(Direction::Forward);
    assert!(it.next().unwrap().eq_bytes(b"a"));
    let blob = it.next().unwrap();
    assert_eq!(blob.value(), LpValue::Bytes(&vec![7u8; 4096][..]));
    drop(blob);
    assert!(it.next().unwrap().eq_bytes(b"b"));
    assert!(it.next().is_none());
}

#[test]
fn test_delete_plain_node_mid_iteration() {
    let mut ql = Quicklist::new();
    ql.push_tail(b"a");
    ql.push_tail(&vec![7u8; 4096]);
    ql.push_tail(b"b");

    let mut it = ql.iter_at(Direction::Forward, 1).unwrap();
    it.next().unwrap().delete();
    assert!(it.next().unwrap().eq_bytes(b"b"));
    drop(it);
    assert_eq!(ql.count(), 2);
    assert_eq!(ql.len(), 2);
}

#[test]
fn test_empty_list_iterates_nothing() {
    let mut ql = Quicklist::new();
    assert!(ql.iter(Direction::Forward).next().is_none());
    assert!(ql.iter(Direction::Backward).next().is_none());
    assert!(ql.iter_at(Direction::Forward, 0).is_none());
}
