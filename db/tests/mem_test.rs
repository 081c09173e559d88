// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use host_db::{MemoryDb, Store};

#[test]
fn write_then_read_round_trips() {
    let db = MemoryDb::default();
    db.write_bucket(b"k", b"v", "bucket").unwrap();
    assert_eq!(
        db.read_bucket(b"k", "bucket").unwrap(),
        Some(b"v".to_vec())
    );
}

#[test]
fn read_of_missing_key_is_none() {
    let db = MemoryDb::default();
    assert_eq!(db.read_bucket(b"nope", "bucket").unwrap(), None);
}

#[test]
fn exists_reflects_writes_and_deletes() {
    let db = MemoryDb::default();
    db.write_bucket(b"k", b"v", "bucket").unwrap();
    assert!(db.exists_bucket(b"k", "bucket").unwrap());
    db.delete_bucket(b"k", "bucket").unwrap();
    assert!(!db.exists_bucket(b"k", "bucket").unwrap());
}

#[test]
fn bulk_write_and_bulk_read() {
    let db = MemoryDb::default();
    let values = [(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())];
    db.bulk_write_bucket(&values, "bucket").unwrap();
    let got = db
        .bulk_read_bucket(&[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()], "bucket")
        .unwrap();
    assert_eq!(got, vec![Some(b"1".to_vec()), Some(b"2".to_vec()), None]);
}

#[test]
fn bulk_delete_removes_every_key() {
    let db = MemoryDb::default();
    let values = [(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())];
    db.bulk_write_bucket(&values, "bucket").unwrap();
    db.bulk_delete_bucket(&[b"a".to_vec(), b"b".to_vec()], "bucket")
        .unwrap();
    assert!(!db.exists_bucket(b"a", "bucket").unwrap());
    assert!(!db.exists_bucket(b"b", "bucket").unwrap());
}

#[test]
fn iter_bucket_returns_only_that_buckets_entries() {
    let db = MemoryDb::default();
    db.write_bucket(b"a", b"1", "bucket-x").unwrap();
    db.write_bucket(b"b", b"2", "bucket-y").unwrap();
    let entries = db.iter_bucket("bucket-x").unwrap();
    assert_eq!(entries, vec![(b"a".to_vec(), b"1".to_vec())]);
}
