// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![cfg(feature = "sled")]

use host_db::sled::SledDb;
use host_db::Store;

#[test]
fn write_then_read_round_trips() {
    let db = SledDb::temporary().unwrap();
    db.write_bucket(b"k", b"v", "bucket").unwrap();
    assert_eq!(
        db.read_bucket(b"k", "bucket").unwrap(),
        Some(b"v".to_vec())
    );
}

#[test]
fn read_of_missing_key_is_none() {
    let db = SledDb::temporary().unwrap();
    assert_eq!(db.read_bucket(b"nope", "bucket").unwrap(), None);
}

#[test]
fn exists_reflects_writes_and_deletes() {
    let db = SledDb::temporary().unwrap();
    db.write_bucket(b"k", b"v", "bucket").unwrap();
    assert!(db.exists_bucket(b"k", "bucket").unwrap());
    db.delete_bucket(b"k", "bucket").unwrap();
    assert!(!db.exists_bucket(b"k", "bucket").unwrap());
}

#[test]
fn separate_buckets_are_separate_trees() {
    let db = SledDb::temporary().unwrap();
    db.write_bucket(b"k", b"x", "sector_usage").unwrap();
    db.write_bucket(b"k", b"y", "storage_obligations").unwrap();
    assert_eq!(
        db.read_bucket(b"k", "sector_usage").unwrap(),
        Some(b"x".to_vec())
    );
    assert_eq!(
        db.read_bucket(b"k", "storage_obligations").unwrap(),
        Some(b"y".to_vec())
    );
}

#[test]
fn bulk_write_and_bulk_read() {
    let db = SledDb::temporary().unwrap();
    let values = [(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())];
    db.bulk_write_bucket(&values, "bucket").unwrap();
    let got = db
        .bulk_read_bucket(&[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()], "bucket")
        .unwrap();
    assert_eq!(got, vec![Some(b"1".to_vec()), Some(b"2".to_vec()), None]);
}
