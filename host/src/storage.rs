// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Picks between the two [`host_db::Store`] backends at startup.
//!
//! Every other crate is generic over `S: Store`, so rather than force a
//! trait object (the trait's bulk methods are generic and not object-safe)
//! the host monomorphizes once over this small enum and forwards every
//! method to whichever backend was actually opened.

use std::path::Path;

use host_db::{Error, MemoryDb, Store};

pub enum AnyDb {
    Memory(MemoryDb),
    Sled(host_db::sled::SledDb),
}

impl AnyDb {
    pub fn open(persist_dir: &Path, ephemeral: bool) -> anyhow::Result<Self> {
        if ephemeral {
            return Ok(AnyDb::Memory(MemoryDb::default()));
        }
        std::fs::create_dir_all(persist_dir)?;
        let db = host_db::sled::SledDb::open(persist_dir.join("host.db"))?;
        Ok(AnyDb::Sled(db))
    }
}

impl Store for AnyDb {
    fn read_bucket<K>(&self, key: K, bucket: &str) -> Result<Option<Vec<u8>>, Error>
    where
        K: AsRef<[u8]>,
    {
        match self {
            AnyDb::Memory(db) => db.read_bucket(key, bucket),
            AnyDb::Sled(db) => db.read_bucket(key, bucket),
        }
    }

    fn write_bucket<K, V>(&self, key: K, value: V, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        match self {
            AnyDb::Memory(db) => db.write_bucket(key, value, bucket),
            AnyDb::Sled(db) => db.write_bucket(key, value, bucket),
        }
    }

    fn delete_bucket<K>(&self, key: K, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
    {
        match self {
            AnyDb::Memory(db) => db.delete_bucket(key, bucket),
            AnyDb::Sled(db) => db.delete_bucket(key, bucket),
        }
    }

    fn exists_bucket<K>(&self, key: K, bucket: &str) -> Result<bool, Error>
    where
        K: AsRef<[u8]>,
    {
        match self {
            AnyDb::Memory(db) => db.exists_bucket(key, bucket),
            AnyDb::Sled(db) => db.exists_bucket(key, bucket),
        }
    }

    fn iter_bucket(&self, bucket: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
        match self {
            AnyDb::Memory(db) => db.iter_bucket(bucket),
            AnyDb::Sled(db) => db.iter_bucket(bucket),
        }
    }
}
