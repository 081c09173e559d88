// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sled`-backed [`Store`] implementation: the host's on-disk persistence
//! layer, opened at `<persist_dir>/host.db`.

use std::path::Path;

pub use ::sled::{Config, Db, Mode};

use crate::{Error, Store};

/// Sled instance satisfying the [`Store`] interface. Each named bucket maps
/// onto its own `sled` tree, so `iter_bucket` never has to scan records it
/// doesn't own.
#[derive(Debug)]
pub struct SledDb {
    db: Db,
}

impl SledDb {
    pub fn open<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let options = Config::default()
            .path(path)
            .mode(Mode::HighThroughput)
            .cache_capacity(256 * 1024 * 1024);
        Ok(Self {
            db: options.open()?,
        })
    }

    pub fn open_with_config(config: Config) -> Result<Self, Error> {
        Ok(Self { db: config.open()? })
    }

    /// In-memory sled instance; does not persist across process restarts.
    pub fn temporary() -> Result<Self, Error> {
        let options = Config::default().temporary(true);
        Ok(Self {
            db: options.open()?,
        })
    }

    fn tree(&self, bucket: &str) -> Result<::sled::Tree, Error> {
        Ok(self.db.open_tree(bucket)?)
    }
}

impl Store for SledDb {
    fn read_bucket<K>(&self, key: K, bucket: &str) -> Result<Option<Vec<u8>>, Error>
    where
        K: AsRef<[u8]>,
    {
        Ok(self.tree(bucket)?.get(key)?.map(|v| v.as_ref().into()))
    }

    fn write_bucket<K, V>(&self, key: K, value: V, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.tree(bucket)?.insert(key, value.as_ref())?;
        Ok(())
    }

    fn delete_bucket<K>(&self, key: K, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
    {
        self.tree(bucket)?.remove(key)?;
        Ok(())
    }

    fn exists_bucket<K>(&self, key: K, bucket: &str) -> Result<bool, Error>
    where
        K: AsRef<[u8]>,
    {
        Ok(self.tree(bucket)?.contains_key(key)?)
    }

    fn iter_bucket(&self, bucket: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
        self.tree(bucket)?
            .iter()
            .map(|entry| {
                let (k, v) = entry?;
                Ok((k.as_ref().to_vec(), v.as_ref().to_vec()))
            })
            .collect()
    }
}
