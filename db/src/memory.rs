// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::{Error, Store};

/// A thread-safe, in-memory `Store`. Used for tests and for the `--ephemeral`
/// host mode where persistence is intentionally skipped.
#[derive(Debug, Default)]
pub struct MemoryDb {
    buckets: RwLock<HashMap<String, HashMap<Vec<u8>, Vec<u8>>>>,
}

impl Store for MemoryDb {
    fn read_bucket<K>(&self, key: K, bucket: &str) -> Result<Option<Vec<u8>>, Error>
    where
        K: AsRef<[u8]>,
    {
        Ok(self
            .buckets
            .read()
            .get(bucket)
            .and_then(|b| b.get(key.as_ref()))
            .cloned())
    }

    fn write_bucket<K, V>(&self, key: K, value: V, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.as_ref().to_vec(), value.as_ref().to_vec());
        Ok(())
    }

    fn delete_bucket<K>(&self, key: K, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
    {
        if let Some(b) = self.buckets.write().get_mut(bucket) {
            b.remove(key.as_ref());
        }
        Ok(())
    }

    fn exists_bucket<K>(&self, key: K, bucket: &str) -> Result<bool, Error>
    where
        K: AsRef<[u8]>,
    {
        Ok(self
            .buckets
            .read()
            .get(bucket)
            .is_some_and(|b| b.contains_key(key.as_ref())))
    }

    fn iter_bucket(&self, bucket: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
        Ok(self
            .buckets
            .read()
            .get(bucket)
            .map(|b| b.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}
