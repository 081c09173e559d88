// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store abstraction backing the host's persistent state.
//!
//! The host keeps three logical record sets side by side in one database:
//! sector usage, storage obligations, and scheduled action items (see the
//! data model). Rather than open three databases, callers address a single
//! [`Store`] through named buckets, which a `sled`-backed implementation
//! maps onto `sled` trees and an in-memory implementation maps onto
//! namespaced hash map keys.

mod errors;
mod memory;
#[cfg(feature = "sled")]
pub mod sled;

pub use errors::Error;
pub use memory::MemoryDb;

/// Bucket holding sector-usage records, keyed by sector ID bytes.
pub const BUCKET_SECTOR_USAGE: &str = "sector_usage";
/// Bucket holding storage-obligation records, keyed by file contract ID.
pub const BUCKET_STORAGE_OBLIGATIONS: &str = "storage_obligations";
/// Bucket holding pending action-scheduler items, keyed by a height-prefixed ID.
pub const BUCKET_ACTION_ITEMS: &str = "action_items";
/// Bucket holding the host's own persistent settings and key material.
pub const BUCKET_HOST_STATE: &str = "host_state";

const DEFAULT_BUCKET: &str = "default";

/// Store interface used as the host's KV store abstraction.
pub trait Store {
    /// Read a single value from the default bucket; `None` if the key is absent.
    fn read<K>(&self, key: K) -> Result<Option<Vec<u8>>, Error>
    where
        K: AsRef<[u8]>,
    {
        self.read_bucket(key, DEFAULT_BUCKET)
    }

    /// Read a single value from the named bucket; `None` if the key is absent.
    fn read_bucket<K>(&self, key: K, bucket: &str) -> Result<Option<Vec<u8>>, Error>
    where
        K: AsRef<[u8]>;

    /// Write a single value to the default bucket.
    fn write<K, V>(&self, key: K, value: V) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.write_bucket(key, value, DEFAULT_BUCKET)
    }

    /// Write a single value to the named bucket.
    fn write_bucket<K, V>(&self, key: K, value: V, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>;

    /// Delete a value at key from the default bucket.
    fn delete<K>(&self, key: K) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
    {
        self.delete_bucket(key, DEFAULT_BUCKET)
    }

    /// Delete a value at key from the named bucket.
    fn delete_bucket<K>(&self, key: K, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>;

    /// `Ok(true)` if the key exists in the default bucket.
    fn exists<K>(&self, key: K) -> Result<bool, Error>
    where
        K: AsRef<[u8]>,
    {
        self.exists_bucket(key, DEFAULT_BUCKET)
    }

    /// `Ok(true)` if the key exists in the named bucket.
    fn exists_bucket<K>(&self, key: K, bucket: &str) -> Result<bool, Error>
    where
        K: AsRef<[u8]>;

    /// Iterate every key/value pair in the named bucket.
    fn iter_bucket(&self, bucket: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error>;

    /// Read a slice of keys from the default bucket.
    fn bulk_read<K>(&self, keys: &[K]) -> Result<Vec<Option<Vec<u8>>>, Error>
    where
        K: AsRef<[u8]>,
    {
        keys.iter().map(|key| self.read(key)).collect()
    }

    /// Read a slice of keys from the named bucket.
    fn bulk_read_bucket<K>(&self, keys: &[K], bucket: &str) -> Result<Vec<Option<Vec<u8>>>, Error>
    where
        K: AsRef<[u8]>,
    {
        keys.iter()
            .map(|key| self.read_bucket(key, bucket))
            .collect()
    }

    /// Write a slice of KV pairs to the default bucket.
    fn bulk_write<K, V>(&self, values: &[(K, V)]) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        values
            .iter()
            .try_for_each(|(key, value)| self.write(key, value))
    }

    /// Write a slice of KV pairs to the named bucket.
    fn bulk_write_bucket<K, V>(&self, values: &[(K, V)], bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        values
            .iter()
            .try_for_each(|(key, value)| self.write_bucket(key, value, bucket))
    }

    /// Bulk delete keys from the default bucket.
    fn bulk_delete<K>(&self, keys: &[K]) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
    {
        keys.iter().try_for_each(|key| self.delete(key))
    }

    /// Bulk delete keys from the named bucket.
    fn bulk_delete_bucket<K>(&self, keys: &[K], bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
    {
        keys.iter()
            .try_for_each(|key| self.delete_bucket(key, bucket))
    }
}

impl<BS: Store> Store for std::sync::Arc<BS> {
    fn read_bucket<K>(&self, key: K, bucket: &str) -> Result<Option<Vec<u8>>, Error>
    where
        K: AsRef<[u8]>,
    {
        (**self).read_bucket(key, bucket)
    }

    fn write_bucket<K, V>(&self, key: K, value: V, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        (**self).write_bucket(key, value, bucket)
    }

    fn delete_bucket<K>(&self, key: K, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
    {
        (**self).delete_bucket(key, bucket)
    }

    fn exists_bucket<K>(&self, key: K, bucket: &str) -> Result<bool, Error>
    where
        K: AsRef<[u8]>,
    {
        (**self).exists_bucket(key, bucket)
    }

    fn iter_bucket(&self, bucket: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
        (**self).iter_bucket(bucket)
    }
}

impl<BS: Store> Store for &BS {
    fn read_bucket<K>(&self, key: K, bucket: &str) -> Result<Option<Vec<u8>>, Error>
    where
        K: AsRef<[u8]>,
    {
        (*self).read_bucket(key, bucket)
    }

    fn write_bucket<K, V>(&self, key: K, value: V, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        (*self).write_bucket(key, value, bucket)
    }

    fn delete_bucket<K>(&self, key: K, bucket: &str) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
    {
        (*self).delete_bucket(key, bucket)
    }

    fn exists_bucket<K>(&self, key: K, bucket: &str) -> Result<bool, Error>
    where
        K: AsRef<[u8]>,
    {
        (*self).exists_bucket(key, bucket)
    }

    fn iter_bucket(&self, bucket: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
        (*self).iter_bucket(bucket)
    }
}
