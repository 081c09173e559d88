// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use host_types::StorageFolderUid;

/// One disk the host stores sectors on. `size`/`size_remaining` are tracked
/// in-memory and persisted; they are not recomputed from the filesystem.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageFolder {
    pub uid: StorageFolderUid,
    pub path: PathBuf,
    pub size: u64,
    pub size_remaining: u64,
    pub successful_reads: u64,
    pub failed_reads: u64,
    pub successful_writes: u64,
    pub failed_writes: u64,
}

impl StorageFolder {
    pub fn new(uid: StorageFolderUid, path: PathBuf, size: u64) -> Self {
        StorageFolder {
            uid,
            path,
            size,
            size_remaining: size,
            successful_reads: 0,
            failed_reads: 0,
            successful_writes: 0,
            failed_writes: 0,
        }
    }

    /// Fraction of the folder currently in use; lower is emptier.
    pub fn usage_ratio(&self) -> f64 {
        if self.size == 0 {
            return 1.0;
        }
        (self.size - self.size_remaining) as f64 / self.size as f64
    }
}

/// Picks the slot holding the folder with `size_remaining >= sector_size`
/// that minimizes `usage_ratio`, breaking ties by lowest index. Empty slots
/// (removed folders) and `excluded` are skipped. Folders are kept in fixed
/// slots rather than a dense, reindexed list so that a folder's index
/// remains a stable handle across removals.
pub fn emptiest_folder(
    folders: &[Option<StorageFolder>],
    sector_size: u64,
    excluded: Option<&StorageFolderUid>,
) -> Option<usize> {
    folders
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| slot.as_ref().map(|f| (i, f)))
        .filter(|(_, f)| f.size_remaining >= sector_size)
        .filter(|(_, f)| excluded != Some(&f.uid))
        .min_by(|(ia, a), (ib, b)| {
            a.usage_ratio()
                .partial_cmp(&b.usage_ratio())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        })
        .map(|(i, _)| i)
}
