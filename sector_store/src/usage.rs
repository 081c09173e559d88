// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use host_clock::BlockHeight;
use host_types::StorageFolderUid;

/// Tracks where a sector's single physical copy lives and every expiry
/// height a storage obligation has registered an interest in it. A sector
/// becomes virtual the moment a second obligation references the same
/// content; it is only deleted from disk when the last expiry is removed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectorUsageRecord {
    pub storage_folder_uid: StorageFolderUid,
    pub expiries: Vec<BlockHeight>,
    /// Set once a read off disk has failed. The sector stays in the index
    /// (expiries still count toward virtual-sector accounting) but further
    /// reads are rejected instead of retried against a folder that already
    /// proved unreliable.
    #[serde(default)]
    pub corrupted: bool,
}
