// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Height-indexed queue of obligation IDs awaiting the action scheduler's
//! attention (component 4.D). Owned here because `AddObligation` and
//! `ModifyObligation` are what populate it; the scheduler only drains it.

use host_clock::BlockHeight;
use host_db::{Error, Store, BUCKET_ACTION_ITEMS};
use host_types::FileContractId;

fn height_key(height: BlockHeight) -> [u8; 8] {
    height.as_u64().to_be_bytes()
}

fn key_height(key: &[u8]) -> Option<BlockHeight> {
    let bytes: [u8; 8] = key.try_into().ok()?;
    Some(BlockHeight::new(u64::from_be_bytes(bytes)))
}

/// Schedules `id` for re-evaluation at `height`.
pub fn schedule<S: Store>(store: &S, height: BlockHeight, id: FileContractId) -> Result<(), Error> {
    let key = height_key(height);
    let mut ids: Vec<FileContractId> = match store.read_bucket(key, BUCKET_ACTION_ITEMS)? {
        Some(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        None => Vec::new(),
    };
    ids.push(id);
    let bytes = serde_json::to_vec(&ids).expect("action item list is serializable");
    store.write_bucket(key, bytes, BUCKET_ACTION_ITEMS)
}

/// Drains every action item scheduled at or before `height`, in ascending
/// height order, removing them from the queue.
pub fn drain_up_to<S: Store>(
    store: &S,
    height: BlockHeight,
) -> Result<Vec<(BlockHeight, FileContractId)>, Error> {
    let mut due: Vec<(BlockHeight, Vec<u8>, Vec<FileContractId>)> = Vec::new();
    for (key, value) in store.iter_bucket(BUCKET_ACTION_ITEMS)? {
        let Some(item_height) = key_height(&key) else {
            continue;
        };
        if item_height > height {
            continue;
        }
        let ids: Vec<FileContractId> = serde_json::from_slice(&value).unwrap_or_default();
        due.push((item_height, key, ids));
    }
    due.sort_by_key(|(h, _, _)| *h);

    let mut out = Vec::new();
    for (item_height, key, ids) in due {
        store.delete_bucket(key, BUCKET_ACTION_ITEMS)?;
        for id in ids {
            out.push((item_height, id));
        }
    }
    Ok(out)
}

/// Clears the entire queue, used when the consensus follower performs a
/// full rescan.
pub fn clear_all<S: Store>(store: &S) -> Result<(), Error> {
    for (key, _) in store.iter_bucket(BUCKET_ACTION_ITEMS)? {
        store.delete_bucket(key, BUCKET_ACTION_ITEMS)?;
    }
    Ok(())
}
