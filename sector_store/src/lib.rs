// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-addressed sector storage: the sector engine and the storage-folder
//! manager it spreads sectors across.
//!
//! Sectors are addressed by their Merkle root (see `host_crypto::sector_root`)
//! but named on disk by a salted derivative of it (`host_crypto::sector_id`),
//! so the mapping from root to path never leaves the host. Multiple storage
//! obligations can reference the same content; the store keeps one physical
//! copy and a list of expiries per sector (see [`SectorUsageRecord`]).

mod engine;
mod errors;
mod folder;
mod usage;

pub use engine::SectorStore;
pub use errors::SectorError;
pub use folder::{emptiest_folder, StorageFolder};
pub use usage::SectorUsageRecord;
