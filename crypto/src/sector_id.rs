// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use host_types::{SectorId, SectorRoot};

/// Derives the on-disk sector identifier from `(root, host_salt)`.
///
/// `host_salt` is generated once at host creation and kept private, so an
/// attacker who knows a sector's root cannot predict its filename and stage
/// a chosen-collision upload against it.
pub fn sector_id(root: &SectorRoot, host_salt: &[u8; 32]) -> SectorId {
    let mut hasher = blake2b_simd::Params::new().hash_length(32).to_state();
    hasher.update(host_salt);
    hasher.update(&root.0);
    let digest = hasher.finalize();
    let mut id = [0u8; 12];
    id.copy_from_slice(&digest.as_bytes()[..12]);
    SectorId(id)
}
