// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loads the host's persistent Ed25519 identity, generating and saving one
//! on first run.

use host_crypto::{HostKey, HostKeySeed};
use host_db::{Store, BUCKET_HOST_STATE};

const KEY_RECORD: &str = "host_key";

pub fn load_or_generate<S: Store>(store: &S) -> anyhow::Result<HostKey> {
    if let Some(bytes) = store.read_bucket(KEY_RECORD, BUCKET_HOST_STATE)? {
        let seed: HostKeySeed = serde_json::from_slice(&bytes)?;
        return Ok(HostKey::from_seed(seed));
    }
    let key = HostKey::generate();
    let bytes = serde_json::to_vec(&key.seed())?;
    store.write_bucket(KEY_RECORD, bytes, BUCKET_HOST_STATE)?;
    Ok(key)
}

/// Derives a host-salt for sector ID derivation from the same identity, so
/// a reopened host addresses the same sectors it wrote before. Distinct
/// from the signing key itself: see `host_crypto::sector_id`.
pub fn derive_host_salt(key: &HostKey) -> [u8; 32] {
    let signature = key.sign(b"storage-host/sector-salt/v1");
    let bytes = signature.to_bytes();
    let mut salt = [0u8; 32];
    salt.copy_from_slice(&bytes[..32]);
    salt
}
