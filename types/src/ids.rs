// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Merkle root of a file contract's revision tree. Identifies a storage
/// obligation for its whole lifetime (the origin transaction and every
/// subsequent revision share this ID).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileContractId(pub [u8; 32]);

impl fmt::Debug for FileContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileContractId({})", hex_string(&self.0))
    }
}

impl fmt::Display for FileContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex_string(&self.0))
    }
}

impl AsRef<[u8]> for FileContractId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Merkle root over a sector's fixed-size segments; the sector's content
/// address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectorRoot(pub [u8; 32]);

impl fmt::Debug for SectorRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectorRoot({})", hex_string(&self.0))
    }
}

impl fmt::Display for SectorRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex_string(&self.0))
    }
}

impl AsRef<[u8]> for SectorRoot {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The 12-byte salted identifier under which a sector is keyed in the
/// sector-usage database and named on disk. Derived from `(root, host_salt)`
/// so that an attacker without the salt cannot construct chosen-collision
/// uploads; see `host_crypto::sector_id`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectorId(pub [u8; 12]);

impl SectorId {
    /// 16-character base64url rendering used as the on-disk filename.
    pub fn to_filename(self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }
}

impl fmt::Debug for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectorId({})", self.to_filename())
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_filename())
    }
}

impl AsRef<[u8]> for SectorId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Short random identifier for a storage folder: 4 bytes in production
/// builds, 1 byte in testing builds (kept short so the symlink tree under
/// the persist directory stays readable).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StorageFolderUid(pub Vec<u8>);

impl StorageFolderUid {
    pub fn to_hex(&self) -> String {
        hex_string(&self.0)
    }
}

impl fmt::Debug for StorageFolderUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageFolderUid({})", self.to_hex())
    }
}

impl fmt::Display for StorageFolderUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for StorageFolderUid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A blockchain output address. The host's own unlock hash names where its
/// contract payouts land; a 2-of-2 unlock hash over `[renter_key, host_key]`
/// names a contract's locked collateral/payment outputs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnlockHash(pub [u8; 32]);

impl fmt::Debug for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnlockHash({})", hex_string(&self.0))
    }
}

impl fmt::Display for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex_string(&self.0))
    }
}

impl AsRef<[u8]> for UnlockHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_id_filename_is_sixteen_chars_for_twelve_bytes() {
        let id = SectorId([7u8; 12]);
        assert_eq!(id.to_filename().len(), 16);
    }

    #[test]
    fn storage_folder_uid_hex_round_trips_length() {
        let uid = StorageFolderUid(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(uid.to_hex(), "deadbeef");
    }
}
