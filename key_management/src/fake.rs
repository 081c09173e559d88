// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An in-memory [`Wallet`] backed by an Ed25519 keypair, standing in for the
//! network wallet in tests and local (`--ephemeral`) runs.

use host_crypto::HostKey;
use host_types::UnlockHash;

use crate::{Wallet, WalletError};

pub struct FakeWallet {
    key: HostKey,
    unlock_hash: UnlockHash,
}

impl FakeWallet {
    pub fn new() -> Self {
        let key = HostKey::generate();
        let unlock_hash = UnlockHash(key.verifying_key().to_bytes());
        FakeWallet { key, unlock_hash }
    }
}

impl Default for FakeWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl Wallet for FakeWallet {
    fn unlock_hash(&self) -> UnlockHash {
        self.unlock_hash
    }

    fn sign_transaction(&self, unsigned_transaction: &[u8]) -> Result<Vec<u8>, WalletError> {
        Ok(self.key.sign(unsigned_transaction).to_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_without_error() {
        let wallet = FakeWallet::new();
        assert!(wallet.sign_transaction(b"tx bytes").is_ok());
    }
}
