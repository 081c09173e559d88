// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wallet capability interface.
//!
//! Key custody, coin selection, and signing of non-host transaction inputs
//! belong to the renter's and the network's own wallets, which live outside
//! this daemon. The host only needs to ask its own wallet to co-sign the
//! transactions it assembles (contract formation, renewals, revisions,
//! storage-proof submissions); this crate names that one interface and
//! supplies an in-memory implementation for tests and local development.

mod errors;
pub mod fake;

pub use errors::WalletError;

use host_types::UnlockHash;

/// Capability the negotiation protocol and action scheduler hold to get
/// transactions they build co-signed and to learn the address their share
/// of a contract's payouts should be sent to.
pub trait Wallet: Send + Sync {
    /// The address the host expects contract payouts to be made out to.
    fn unlock_hash(&self) -> UnlockHash;

    /// Signs an opaque, already-serialized transaction, returning the
    /// signature bytes to attach to the host's input(s). The transaction
    /// wire format itself belongs to the consensus layer, not this host.
    fn sign_transaction(&self, unsigned_transaction: &[u8]) -> Result<Vec<u8>, WalletError>;
}

impl<T: Wallet + ?Sized> Wallet for std::sync::Arc<T> {
    fn unlock_hash(&self) -> UnlockHash {
        (**self).unlock_hash()
    }

    fn sign_transaction(&self, unsigned_transaction: &[u8]) -> Result<Vec<u8>, WalletError> {
        (**self).sign_transaction(unsigned_transaction)
    }
}
