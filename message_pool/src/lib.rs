// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transaction-pool capability interface.
//!
//! Mempool admission, fee-market estimation, and transaction propagation
//! belong to the consensus layer's own pool, which lives outside this
//! daemon. The host only needs to submit finished transaction sets and ask
//! what fee currently clears the pool; this crate names that interface and
//! supplies an in-memory implementation for tests.

mod errors;
pub mod fake;

pub use errors::PoolError;

use host_types::Currency;

/// Capability held by the action scheduler and negotiation protocol to
/// broadcast the transactions the host assembles (contract formation,
/// revisions, renewals, storage-proof submissions) and to price them.
pub trait TransactionPool: Send + Sync {
    /// Submits an already-signed transaction set for broadcast.
    fn submit(&self, signed_transaction_set: Vec<Vec<u8>>) -> Result<(), PoolError>;

    /// The fee, per byte of serialized transaction, that currently clears
    /// the pool's admission floor. Used both to size the host's own fee
    /// contribution and, scaled by `10_000`, as a floor for `contract_price`.
    fn min_fee_per_byte(&self) -> Currency;

    /// Whether `fee` is sufficient for a transaction set of `size_bytes`
    /// to clear the pool's current minimum.
    fn clears_minimum_fee(&self, size_bytes: u64, fee: Currency) -> bool {
        match self.min_fee_per_byte().checked_mul(u128::from(size_bytes)) {
            Ok(required) => fee.as_base_units() >= required.as_base_units(),
            Err(_) => false,
        }
    }
}

impl<T: TransactionPool + ?Sized> TransactionPool for std::sync::Arc<T> {
    fn submit(&self, signed_transaction_set: Vec<Vec<u8>>) -> Result<(), PoolError> {
        (**self).submit(signed_transaction_set)
    }

    fn min_fee_per_byte(&self) -> Currency {
        (**self).min_fee_per_byte()
    }
}
