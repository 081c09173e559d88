// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use parking_lot::Mutex;

use host_types::Currency;

use crate::{PoolError, TransactionPool};

/// Records every submission instead of broadcasting it, so tests can assert
/// on what the action scheduler or negotiation protocol tried to send.
pub struct FakeTransactionPool {
    min_fee_per_byte: Currency,
    submissions: Mutex<Vec<Vec<Vec<u8>>>>,
    reject_next: Mutex<bool>,
}

impl FakeTransactionPool {
    pub fn new(min_fee_per_byte: Currency) -> Self {
        FakeTransactionPool {
            min_fee_per_byte,
            submissions: Mutex::new(Vec::new()),
            reject_next: Mutex::new(false),
        }
    }

    /// Makes the next `submit` call fail, to exercise retry paths.
    pub fn reject_next_submission(&self) {
        *self.reject_next.lock() = true;
    }

    pub fn submissions(&self) -> Vec<Vec<Vec<u8>>> {
        self.submissions.lock().clone()
    }
}

impl Default for FakeTransactionPool {
    fn default() -> Self {
        Self::new(Currency::from_base_units(1))
    }
}

impl TransactionPool for FakeTransactionPool {
    fn submit(&self, signed_transaction_set: Vec<Vec<u8>>) -> Result<(), PoolError> {
        if std::mem::take(&mut *self.reject_next.lock()) {
            return Err(PoolError::Rejected("simulated mempool rejection".into()));
        }
        self.submissions.lock().push(signed_transaction_set);
        Ok(())
    }

    fn min_fee_per_byte(&self) -> Currency {
        self.min_fee_per_byte
    }
}
