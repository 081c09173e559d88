// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("transaction set rejected by the pool: {0}")]
    Rejected(String),
    #[error("transaction set did not confirm before it was dropped from the pool")]
    Expired,
}
