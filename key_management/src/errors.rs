// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet refused to sign: {0}")]
    Refused(String),
    #[error("wallet is locked")]
    Locked,
}
