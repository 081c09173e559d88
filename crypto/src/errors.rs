// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("signature does not verify against the given key")]
    BadSignature,
}
