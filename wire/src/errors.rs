// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("message of {len} bytes exceeds the {max}-byte limit for this call")]
    TooLarge { len: u64, max: u64 },
    #[error("connection closed mid-message")]
    Truncated,
    #[error("unrecognized RPC specifier {0:?}")]
    InvalidSpecifier([u8; 16]),
}
