// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Errors surfaced by a [`crate::Store`] implementation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid bulk write: keys and values must be the same length")]
    InvalidBulkLen,
    #[error("cannot use an unopened database")]
    Unopened,
    #[cfg(feature = "sled")]
    #[error(transparent)]
    Database(#[from] sled::Error),
    #[error("{0}")]
    Other(String),
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        use Error::*;
        match (self, other) {
            (InvalidBulkLen, InvalidBulkLen) => true,
            (Unopened, Unopened) => true,
            #[cfg(feature = "sled")]
            (Database(_), Database(_)) => true,
            (Other(a), Other(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Error> for String {
    fn from(e: Error) -> Self {
        e.to_string()
    }
}
