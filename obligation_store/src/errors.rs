// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObligationError {
    #[error("no obligation with id {0}")]
    NotFound(String),
    #[error("obligation {0} already exists")]
    AlreadyExists(String),
    #[error("timed out waiting to lock obligation {0}")]
    LockTimeout(String),
    #[error("obligation {0} is already in a terminal status")]
    AlreadyTerminal(String),
    #[error(transparent)]
    Sector(#[from] host_sector_store::SectorError),
    #[error(transparent)]
    Db(#[from] host_db::Error),
    #[error("corrupt obligation record: {0}")]
    CorruptRecord(String),
}
