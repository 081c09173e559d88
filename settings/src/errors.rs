// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    NetAddress(#[from] host_types::NetAddressError),
    #[error("unlock hash is already set and cannot change")]
    UnlockHashImmutable,
    #[error("window size must be greater than zero")]
    ZeroWindowSize,
    #[error(transparent)]
    Sector(#[from] host_sector_store::SectorError),
    #[error(transparent)]
    Db(#[from] host_db::Error),
    #[error("corrupt settings record: {0}")]
    CorruptRecord(String),
}
