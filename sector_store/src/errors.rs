// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SectorError {
    #[error("sector already carries {max} virtual references")]
    MaxVirtualSectors { max: usize },
    #[error("no storage folder has enough free space for a sector")]
    InsufficientStorage,
    #[error("every folder with room failed to accept the write")]
    DiskTrouble,
    #[error("sector body is {got} bytes, expected {expected}")]
    IncorrectSize { expected: u64, got: u64 },
    #[error("sector not found")]
    SectorNotFound,
    #[error("sector is marked corrupted after a prior failed read")]
    SectorCorrupted,
    #[error("some sectors could not be relocated off the folder")]
    IncompleteOffload,
    #[error("no storage folder at index {0}")]
    BadStorageFolderIndex(usize),
    #[error("folder size must be between {min} and {max} bytes")]
    FolderSizeOutOfBounds { min: u64, max: u64 },
    #[error("at most {max} storage folders are supported")]
    TooManyStorageFolders { max: usize },
    #[error("folder path does not exist or is not a directory")]
    InvalidFolderPath,
    #[error(transparent)]
    Db(#[from] host_db::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("corrupt sector-usage record: {0}")]
    CorruptRecord(String),
}
