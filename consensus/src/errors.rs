// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("no storage proof segment is available for this obligation yet")]
    SegmentUnavailable,
    #[error("consensus source is unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Obligation(#[from] host_obligation_store::ObligationError),
    #[error(transparent)]
    Db(#[from] host_db::Error),
}
