// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Taxonomy every surfaceable error is tagged with. Replaces the reference
/// implementation's string-subclassed error hierarchy with a single tagged
/// sum; classification drives both what a renter is told and how
/// aggressively an occurrence gets logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The renter sent garbage or violated contract terms.
    Communication,
    /// Transport-level failure: the connection itself misbehaved.
    Connection,
    /// The mempool or chain rejected something the host submitted.
    Consensus,
    /// Disk, wallet, or a broken invariant inside the host itself.
    Internal,
    /// Anything else, not actionable by the renter or the operator.
    Normal,
}

impl ErrorClass {
    pub const ALL: [ErrorClass; 5] = [
        ErrorClass::Communication,
        ErrorClass::Connection,
        ErrorClass::Consensus,
        ErrorClass::Internal,
        ErrorClass::Normal,
    ];

    /// `1 / probability` is the sampling rate once a class has passed
    /// `logAllLimit` occurrences.
    pub fn probability(self) -> u32 {
        match self {
            ErrorClass::Communication => 5,
            ErrorClass::Connection => 20,
            ErrorClass::Consensus => 1,
            ErrorClass::Internal => 3,
            ErrorClass::Normal => 20,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ErrorClass::Communication => 0,
            ErrorClass::Connection => 1,
            ErrorClass::Consensus => 2,
            ErrorClass::Internal => 3,
            ErrorClass::Normal => 4,
        }
    }
}

/// A classified host error. Only `Communication` variants are ever shown to
/// a renter verbatim (as a single short string); the others are logged and
/// either retried by the caller or surfaced as a generic failure.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("{0}")]
    Communication(String),
    #[error("{0}")]
    Connection(String),
    #[error("{0}")]
    Consensus(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    Normal(String),
}

impl HostError {
    pub fn class(&self) -> ErrorClass {
        match self {
            HostError::Communication(_) => ErrorClass::Communication,
            HostError::Connection(_) => ErrorClass::Connection,
            HostError::Consensus(_) => ErrorClass::Consensus,
            HostError::Internal(_) => ErrorClass::Internal,
            HostError::Normal(_) => ErrorClass::Normal,
        }
    }

    /// The text a renter is allowed to see: only `Communication` errors
    /// leak their message, everything else collapses to a generic string
    /// so internal details never reach the wire.
    pub fn renter_facing_message(&self) -> String {
        match self {
            HostError::Communication(msg) => msg.clone(),
            _ => "host could not complete the request".to_string(),
        }
    }
}
