// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use host_errors::ErrorClass;

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("{0}")]
    Communication(String),
    #[error(transparent)]
    Wire(#[from] host_wire::WireError),
    #[error(transparent)]
    Sector(#[from] host_sector_store::SectorError),
    #[error(transparent)]
    Obligation(#[from] host_obligation_store::ObligationError),
    #[error(transparent)]
    Settings(#[from] host_settings::SettingsError),
    #[error("wallet error: {0}")]
    Wallet(String),
    #[error("mempool rejected the transaction set: {0}")]
    Pool(String),
    #[error("host is shutting down")]
    HostClosed,
    #[error("deadline exceeded")]
    Timeout,
}

impl NegotiationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            NegotiationError::Communication(_) => ErrorClass::Communication,
            NegotiationError::Wire(_) | NegotiationError::Timeout => ErrorClass::Connection,
            NegotiationError::Pool(_) => ErrorClass::Consensus,
            NegotiationError::Sector(_)
            | NegotiationError::Obligation(_)
            | NegotiationError::Settings(_)
            | NegotiationError::Wallet(_)
            | NegotiationError::HostClosed => ErrorClass::Internal,
        }
    }

    /// The text that is safe to send back to the renter: only
    /// `Communication` failures describe themselves, everything else
    /// collapses to a generic message.
    pub fn renter_facing_message(&self) -> String {
        match self {
            NegotiationError::Communication(msg) => msg.clone(),
            NegotiationError::HostClosed => "host closed".to_string(),
            NegotiationError::Timeout => "deadline exceeded".to_string(),
            _ => "host could not complete the request".to_string(),
        }
    }
}
