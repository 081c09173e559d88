// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use host_types::{Currency, NetAddress, UnlockHash};

/// Operator-editable settings. `remaining_storage` and `total_storage` are
/// deliberately absent: both are derived each call from the sector engine's
/// live folder state, so there is no setter through which they could be
/// changed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InternalSettings {
    pub accepting_contracts: bool,
    pub net_address: NetAddress,
    /// Payout address for this host's share of contract proceeds. `None`
    /// until first set; immutable afterward.
    pub unlock_hash: Option<UnlockHash>,
    pub window_size: u64,
    /// Per-byte, per-block collateral rate the host offers.
    pub collateral: Currency,
    /// Ceiling on collateral committed to any single contract.
    pub max_collateral: Currency,
    /// Numerator in the `payout * collateral_fraction / (collateral_fraction
    /// + 1_000_000)` formula used to size a contract's collateral
    /// contribution during formation (see the negotiation protocol).
    pub collateral_fraction: u64,
    pub min_contract_price: Currency,
    pub min_download_price: Currency,
    pub min_upload_price: Currency,
    pub min_storage_price: Currency,
}

impl InternalSettings {
    pub fn new(net_address: NetAddress, window_size: u64) -> Self {
        InternalSettings {
            accepting_contracts: false,
            net_address,
            unlock_hash: None,
            window_size,
            collateral: Currency::ZERO,
            max_collateral: Currency::ZERO,
            collateral_fraction: 0,
            min_contract_price: Currency::ZERO,
            min_download_price: Currency::ZERO,
            min_upload_price: Currency::ZERO,
            min_storage_price: Currency::ZERO,
        }
    }
}
