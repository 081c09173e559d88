// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use host_clock::BlockHeight;
use host_types::{Currency, FileContractId, SectorRoot};

/// Terminal states are one-way: once `succeeded`, `failed`, or `rejected`,
/// an obligation never returns to `unresolved`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObligationStatus {
    Unresolved,
    Succeeded,
    Failed,
    Rejected,
}

impl ObligationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ObligationStatus::Unresolved)
    }
}

/// Confirmation flags set by the consensus follower as it scans applied
/// blocks, and cleared again on a revert of the block that set them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationFlags {
    pub origin_confirmed: bool,
    pub revision_confirmed: bool,
    pub proof_confirmed: bool,
}

/// Accounting fields carried by one obligation, denominated in the host
/// currency. `contract_cost` is the host's own overhead, deducted from
/// `potential_storage_revenue` at finalization rather than tracked
/// separately.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ObligationAccounting {
    pub locked_collateral: Currency,
    pub risked_collateral: Currency,
    pub potential_storage_revenue: Currency,
    pub potential_download_revenue: Currency,
    pub potential_upload_revenue: Currency,
    pub contract_cost: Currency,
}

/// One accepted file contract and everything the host tracks about it from
/// acceptance through finalization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageObligation {
    pub id: FileContractId,
    /// The complete signed transaction set containing the file contract,
    /// as handed to the mempool on accept. Opaque to this crate: validating
    /// and broadcasting it is the `TransactionPool`/`Wallet` capabilities'
    /// job, not the obligation store's.
    pub origin_transaction_set: Vec<u8>,
    /// Latest signed revision transaction set, replaced wholesale by each
    /// accepted `RPCReviseContract` round.
    pub revision_transaction_set: Vec<u8>,
    pub sector_roots: Vec<SectorRoot>,
    pub flags: ObligationFlags,
    pub accounting: ObligationAccounting,
    pub status: ObligationStatus,
    pub negotiation_height: BlockHeight,
    pub window_start: BlockHeight,
    pub window_end: BlockHeight,
    /// Revision number of the most recently committed revision, `0` for an
    /// obligation still on its origin contract. The negotiation protocol
    /// enforces that each accepted revision strictly increases this.
    #[serde(default)]
    pub revision_number: u64,
}

impl StorageObligation {
    pub fn new(
        id: FileContractId,
        origin_transaction_set: Vec<u8>,
        negotiation_height: BlockHeight,
        window_start: BlockHeight,
        window_end: BlockHeight,
        accounting: ObligationAccounting,
    ) -> Self {
        StorageObligation {
            id,
            origin_transaction_set,
            revision_transaction_set: Vec::new(),
            sector_roots: Vec::new(),
            flags: ObligationFlags::default(),
            accounting,
            status: ObligationStatus::Unresolved,
            negotiation_height,
            window_start,
            window_end,
            revision_number: 0,
        }
    }
}
