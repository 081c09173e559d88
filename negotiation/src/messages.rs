// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured RPC payloads.
//!
//! Full transaction encoding is the consensus engine's concern, out of
//! scope here (see [`crate::context`]); what the negotiation protocol
//! actually needs to validate is the handful of financial and identity
//! fields a file contract or revision carries. Each message below names
//! those fields directly and carries the opaque, already-assembled
//! transaction bytes alongside them, the same reduction
//! `host_consensus::BlockContractActivity` applies to block content.

use serde::{Deserialize, Serialize};

use host_clock::BlockHeight;
use host_types::{Currency, FileContractId, SectorRoot, UnlockHash};

/// The financial and identity terms of a proposed file contract, as lifted
/// out of the opaque transaction set the renter also sends.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposedContractTerms {
    pub id: FileContractId,
    pub file_size: u64,
    pub file_merkle_root: [u8; 32],
    pub window_start: BlockHeight,
    pub window_end: BlockHeight,
    pub unlock_hash: UnlockHash,
    pub renter_payout: Currency,
    pub host_valid_payout: Currency,
    pub host_missed_payout: Currency,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormContractRequest {
    pub accept: bool,
    pub terms: ProposedContractTerms,
    pub transaction_set: Vec<Vec<u8>>,
    pub offered_fee: Currency,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormContractResponse {
    pub transaction_set: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenewContractRequest {
    pub prior_obligation_id: FileContractId,
    pub accept: bool,
    pub terms: ProposedContractTerms,
    pub transaction_set: Vec<Vec<u8>>,
    pub offered_fee: Currency,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposedRevisionTerms {
    pub contract_id: FileContractId,
    pub revision_number: u64,
    pub window_start: BlockHeight,
    pub window_end: BlockHeight,
    pub unlock_hash: UnlockHash,
    pub new_file_size: u64,
    pub new_file_merkle_root: [u8; 32],
    pub renter_payout: Currency,
    pub host_valid_payout: Currency,
    pub host_missed_payout: Currency,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviseContractBegin {
    pub contract_id: FileContractId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RevisionSnapshot {
    pub terms: Option<ProposedRevisionTerms>,
    pub revision_transaction_set: Vec<u8>,
}

/// One iteration of the revise loop. `delta_len` bytes of new sector data
/// follow this message on the wire, raw (not length-prefixed again) so the
/// host can tee them into the sector engine and a Merkle builder while
/// reading.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviseIteration {
    pub terms: ProposedRevisionTerms,
    pub added_roots: Vec<SectorRoot>,
    pub removed_roots: Vec<SectorRoot>,
    pub delta_len: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviseAck {
    pub accepted: bool,
    pub reason: Option<String>,
    pub revision_transaction_set: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadRange {
    pub sector_index: usize,
    pub offset: u64,
    pub length: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub contract_id: FileContractId,
    pub ranges: Vec<DownloadRange>,
    pub terms: ProposedRevisionTerms,
    pub revision_transaction_set: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RevisionRequest {
    pub contract_id: FileContractId,
}
