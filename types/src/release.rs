// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

/// Selects which set of size and timing constants the host is built with.
/// The reference implementation baked these in as module-level constants
/// selected by a build tag; here the choice is made once, explicitly, when
/// the host is constructed (see `DESIGN.md`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseFlavor {
    Production,
    Development,
    Testing,
}

/// All size limits, timeouts, and logging thresholds that the reference
/// specification pins to a release flavor. Resolved once at host
/// construction and threaded through every component as a shared,
/// read-only value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostParams {
    pub flavor: ReleaseFlavor,

    /// Fixed size of every sector, in bytes.
    pub sector_size: u64,
    /// Maximum number of expiries a single sector-usage record may carry
    /// before an additional virtual reference is refused.
    pub maximum_virtual_sectors: usize,
    /// Length in bytes of a storage folder's UID.
    pub storage_folder_uid_len: usize,
    pub minimum_storage_folder_size: u64,
    pub maximum_storage_folder_size: u64,
    pub maximum_storage_folders: usize,

    /// Upper bound on concurrently locked obligations, bounding the memory
    /// consumed by per-ID locks.
    pub maximum_locked_storage_obligations: usize,
    /// How long `LockObligation` blocks waiting for a contended lock before
    /// giving up.
    pub obligation_lock_timeout_ms: u64,

    /// Blocks to wait before resubmitting a transaction that failed to
    /// confirm, and the fixed retry delay used for failed proof
    /// submissions (Open Question (ii): fixed-delay retry, not exponential).
    pub resubmission_timeout: u64,
    /// Safety margin, in blocks, before `window_start` by which the latest
    /// revision must have been submitted.
    pub revision_submission_buffer: u64,
    /// Assumed reorg depth; sector expiries for newly added sectors are set
    /// to `window_start + reorg_depth` so a shallow reorg cannot strand
    /// bytes the host is still obligated to prove.
    pub reorg_depth: u64,
    /// Default width of a contract's proof window.
    pub window_size: u64,
    /// Blocks after `window_end` a proof must be buried before the
    /// obligation is finalized.
    pub storage_proof_confirmations: u64,

    /// Minimum spacing between accepted connections, per listener.
    pub rpc_ratelimit_ms: u64,
    /// Wire-format size ceilings.
    pub max_contract_len: usize,
    pub max_revision_size: u64,
    pub default_max_download_batch_size: u64,

    /// Deadlines, in seconds, for each RPC phase.
    pub form_contract_deadline_secs: u64,
    pub iterated_connection_time_secs: u64,
    pub iterated_per_iteration_secs: u64,
    pub settings_deadline_secs: u64,
    pub initial_accept_deadline_secs: u64,

    /// Error-classifier log rate limiting thresholds, shared across classes;
    /// per-class sampling probabilities live in `host_errors`.
    pub log_all_limit: u64,
    pub log_few_limit: u64,
}

impl HostParams {
    pub fn production() -> Self {
        HostParams {
            flavor: ReleaseFlavor::Production,
            sector_size: 4 * 1024 * 1024,
            maximum_virtual_sectors: 250,
            storage_folder_uid_len: 4,
            minimum_storage_folder_size: 256 * 1024 * 1024,
            maximum_storage_folder_size: 8 * 1024 * 1024 * 1024 * 1024,
            maximum_storage_folders: 100,
            maximum_locked_storage_obligations: 100,
            obligation_lock_timeout_ms: 5 * 60 * 1000,
            resubmission_timeout: 3,
            revision_submission_buffer: 144,
            reorg_depth: 18,
            window_size: 144,
            storage_proof_confirmations: 6,
            rpc_ratelimit_ms: 50,
            max_contract_len: 8 * 1024,
            max_revision_size: 100 * 1024 * 1024,
            default_max_download_batch_size: 500 * 1024 * 1024,
            form_contract_deadline_secs: 120,
            iterated_connection_time_secs: 1200,
            iterated_per_iteration_secs: 300,
            settings_deadline_secs: 60,
            initial_accept_deadline_secs: 300,
            log_all_limit: 250,
            log_few_limit: 2500,
        }
    }

    pub fn development() -> Self {
        HostParams {
            flavor: ReleaseFlavor::Development,
            window_size: 40,
            revision_submission_buffer: 20,
            reorg_depth: 5,
            storage_proof_confirmations: 2,
            maximum_storage_folders: 10,
            ..HostParams::production()
        }
    }

    pub fn testing() -> Self {
        HostParams {
            flavor: ReleaseFlavor::Testing,
            sector_size: 4096,
            maximum_virtual_sectors: 5,
            storage_folder_uid_len: 1,
            minimum_storage_folder_size: 4096 * 3,
            maximum_storage_folder_size: 4096 * 1_000,
            maximum_storage_folders: 4,
            maximum_locked_storage_obligations: 8,
            obligation_lock_timeout_ms: 500,
            resubmission_timeout: 2,
            revision_submission_buffer: 3,
            reorg_depth: 2,
            window_size: 10,
            storage_proof_confirmations: 1,
            rpc_ratelimit_ms: 0,
            max_contract_len: 8 * 1024,
            max_revision_size: 4096 * 50,
            default_max_download_batch_size: 4096 * 100,
            form_contract_deadline_secs: 5,
            iterated_connection_time_secs: 10,
            iterated_per_iteration_secs: 5,
            settings_deadline_secs: 5,
            initial_accept_deadline_secs: 5,
            log_all_limit: 3,
            log_few_limit: 6,
        }
    }

    pub fn for_flavor(flavor: ReleaseFlavor) -> Self {
        match flavor {
            ReleaseFlavor::Production => Self::production(),
            ReleaseFlavor::Development => Self::development(),
            ReleaseFlavor::Testing => Self::testing(),
        }
    }
}
