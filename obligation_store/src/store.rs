// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use host_clock::BlockHeight;
use host_db::{Store, BUCKET_STORAGE_OBLIGATIONS};
use host_sector_store::SectorStore;
use host_types::{ConfirmationKind, FileContractId, HostParams, SectorRoot};

use crate::action_items;
use crate::errors::ObligationError;
use crate::lock::{LockRegistry, ObligationLock};
use crate::metrics::FinancialMetrics;
use crate::obligation::{ObligationStatus, StorageObligation};

const METRICS_KEY: &str = "financial_metrics";

/// Persistent map of file-contract ID to [`StorageObligation`], the
/// height-indexed action-item queue that schedules re-evaluation, and the
/// host-wide revenue accumulators. Sector mutations on `ModifyObligation`
/// and `RemoveObligation` are delegated to the shared [`SectorStore`].
pub struct ObligationStore<S> {
    store: S,
    sectors: Arc<SectorStore<S>>,
    locks: LockRegistry,
    lock_timeout: Duration,
    resubmission_timeout: u64,
    reorg_depth: u64,
    metrics: Mutex<FinancialMetrics>,
}

impl<S: Store> ObligationStore<S> {
    pub fn open(store: S, sectors: Arc<SectorStore<S>>, params: &HostParams) -> Result<Self, ObligationError> {
        let metrics = match store.read_bucket(METRICS_KEY, BUCKET_STORAGE_OBLIGATIONS)? {
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| ObligationError::CorruptRecord(e.to_string()))?
            }
            None => FinancialMetrics::default(),
        };
        Ok(ObligationStore {
            store,
            sectors,
            locks: LockRegistry::new(params.maximum_locked_storage_obligations),
            lock_timeout: Duration::from_millis(params.obligation_lock_timeout_ms),
            resubmission_timeout: params.resubmission_timeout,
            reorg_depth: params.reorg_depth,
            metrics: Mutex::new(metrics),
        })
    }

    /// Every tracked obligation's ID, in no particular order. Used by the
    /// consensus follower's rescan to clear confirmation flags everywhere.
    pub fn all_ids(&self) -> Result<Vec<FileContractId>, ObligationError> {
        Ok(self
            .store
            .iter_bucket(BUCKET_STORAGE_OBLIGATIONS)?
            .into_iter()
            .filter(|(key, _)| key.as_slice() != METRICS_KEY.as_bytes())
            .filter_map(|(key, _)| <[u8; 32]>::try_from(key).ok())
            .map(FileContractId)
            .collect())
    }

    pub fn metrics(&self) -> FinancialMetrics {
        *self.metrics.lock()
    }

    /// Drains every action item due at or before `height`, handing
    /// ownership of the re-evaluation to the caller (the action scheduler).
    pub fn drain_due_action_items(
        &self,
        height: BlockHeight,
    ) -> Result<Vec<(BlockHeight, FileContractId)>, ObligationError> {
        Ok(action_items::drain_up_to(&self.store, height)?)
    }

    /// Re-queues an obligation for another look, typically after a
    /// transient mempool/wallet failure.
    pub fn reschedule(&self, height: BlockHeight, id: FileContractId) -> Result<(), ObligationError> {
        Ok(action_items::schedule(&self.store, height, id)?)
    }

    /// Clears the entire action-item queue, used by a consensus rescan.
    pub fn clear_action_items(&self) -> Result<(), ObligationError> {
        Ok(action_items::clear_all(&self.store)?)
    }

    fn persist_metrics(&self) -> Result<(), ObligationError> {
        let bytes = serde_json::to_vec(&*self.metrics.lock()).expect("financial metrics are serializable");
        self.store.write_bucket(METRICS_KEY, bytes, BUCKET_STORAGE_OBLIGATIONS)?;
        Ok(())
    }

    fn load(&self, id: FileContractId) -> Result<StorageObligation, ObligationError> {
        let bytes = self
            .store
            .read_bucket(id.as_ref(), BUCKET_STORAGE_OBLIGATIONS)?
            .ok_or_else(|| ObligationError::NotFound(id.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ObligationError::CorruptRecord(e.to_string()))
    }

    fn persist(&self, so: &StorageObligation) -> Result<(), ObligationError> {
        let bytes = serde_json::to_vec(so).expect("storage obligation is serializable");
        self.store.write_bucket(so.id.as_ref(), bytes, BUCKET_STORAGE_OBLIGATIONS)?;
        Ok(())
    }

    /// Reads the obligation a lock was taken for.
    pub fn get(&self, lock: &ObligationLock<'_>) -> Result<StorageObligation, ObligationError> {
        self.load(lock.id())
    }

    pub fn lock(&self, id: FileContractId) -> Result<ObligationLock<'_>, ObligationError> {
        self.locks.lock(id, self.lock_timeout)
    }

    /// Sets one confirmation flag, driven by the consensus follower scanning
    /// an applied block.
    pub fn set_confirmed(&self, lock: &ObligationLock<'_>, kind: ConfirmationKind) -> Result<(), ObligationError> {
        let mut so = self.get(lock)?;
        match kind {
            ConfirmationKind::Origin => so.flags.origin_confirmed = true,
            ConfirmationKind::Revision => so.flags.revision_confirmed = true,
            ConfirmationKind::Proof => so.flags.proof_confirmed = true,
        }
        self.persist(&so)
    }

    /// Clears one confirmation flag, driven by the consensus follower
    /// undoing a reverted block.
    pub fn clear_confirmed(&self, lock: &ObligationLock<'_>, kind: ConfirmationKind) -> Result<(), ObligationError> {
        let mut so = self.get(lock)?;
        match kind {
            ConfirmationKind::Origin => so.flags.origin_confirmed = false,
            ConfirmationKind::Revision => so.flags.revision_confirmed = false,
            ConfirmationKind::Proof => so.flags.proof_confirmed = false,
        }
        self.persist(&so)
    }

    /// Inserts a newly-negotiated obligation and schedules its three
    /// lifecycle action items.
    pub fn add_obligation(&self, so: StorageObligation) -> Result<(), ObligationError> {
        let _guard = self.locks.lock(so.id, self.lock_timeout)?;
        if self.store.exists_bucket(so.id.as_ref(), BUCKET_STORAGE_OBLIGATIONS)? {
            return Err(ObligationError::AlreadyExists(so.id.to_string()));
        }

        action_items::schedule(
            &self.store,
            so.negotiation_height.saturating_add(self.resubmission_timeout),
            so.id,
        )?;
        action_items::schedule(&self.store, so.window_start, so.id)?;
        action_items::schedule(
            &self.store,
            so.window_end.saturating_add(self.resubmission_timeout),
            so.id,
        )?;

        self.metrics.lock().record_added(&so.accounting);
        self.persist_metrics()?;
        self.persist(&so)
    }

    /// Applies a revision's sector delta and persists the updated
    /// obligation. `added`/`removed` roots must have been validated by the
    /// caller; `new_sector_bytes[i]` is the content for `added[i]`.
    pub fn modify_obligation(
        &self,
        lock: &ObligationLock<'_>,
        mut so: StorageObligation,
        added: &[SectorRoot],
        new_sector_bytes: &[&[u8]],
        removed: &[SectorRoot],
        revision_transaction_set: Vec<u8>,
    ) -> Result<(), ObligationError> {
        debug_assert_eq!(lock.id(), so.id);
        debug_assert_eq!(added.len(), new_sector_bytes.len());

        let expiry = so.window_start.saturating_add(self.reorg_depth);
        for (root, bytes) in added.iter().zip(new_sector_bytes.iter()) {
            self.sectors.add_sector(*root, expiry, bytes)?;
            so.sector_roots.push(*root);
        }
        for root in removed {
            self.sectors.remove_sector(*root, expiry)?;
            so.sector_roots.retain(|r| r != root);
        }

        so.revision_transaction_set = revision_transaction_set;
        self.persist(&so)
    }

    /// Releases every sector an obligation references, marks it terminal,
    /// and moves its accounting out of the "potential" accumulators.
    pub fn remove_obligation(
        &self,
        lock: &ObligationLock<'_>,
        mut so: StorageObligation,
        final_status: ObligationStatus,
    ) -> Result<(), ObligationError> {
        debug_assert_eq!(lock.id(), so.id);
        if so.status.is_terminal() {
            return Err(ObligationError::AlreadyTerminal(so.id.to_string()));
        }
        let expiry = so.window_start.saturating_add(self.reorg_depth);
        for root in so.sector_roots.drain(..).collect::<Vec<_>>() {
            // the sector may already be gone (offloaded away during a
            // folder removal that failed to relocate it); that's the
            // documented error path, not a bug here.
            let _ = self.sectors.remove_sector(root, expiry);
        }
        so.status = final_status;

        self.metrics
            .lock()
            .record_finalized(&so.accounting, final_status == ObligationStatus::Succeeded);
        self.persist_metrics()?;
        self.persist(&so)
    }
}
