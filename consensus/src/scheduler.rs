// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Action scheduler (component 4.D): re-evaluates each obligation due at
//! the current height against the four-step lifecycle check in the design.

use host_clock::BlockHeight;
use host_db::Store;
use host_key_management::Wallet;
use host_message_pool::{PoolError, TransactionPool};
use host_obligation_store::{ObligationError, ObligationStatus, ObligationStore, StorageObligation};
use host_types::{FileContractId, HostParams};

use crate::capability::ConsensusSet;
use crate::errors::ConsensusError;

/// Drains and re-evaluates every action item due at or before
/// `current_height`. Transient mempool/wallet failures re-queue the
/// obligation at `current_height + resubmission_timeout`; anything else
/// that leaves the obligation's invariants broken fails it immediately.
pub fn run_due<S, C, W, P>(
    obligations: &ObligationStore<S>,
    consensus: &C,
    wallet: &W,
    pool: &P,
    current_height: BlockHeight,
    params: &HostParams,
) -> Result<(), ConsensusError>
where
    S: Store,
    C: ConsensusSet,
    W: Wallet,
    P: TransactionPool,
{
    let due = obligations.drain_due_action_items(current_height)?;
    for (_, id) in due {
        if let Err(err) = evaluate_one(obligations, consensus, wallet, pool, id, current_height, params) {
            tracing::warn!(obligation = %id, error = %err, "action scheduler step failed");
        }
    }
    Ok(())
}

fn evaluate_one<S, C, W, P>(
    obligations: &ObligationStore<S>,
    consensus: &C,
    wallet: &W,
    pool: &P,
    id: FileContractId,
    current_height: BlockHeight,
    params: &HostParams,
) -> Result<(), ConsensusError>
where
    S: Store,
    C: ConsensusSet,
    W: Wallet,
    P: TransactionPool,
{
    let lock = match obligations.lock(id) {
        Ok(lock) => lock,
        Err(ObligationError::LockTimeout(_)) => {
            // someone else is actively mutating it (e.g. a live revise
            // session); try again next block instead of blocking the
            // scheduler.
            obligations.reschedule(current_height.next(), id)?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let so = obligations.get(&lock)?;
    if so.status.is_terminal() {
        return Ok(());
    }

    // Step 1: origin confirmation.
    if !so.flags.origin_confirmed && current_height >= so.negotiation_height.saturating_add(params.resubmission_timeout) {
        let deadline = so.window_start.saturating_sub(params.revision_submission_buffer);
        if current_height >= deadline {
            obligations.remove_obligation(&lock, so, ObligationStatus::Rejected)?;
            return Ok(());
        }
        match pool.submit(vec![so.origin_transaction_set.clone()]) {
            Ok(()) => {}
            Err(PoolError::Expired) => {
                obligations.remove_obligation(&lock, so, ObligationStatus::Rejected)?;
                return Ok(());
            }
            Err(_) => {
                obligations.reschedule(current_height.saturating_add(params.resubmission_timeout), id)?;
                return Ok(());
            }
        }
        return Ok(());
    }

    // Step 2: revision confirmation.
    if so.flags.origin_confirmed
        && !so.flags.revision_confirmed
        && current_height >= so.window_start.saturating_sub(params.revision_submission_buffer)
        && !so.revision_transaction_set.is_empty()
    {
        if pool.submit(vec![so.revision_transaction_set.clone()]).is_err() {
            obligations.reschedule(current_height.saturating_add(params.resubmission_timeout), id)?;
        }
        return Ok(());
    }

    // Step 3: storage proof.
    let proof_window_start = so.window_start.saturating_add(params.resubmission_timeout);
    if !so.flags.proof_confirmed && current_height >= proof_window_start && current_height <= so.window_end {
        return Ok(submit_storage_proof(obligations, consensus, wallet, pool, &lock, so, current_height, params)?);
    }

    // Step 4: finalize.
    if current_height >= so.window_end.saturating_add(params.storage_proof_confirmations) {
        let final_status = if so.flags.proof_confirmed {
            ObligationStatus::Succeeded
        } else {
            ObligationStatus::Failed
        };
        obligations.remove_obligation(&lock, so, final_status)?;
    }
    Ok(())
}

fn submit_storage_proof<S, C, W, P>(
    obligations: &ObligationStore<S>,
    consensus: &C,
    wallet: &W,
    pool: &P,
    _lock: &host_obligation_store::ObligationLock<'_>,
    so: StorageObligation,
    current_height: BlockHeight,
    params: &HostParams,
) -> Result<(), ConsensusError>
where
    S: Store,
    C: ConsensusSet,
    W: Wallet,
    P: TransactionPool,
{
    let segment = match consensus.storage_proof_segment(so.id) {
        Ok(s) => s,
        Err(_) => {
            obligations.reschedule(current_height.saturating_add(params.resubmission_timeout), so.id)?;
            return Ok(());
        }
    };
    let leaf_index = (segment as usize) % so.sector_roots.len().max(1);
    let Some(proof) = host_crypto::prove_leaf(&so.sector_roots, leaf_index) else {
        // no sectors to prove against; nothing to submit this round.
        obligations.reschedule(current_height.saturating_add(params.resubmission_timeout), so.id)?;
        return Ok(());
    };

    let mut message = Vec::new();
    message.extend_from_slice(so.id.as_ref());
    message.extend_from_slice(&leaf_index.to_le_bytes());
    for sibling in &proof.siblings {
        message.extend_from_slice(sibling);
    }
    let signed = match wallet.sign_transaction(&message) {
        Ok(bytes) => bytes,
        Err(_) => {
            obligations.reschedule(current_height.saturating_add(params.resubmission_timeout), so.id)?;
            return Ok(());
        }
    };

    match pool.submit(vec![signed]) {
        Ok(()) => Ok(()),
        Err(_) => {
            obligations.reschedule(current_height.saturating_add(params.resubmission_timeout), so.id)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use host_db::MemoryDb;
    use host_sector_store::SectorStore;
    use host_types::{Currency, FileContractId, SectorRoot};

    use super::*;
    use crate::capability::fake::FakeConsensusSet;
    use host_key_management::fake::FakeWallet;
    use host_message_pool::fake::FakeTransactionPool;
    use host_obligation_store::{ObligationAccounting, ObligationStatus, StorageObligation};

    fn setup() -> (ObligationStore<Arc<MemoryDb>>, HostParams) {
        let params = HostParams::testing();
        let db = Arc::new(MemoryDb::default());
        let persist_dir = tempfile::tempdir().unwrap().into_path();
        let sectors = Arc::new(SectorStore::open(db.clone(), persist_dir, [3u8; 32], &params).unwrap());
        let store = ObligationStore::open(db, sectors, &params).unwrap();
        (store, params)
    }

    fn obligation(id: u8, negotiation_height: u64, window_start: u64, window_end: u64) -> StorageObligation {
        StorageObligation::new(
            FileContractId([id; 32]),
            vec![9, 9, 9],
            BlockHeight::new(negotiation_height),
            BlockHeight::new(window_start),
            BlockHeight::new(window_end),
            ObligationAccounting {
                locked_collateral: Currency::from_coins(1),
                ..Default::default()
            },
        )
    }

    #[test]
    fn step1_submits_the_origin_transaction_set_once_due() {
        let (obligations, params) = setup();
        let so = obligation(1, 1, 100, 200);
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();

        evaluate_one(&obligations, &consensus, &wallet, &pool, so.id, BlockHeight::new(3), &params).unwrap();

        assert_eq!(pool.submissions(), vec![vec![so.origin_transaction_set.clone()]]);
    }

    #[test]
    fn step1_rejects_the_obligation_once_past_the_revision_deadline() {
        let (obligations, params) = setup();
        let so = obligation(2, 0, 5, 50);
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();

        evaluate_one(&obligations, &consensus, &wallet, &pool, so.id, BlockHeight::new(2), &params).unwrap();

        let lock = obligations.lock(so.id).unwrap();
        let stored = obligations.get(&lock).unwrap();
        assert_eq!(stored.status, ObligationStatus::Rejected);
        assert!(stored.status.is_terminal());
        assert!(pool.submissions().is_empty());
    }

    #[test]
    fn step2_submits_the_latest_revision_once_due() {
        let (obligations, params) = setup();
        let mut so = obligation(3, 1, 100, 200);
        so.flags.origin_confirmed = true;
        so.revision_transaction_set = vec![7, 7, 7];
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();

        evaluate_one(&obligations, &consensus, &wallet, &pool, so.id, BlockHeight::new(97), &params).unwrap();

        assert_eq!(pool.submissions(), vec![vec![so.revision_transaction_set.clone()]]);
    }

    #[test]
    fn step2_reschedules_after_a_transient_pool_rejection() {
        let (obligations, params) = setup();
        let mut so = obligation(4, 1, 100, 200);
        so.flags.origin_confirmed = true;
        so.revision_transaction_set = vec![7, 7, 7];
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();
        pool.reject_next_submission();

        evaluate_one(&obligations, &consensus, &wallet, &pool, so.id, BlockHeight::new(97), &params).unwrap();

        let due = obligations.drain_due_action_items(BlockHeight::new(97 + params.resubmission_timeout)).unwrap();
        assert!(due.iter().any(|(_, id)| *id == so.id));
    }

    #[test]
    fn step3_submits_a_signed_storage_proof_when_the_segment_is_known() {
        let (obligations, params) = setup();
        let mut so = obligation(5, 1, 100, 200);
        so.flags.origin_confirmed = true;
        so.flags.revision_confirmed = true;
        so.sector_roots = vec![SectorRoot([1u8; 32]), SectorRoot([2u8; 32])];
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        consensus.set_segment(so.id, 1);
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();

        let proof_window_start = so.window_start.saturating_add(params.resubmission_timeout);
        evaluate_one(&obligations, &consensus, &wallet, &pool, so.id, proof_window_start, &params).unwrap();

        assert_eq!(pool.submissions().len(), 1);
    }

    #[test]
    fn step3_reschedules_when_the_consensus_segment_is_not_yet_available() {
        let (obligations, params) = setup();
        let mut so = obligation(6, 1, 100, 200);
        so.flags.origin_confirmed = true;
        so.flags.revision_confirmed = true;
        so.sector_roots = vec![SectorRoot([1u8; 32])];
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();

        let proof_window_start = so.window_start.saturating_add(params.resubmission_timeout);
        evaluate_one(&obligations, &consensus, &wallet, &pool, so.id, proof_window_start, &params).unwrap();

        assert!(pool.submissions().is_empty());
        let due = obligations
            .drain_due_action_items(proof_window_start.saturating_add(params.resubmission_timeout))
            .unwrap();
        assert!(due.iter().any(|(_, id)| *id == so.id));
    }

    #[test]
    fn step4_finalizes_as_succeeded_once_the_proof_confirmed_and_the_window_closed() {
        let (obligations, params) = setup();
        let mut so = obligation(7, 1, 10, 50);
        so.flags.origin_confirmed = true;
        so.flags.revision_confirmed = true;
        so.flags.proof_confirmed = true;
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();

        let finalize_height = so.window_end.saturating_add(params.storage_proof_confirmations);
        evaluate_one(&obligations, &consensus, &wallet, &pool, so.id, finalize_height, &params).unwrap();

        let lock = obligations.lock(so.id).unwrap();
        assert_eq!(obligations.get(&lock).unwrap().status, ObligationStatus::Succeeded);
    }

    #[test]
    fn step4_finalizes_as_failed_when_the_window_closed_without_a_confirmed_proof() {
        let (obligations, params) = setup();
        let so = obligation(8, 1, 10, 50);
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();

        let finalize_height = so.window_end.saturating_add(params.storage_proof_confirmations);
        evaluate_one(&obligations, &consensus, &wallet, &pool, so.id, finalize_height, &params).unwrap();

        let lock = obligations.lock(so.id).unwrap();
        assert_eq!(obligations.get(&lock).unwrap().status, ObligationStatus::Failed);
    }

    #[test]
    fn run_due_drains_the_queue_and_submits_what_is_due() {
        let (obligations, params) = setup();
        let so = obligation(9, 1, 100, 200);
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();

        run_due(&obligations, &consensus, &wallet, &pool, BlockHeight::new(3), &params).unwrap();

        assert_eq!(pool.submissions(), vec![vec![so.origin_transaction_set.clone()]]);
    }
}
