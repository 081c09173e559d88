// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consensus follower (component 4.E): tracks the chain tip, applies and
//! reverts confirmation flags as blocks arrive, and drives the action
//! scheduler off the result.

use parking_lot::Mutex;

use host_clock::BlockHeight;
use host_db::Store;
use host_key_management::Wallet;
use host_message_pool::TransactionPool;
use host_obligation_store::ObligationStore;
use host_types::HostParams;

use crate::capability::{BlockContractActivity, ConsensusEvent, ConsensusSet};
use crate::errors::ConsensusError;
use crate::scheduler;

/// Subscribes to a blockchain delta channel and keeps the obligation store's
/// confirmation flags and tracked height in sync with it. Does not own a
/// thread of its own: a caller drives it by repeatedly calling
/// [`ConsensusFollower::process_next`].
pub struct ConsensusFollower<'a, S, C, W, P> {
    obligations: &'a ObligationStore<S>,
    consensus: &'a C,
    wallet: &'a W,
    pool: &'a P,
    params: &'a HostParams,
    height: Mutex<BlockHeight>,
}

impl<'a, S, C, W, P> ConsensusFollower<'a, S, C, W, P>
where
    S: Store,
    C: ConsensusSet,
    W: Wallet,
    P: TransactionPool,
{
    pub fn new(obligations: &'a ObligationStore<S>, consensus: &'a C, wallet: &'a W, pool: &'a P, params: &'a HostParams) -> Self {
        ConsensusFollower {
            obligations,
            consensus,
            wallet,
            pool,
            params,
            height: Mutex::new(BlockHeight::GENESIS),
        }
    }

    pub fn height(&self) -> BlockHeight {
        *self.height.lock()
    }

    /// Blocks for the next event and applies it. Returns the tracked height
    /// after the event was processed.
    pub fn process_next(&self) -> Result<BlockHeight, ConsensusError> {
        match self.consensus.recv()? {
            ConsensusEvent::Applied(activity) => self.apply(activity)?,
            ConsensusEvent::Reverted(activity) => self.revert(activity)?,
            ConsensusEvent::InvalidCursor => self.rescan()?,
        }
        Ok(self.height())
    }

    fn apply(&self, activity: BlockContractActivity) -> Result<(), ConsensusError> {
        for (id, kind) in &activity.confirmations {
            let lock = self.obligations.lock(*id)?;
            self.obligations.set_confirmed(&lock, *kind)?;
        }
        *self.height.lock() = activity.height;
        scheduler::run_due(self.obligations, self.consensus, self.wallet, self.pool, activity.height, self.params)
    }

    fn revert(&self, activity: BlockContractActivity) -> Result<(), ConsensusError> {
        for (id, kind) in &activity.confirmations {
            let lock = self.obligations.lock(*id)?;
            self.obligations.clear_confirmed(&lock, *kind)?;
        }
        *self.height.lock() = activity.height.prev();
        Ok(())
    }

    /// The consensus layer's cursor no longer matches anything this host
    /// remembers (e.g. it pruned past our last seen block). Resets to
    /// genesis, clears every confirmation flag and queued action item, and
    /// re-subscribes: the next applied blocks will rebuild state from
    /// scratch.
    fn rescan(&self) -> Result<(), ConsensusError> {
        *self.height.lock() = BlockHeight::GENESIS;
        self.obligations.clear_action_items()?;
        for id in self.obligations.all_ids()? {
            let lock = self.obligations.lock(id)?;
            for kind in [
                host_types::ConfirmationKind::Origin,
                host_types::ConfirmationKind::Revision,
                host_types::ConfirmationKind::Proof,
            ] {
                self.obligations.clear_confirmed(&lock, kind)?;
            }
        }
        self.consensus.resubscribe_from_genesis()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use host_db::MemoryDb;
    use host_sector_store::SectorStore;
    use host_types::{Currency, FileContractId};

    use super::*;
    use crate::capability::fake::FakeConsensusSet;
    use host_key_management::fake::FakeWallet;
    use host_message_pool::fake::FakeTransactionPool;
    use host_obligation_store::{ObligationAccounting, StorageObligation};

    fn setup() -> (ObligationStore<Arc<MemoryDb>>, HostParams) {
        let params = HostParams::testing();
        let db = Arc::new(MemoryDb::default());
        let persist_dir = tempfile::tempdir().unwrap().into_path();
        let sectors = Arc::new(SectorStore::open(db.clone(), persist_dir, [1u8; 32], &params).unwrap());
        let folder_dir = tempfile::tempdir().unwrap();
        sectors
            .add_storage_folder(folder_dir.into_path(), params.minimum_storage_folder_size)
            .unwrap();
        let store = ObligationStore::open(db, sectors, &params).unwrap();
        (store, params)
    }

    fn obligation(id: u8) -> StorageObligation {
        StorageObligation::new(
            FileContractId([id; 32]),
            vec![],
            BlockHeight::new(1),
            BlockHeight::new(100),
            BlockHeight::new(200),
            ObligationAccounting {
                locked_collateral: Currency::from_coins(1),
                ..Default::default()
            },
        )
    }

    #[test]
    fn applying_a_block_sets_flags_and_advances_height() {
        let (obligations, params) = setup();
        let so = obligation(1);
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();
        let follower = ConsensusFollower::new(&obligations, &consensus, &wallet, &pool, &params);

        consensus.push(ConsensusEvent::Applied(BlockContractActivity {
            height: BlockHeight::new(5),
            confirmations: vec![(so.id, host_types::ConfirmationKind::Origin)],
        }));
        let height = follower.process_next().unwrap();
        assert_eq!(height, BlockHeight::new(5));

        let lock = obligations.lock(so.id).unwrap();
        assert!(obligations.get(&lock).unwrap().flags.origin_confirmed);
    }

    #[test]
    fn reverting_a_block_clears_the_flag_it_set_and_rewinds_height() {
        let (obligations, params) = setup();
        let so = obligation(2);
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();
        let follower = ConsensusFollower::new(&obligations, &consensus, &wallet, &pool, &params);

        let activity = BlockContractActivity {
            height: BlockHeight::new(5),
            confirmations: vec![(so.id, host_types::ConfirmationKind::Revision)],
        };
        consensus.push(ConsensusEvent::Applied(activity.clone()));
        follower.process_next().unwrap();

        consensus.push(ConsensusEvent::Reverted(activity));
        let height = follower.process_next().unwrap();
        assert_eq!(height, BlockHeight::new(4));

        let lock = obligations.lock(so.id).unwrap();
        assert!(!obligations.get(&lock).unwrap().flags.revision_confirmed);
    }

    #[test]
    fn an_invalid_cursor_resets_height_and_clears_all_flags() {
        let (obligations, params) = setup();
        let so = obligation(3);
        obligations.add_obligation(so.clone()).unwrap();

        let consensus = FakeConsensusSet::new();
        let wallet = FakeWallet::new();
        let pool = FakeTransactionPool::default();
        let follower = ConsensusFollower::new(&obligations, &consensus, &wallet, &pool, &params);

        consensus.push(ConsensusEvent::Applied(BlockContractActivity {
            height: BlockHeight::new(5),
            confirmations: vec![(so.id, host_types::ConfirmationKind::Proof)],
        }));
        follower.process_next().unwrap();

        consensus.push(ConsensusEvent::InvalidCursor);
        let height = follower.process_next().unwrap();
        assert_eq!(height, BlockHeight::GENESIS);

        let lock = obligations.lock(so.id).unwrap();
        assert!(!obligations.get(&lock).unwrap().flags.proof_confirmed);
    }
}
