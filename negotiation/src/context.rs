// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use host_clock::BlockHeight;
use host_db::Store;
use host_key_management::Wallet;
use host_message_pool::TransactionPool;
use host_obligation_store::ObligationStore;
use host_sector_store::SectorStore;
use host_settings::SettingsStore;
use host_types::HostParams;

/// Tracks the chain tip the negotiation protocol should validate proposed
/// contracts and revisions against. Updated by whatever drives the
/// consensus follower; read (never written) by every RPC handler.
#[derive(Default)]
pub struct HeightCell(AtomicU64);

impl HeightCell {
    pub fn new(height: BlockHeight) -> Self {
        HeightCell(AtomicU64::new(height.as_u64()))
    }

    pub fn get(&self) -> BlockHeight {
        BlockHeight::new(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, height: BlockHeight) {
        self.0.store(height.as_u64(), Ordering::Release);
    }
}

/// Everything one RPC handler needs: the shared stores, the capability
/// interfaces onto the wallet and mempool, the resolved size/timing
/// constants, the tracked chain tip, and the shutdown flag every handler
/// must observe at its next suspension point.
pub struct HostContext<S, W, P> {
    pub obligations: Arc<ObligationStore<S>>,
    pub sectors: Arc<SectorStore<S>>,
    pub settings: Arc<SettingsStore<S>>,
    pub wallet: Arc<W>,
    pub pool: Arc<P>,
    pub params: HostParams,
    pub height: Arc<HeightCell>,
    pub closed: Arc<AtomicBool>,
}

impl<S, W, P> HostContext<S, W, P>
where
    S: Store,
    W: Wallet,
    P: TransactionPool,
{
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
