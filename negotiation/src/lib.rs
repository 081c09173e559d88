// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TCP RPC negotiation protocol (spec component 4.F): the wire-level
//! contract lifecycle a renter drives against this host — settings
//! queries, contract formation, iterated revision, renewal, download, and
//! lost-revision recovery.
//!
//! Every handler here is generic over the same capability interfaces used
//! elsewhere in this daemon ([`host_key_management::Wallet`],
//! [`host_message_pool::TransactionPool`]) and the shared stores
//! ([`host_obligation_store::ObligationStore`],
//! [`host_sector_store::SectorStore`], [`host_settings::SettingsStore`]).
//! None of them parse or construct a real blockchain transaction: see
//! [`messages`] for why that's out of scope.

mod context;
mod download;
mod errors;
mod form_contract;
mod json_io;
mod listener;
mod messages;
mod renew_contract;
mod revise_contract;
mod revision_request;
mod settings_rpc;

pub use context::{HeightCell, HostContext};
pub use errors::NegotiationError;
pub use listener::serve;
pub use messages::{
    DownloadRange, DownloadRequest, FormContractRequest, FormContractResponse, ProposedContractTerms,
    ProposedRevisionTerms, RenewContractRequest, ReviseAck, ReviseContractBegin, ReviseIteration, RevisionRequest,
    RevisionSnapshot,
};

#[cfg(test)]
mod test_support {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use host_crypto::HostKey;
    use host_db::MemoryDb;
    use host_key_management::fake::FakeWallet;
    use host_message_pool::fake::FakeTransactionPool;
    use host_obligation_store::ObligationStore;
    use host_sector_store::SectorStore;
    use host_settings::SettingsStore;
    use host_types::{HostParams, NetAddress};

    use crate::context::{HeightCell, HostContext};

    pub type TestContext = HostContext<Arc<MemoryDb>, FakeWallet, FakeTransactionPool>;

    /// A fully wired, in-memory [`HostContext`] with testing-flavor params,
    /// for driving a handler against a real (in-memory) [`tokio::io::duplex`]
    /// pair instead of mocking the stores it touches.
    pub fn setup() -> Arc<TestContext> {
        let params = HostParams::testing();
        let db = Arc::new(MemoryDb::default());
        let persist_dir = tempfile::tempdir().unwrap().into_path();
        let sectors = Arc::new(SectorStore::open(db.clone(), persist_dir, [5u8; 32], &params).unwrap());
        let obligations = Arc::new(ObligationStore::open(db.clone(), sectors.clone(), &params).unwrap());
        let settings = Arc::new(
            SettingsStore::open(
                db,
                sectors.clone(),
                HostKey::generate(),
                params.sector_size,
                NetAddress::parse("127.0.0.1:9982").unwrap(),
                params.window_size,
            )
            .unwrap(),
        );
        Arc::new(HostContext {
            obligations,
            sectors,
            settings,
            wallet: Arc::new(FakeWallet::new()),
            pool: Arc::new(FakeTransactionPool::default()),
            params,
            height: Arc::new(HeightCell::default()),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }
}
