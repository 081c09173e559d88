// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires every crate built so far into one running host: opens storage,
//! loads or creates the host identity, builds the shared stores, and
//! drives both the negotiation listener and the consensus follower until
//! shutdown is requested.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use host_consensus::fake::FakeConsensusSet;
use host_consensus::ConsensusFollower;
use host_errors::LogRateLimiter;
use host_key_management::fake::FakeWallet;
use host_message_pool::fake::FakeTransactionPool;
use host_negotiation::{HeightCell, HostContext};
use host_obligation_store::ObligationStore;
use host_sector_store::SectorStore;
use host_settings::SettingsStore;
use host_types::{HostParams, NetAddress};

use crate::config::Config;
use crate::identity;
use crate::storage::AnyDb;

/// Builds every shared store and returns a context plus a bound listener,
/// ready for [`run`].
pub async fn build(config: &Config) -> anyhow::Result<(Arc<HostContext<Arc<AnyDb>, FakeWallet, FakeTransactionPool>>, TcpListener)> {
    let params = HostParams::for_flavor(config.flavor);

    let db = Arc::new(AnyDb::open(&config.persist_dir, config.ephemeral)?);
    let key = identity::load_or_generate(&db)?;
    let host_salt = identity::derive_host_salt(&key);

    let sectors = Arc::new(SectorStore::open(db.clone(), config.persist_dir.clone(), host_salt, &params)?);

    if sectors.folders().is_empty() {
        for folder in &config.storage_folders {
            std::fs::create_dir_all(&folder.path)?;
            sectors.add_storage_folder(folder.path.clone(), folder.size_bytes)?;
            info!(path = %folder.path.display(), size = folder.size_bytes, "registered storage folder");
        }
    }

    let obligations = Arc::new(ObligationStore::open(db.clone(), sectors.clone(), &params)?);

    let default_net_address = NetAddress::parse(&config.listen_address.to_string())?;
    let settings = Arc::new(SettingsStore::open(
        db.clone(),
        sectors.clone(),
        key.clone(),
        params.sector_size,
        default_net_address,
        params.window_size,
    )?);

    let wallet = Arc::new(FakeWallet::new());
    let pool = Arc::new(FakeTransactionPool::default());

    let ctx = Arc::new(HostContext {
        obligations,
        sectors,
        settings,
        wallet,
        pool,
        params,
        height: Arc::new(HeightCell::default()),
        closed: Arc::new(AtomicBool::new(false)),
    });

    let listener = TcpListener::bind(config.listen_address).await?;
    Ok((ctx, listener))
}

/// Spawns the consensus follower on a blocking thread (its `recv` is a
/// synchronous call onto whatever the consensus engine's delta channel
/// is) and mirrors its height into the context's [`HeightCell`].
///
/// Wired against [`FakeConsensusSet`] here: a real deployment supplies its
/// own `ConsensusSet`, `Wallet`, and `TransactionPool` by generalizing
/// [`HostContext`] over them the same way this function does, since the
/// blockchain client, wallet, and mempool are out of scope for this crate.
fn spawn_consensus_follower(
    ctx: Arc<HostContext<Arc<AnyDb>, FakeWallet, FakeTransactionPool>>,
    consensus: Arc<FakeConsensusSet>,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let follower = ConsensusFollower::new(&*ctx.obligations, &*consensus, &*ctx.wallet, &*ctx.pool, &ctx.params);
        loop {
            if ctx.is_closed() {
                return;
            }
            match follower.process_next() {
                Ok(height) => ctx.height.set(height),
                Err(err) => {
                    warn!(error = %err, "consensus follower stalled, retrying");
                    std::thread::sleep(std::time::Duration::from_millis(500));
                }
            }
        }
    })
}

/// Runs the daemon until its context is closed or the negotiation listener
/// exits with an error.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let (ctx, listener) = build(config).await?;
    let consensus = Arc::new(FakeConsensusSet::new());
    let follower_handle = spawn_consensus_follower(ctx.clone(), consensus);
    let limiter = Arc::new(LogRateLimiter::new(ctx.params.log_all_limit, ctx.params.log_few_limit));

    info!(address = %config.listen_address, flavor = ?config.flavor, "storage host listening");

    let result = host_negotiation::serve(listener, ctx.clone(), limiter).await;
    ctx.closed.store(true, std::sync::atomic::Ordering::Release);
    follower_handle.abort();
    result.map_err(anyhow::Error::from)
}

#[cfg(test)]
mod tests {
    use host_types::ReleaseFlavor;

    use super::*;
    use crate::config::Config;

    fn ephemeral_config(persist_dir: std::path::PathBuf) -> Config {
        Config {
            persist_dir,
            listen_address: "127.0.0.1:0".parse().unwrap(),
            flavor: ReleaseFlavor::Testing,
            log_filter: "info".to_string(),
            log_dir: None,
            storage_folders: Vec::new(),
            ephemeral: true,
        }
    }

    #[tokio::test]
    async fn build_wires_every_store_and_binds_the_listener() {
        let dir = tempfile::tempdir().unwrap();
        let config = ephemeral_config(dir.path().to_path_buf());

        let (ctx, listener) = build(&config).await.unwrap();

        assert!(listener.local_addr().is_ok());
        assert_eq!(ctx.sectors.folders().len(), 0);
        assert!(!ctx.is_closed());
    }

    #[tokio::test]
    async fn build_registers_configured_storage_folders_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let folder_dir = dir.path().join("folder0");
        let mut config = ephemeral_config(dir.path().to_path_buf());
        config.storage_folders.push(crate::config::StorageFolderConfig {
            path: folder_dir.clone(),
            size_bytes: HostParams::testing().minimum_storage_folder_size,
        });

        let (ctx, _listener) = build(&config).await.unwrap();

        assert_eq!(ctx.sectors.folders().len(), 1);
        assert!(folder_dir.exists());
    }
}
