// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use parking_lot::Mutex;

use host_crypto::HostKey;
use host_db::{Store, BUCKET_HOST_STATE};
use host_message_pool::TransactionPool;
use host_sector_store::SectorStore;
use host_types::{Currency, NetAddress, UnlockHash};

use crate::errors::SettingsError;
use crate::external::{ExternalSettings, SignedExternalSettings};
use crate::internal::InternalSettings;

const SETTINGS_KEY: &str = "settings";

#[derive(serde::Serialize, serde::Deserialize)]
struct PersistedSettings {
    internal: InternalSettings,
    revision_number: u64,
}

/// Owns the operator-editable settings, the host's persistent signing key,
/// and the monotonic revision counter bumped on every external-settings
/// response. `remaining_storage`/`total_storage` are read live from the
/// shared [`SectorStore`] rather than cached here.
pub struct SettingsStore<S> {
    store: S,
    sectors: Arc<SectorStore<S>>,
    key: HostKey,
    sector_size: u64,
    inner: Mutex<PersistedSettings>,
}

impl<S: Store> SettingsStore<S> {
    pub fn open(
        store: S,
        sectors: Arc<SectorStore<S>>,
        key: HostKey,
        sector_size: u64,
        default_net_address: NetAddress,
        default_window_size: u64,
    ) -> Result<Self, SettingsError> {
        let inner = match store.read_bucket(SETTINGS_KEY, BUCKET_HOST_STATE)? {
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| SettingsError::CorruptRecord(e.to_string()))?
            }
            None => PersistedSettings {
                internal: InternalSettings::new(default_net_address, default_window_size),
                revision_number: 0,
            },
        };
        Ok(SettingsStore {
            store,
            sectors,
            key,
            sector_size,
            inner: Mutex::new(inner),
        })
    }

    fn persist(&self, inner: &PersistedSettings) -> Result<(), SettingsError> {
        let bytes = serde_json::to_vec(inner).expect("settings are serializable");
        self.store.write_bucket(SETTINGS_KEY, bytes, BUCKET_HOST_STATE)?;
        Ok(())
    }

    pub fn internal(&self) -> InternalSettings {
        self.inner.lock().internal.clone()
    }

    /// The host's public signing key, published so renters can verify a
    /// signed settings response without a prior trust relationship.
    pub fn verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        self.key.verifying_key()
    }

    pub fn set_accepting_contracts(&self, accepting: bool) -> Result<(), SettingsError> {
        let mut inner = self.inner.lock();
        inner.internal.accepting_contracts = accepting;
        self.persist(&inner)
    }

    pub fn set_net_address(&self, raw: &str) -> Result<(), SettingsError> {
        let parsed = NetAddress::parse(raw)?;
        let mut inner = self.inner.lock();
        inner.internal.net_address = parsed;
        self.persist(&inner)
    }

    /// Sets the payout address. Fails once it has already been set once:
    /// the unlock hash identifies the host side of every 2-of-2 contract
    /// output, and changing it after contracts reference it would strand
    /// their payouts.
    pub fn set_unlock_hash(&self, unlock_hash: UnlockHash) -> Result<(), SettingsError> {
        let mut inner = self.inner.lock();
        if inner.internal.unlock_hash.is_some() {
            return Err(SettingsError::UnlockHashImmutable);
        }
        inner.internal.unlock_hash = Some(unlock_hash);
        self.persist(&inner)
    }

    pub fn set_window_size(&self, window_size: u64) -> Result<(), SettingsError> {
        if window_size == 0 {
            return Err(SettingsError::ZeroWindowSize);
        }
        let mut inner = self.inner.lock();
        inner.internal.window_size = window_size;
        self.persist(&inner)
    }

    pub fn set_collateral(&self, collateral: Currency, max_collateral: Currency, collateral_fraction: u64) -> Result<(), SettingsError> {
        let mut inner = self.inner.lock();
        inner.internal.collateral = collateral;
        inner.internal.max_collateral = max_collateral;
        inner.internal.collateral_fraction = collateral_fraction;
        self.persist(&inner)
    }

    pub fn set_prices(
        &self,
        min_contract_price: Currency,
        min_download_price: Currency,
        min_upload_price: Currency,
        min_storage_price: Currency,
    ) -> Result<(), SettingsError> {
        let mut inner = self.inner.lock();
        inner.internal.min_contract_price = min_contract_price;
        inner.internal.min_download_price = min_download_price;
        inner.internal.min_upload_price = min_upload_price;
        inner.internal.min_storage_price = min_storage_price;
        self.persist(&inner)
    }

    /// Computes fresh external settings, bumps the revision number, and
    /// signs the result with the host key. `pool` supplies the current
    /// mempool fee floor used to derive `contract_price`.
    pub fn quote<P: TransactionPool>(&self, pool: &P) -> Result<SignedExternalSettings, SettingsError> {
        let mut inner = self.inner.lock();
        inner.revision_number += 1;
        self.persist(&inner)?;

        let folders = self.sectors.folders();
        let total_storage = folders.iter().map(|f| f.size).sum();
        let remaining_storage = folders.iter().map(|f| f.size_remaining).sum();

        let fee_estimate = pool.min_fee_per_byte().checked_mul(10_000).unwrap_or(Currency::ZERO);
        let contract_price = inner.internal.min_contract_price.max(fee_estimate);

        let settings = ExternalSettings {
            accepting_contracts: inner.internal.accepting_contracts,
            net_address: inner.internal.net_address.clone(),
            remaining_storage,
            sector_size: self.sector_size,
            total_storage,
            unlock_hash: inner.internal.unlock_hash.unwrap_or(UnlockHash([0u8; 32])),
            window_size: inner.internal.window_size,
            collateral: inner.internal.collateral,
            max_collateral: inner.internal.max_collateral,
            contract_price,
            download_price: inner.internal.min_download_price,
            upload_price: inner.internal.min_upload_price,
            storage_price: inner.internal.min_storage_price,
            revision_number: inner.revision_number,
        };
        drop(inner);

        let encoded = serde_json::to_vec(&settings).expect("external settings are serializable");
        let signature = self.key.sign(&encoded).to_bytes();
        Ok(SignedExternalSettings { settings, signature })
    }
}

#[cfg(test)]
mod tests {
    use host_db::MemoryDb;
    use host_types::HostParams;

    use super::*;

    fn setup() -> SettingsStore<Arc<MemoryDb>> {
        let params = HostParams::testing();
        let db = Arc::new(MemoryDb::default());
        let persist_dir = tempfile::tempdir().unwrap().into_path();
        let sectors = Arc::new(SectorStore::open(db.clone(), persist_dir, [3u8; 32], &params).unwrap());
        SettingsStore::open(
            db,
            sectors,
            HostKey::generate(),
            params.sector_size,
            NetAddress::parse("127.0.0.1:9982").unwrap(),
            params.window_size,
        )
        .unwrap()
    }

    #[test]
    fn unlock_hash_can_only_be_set_once() {
        let settings = setup();
        settings.set_unlock_hash(UnlockHash([1u8; 32])).unwrap();
        assert!(matches!(
            settings.set_unlock_hash(UnlockHash([2u8; 32])),
            Err(SettingsError::UnlockHashImmutable)
        ));
    }

    #[test]
    fn net_address_setter_rejects_unparseable_input() {
        let settings = setup();
        assert!(settings.set_net_address("no-port-here").is_err());
        assert!(settings.set_net_address("example.com:1234").is_ok());
    }

    #[test]
    fn each_quote_bumps_the_revision_number() {
        let settings = setup();
        let pool = host_message_pool::fake::FakeTransactionPool::default();
        let first = settings.quote(&pool).unwrap();
        let second = settings.quote(&pool).unwrap();
        assert_eq!(second.settings.revision_number, first.settings.revision_number + 1);
    }

    #[test]
    fn contract_price_is_the_higher_of_floor_and_mempool_estimate() {
        let settings = setup();
        settings
            .set_prices(Currency::from_coins(5), Currency::ZERO, Currency::ZERO, Currency::ZERO)
            .unwrap();
        let cheap_pool = host_message_pool::fake::FakeTransactionPool::new(Currency::from_base_units(1));
        let quote = settings.quote(&cheap_pool).unwrap();
        assert_eq!(quote.settings.contract_price, Currency::from_coins(5));

        let expensive_pool =
            host_message_pool::fake::FakeTransactionPool::new(Currency::from_coins(1));
        let quote = settings.quote(&expensive_pool).unwrap();
        assert_eq!(quote.settings.contract_price, Currency::from_coins(10_000));
    }

    #[test]
    fn signature_verifies_against_the_host_key() {
        let settings = setup();
        let pool = host_message_pool::fake::FakeTransactionPool::default();
        let signed = settings.quote(&pool).unwrap();
        let encoded = serde_json::to_vec(&signed.settings).unwrap();
        let signature = ed25519_dalek::Signature::from_bytes(&signed.signature);
        assert!(host_crypto::verify(&settings.verifying_key(), &encoded, &signature).is_ok());
    }
}
