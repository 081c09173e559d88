// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use host_types::{Currency, NetAddress, UnlockHash};

mod signature_bytes {
    use serde::de::{Error as _, SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    struct SignatureVisitor;

    impl<'de> Visitor<'de> for SignatureVisitor {
        type Value = [u8; 64];

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a 64-byte signature")
        }

        fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            <[u8; 64]>::try_from(v).map_err(|_| E::invalid_length(v.len(), &self))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut out = [0u8; 64];
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = seq
                    .next_element()?
                    .ok_or_else(|| A::Error::invalid_length(i, &self))?;
            }
            Ok(out)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 64], D::Error> {
        deserializer.deserialize_bytes(SignatureVisitor)
    }
}

/// Settings computed fresh for each RPC call and signed before being sent
/// to a renter. Everything here is either copied from [`crate::InternalSettings`]
/// or derived at call time (`remaining_storage`, `total_storage`,
/// `contract_price`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalSettings {
    pub accepting_contracts: bool,
    pub net_address: NetAddress,
    pub remaining_storage: u64,
    pub sector_size: u64,
    pub total_storage: u64,
    pub unlock_hash: UnlockHash,
    pub window_size: u64,
    pub collateral: Currency,
    pub max_collateral: Currency,
    pub contract_price: Currency,
    pub download_price: Currency,
    pub upload_price: Currency,
    pub storage_price: Currency,
    pub revision_number: u64,
}

/// The wire-level settings response: the settings themselves plus a
/// 64-byte Ed25519 signature over their canonical JSON encoding, made with
/// the host's persistent key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedExternalSettings {
    pub settings: ExternalSettings,
    #[serde(with = "signature_bytes")]
    pub signature: [u8; 64],
}
