// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::errors::CryptoError;

/// The host's persistent Ed25519 identity. Generated once at first startup
/// and carried in `host.json` thereafter; every signed external-settings
/// response and revision co-signature comes from this key.
#[derive(Clone)]
pub struct HostKey {
    signing: SigningKey,
}

/// Serialized form of a [`HostKey`]: just the 32-byte seed, from which the
/// signing and verifying keys are both reconstructed.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostKeySeed(pub [u8; 32]);

impl HostKey {
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::from_seed(HostKeySeed(seed))
    }

    pub fn from_seed(seed: HostKeySeed) -> Self {
        HostKey {
            signing: SigningKey::from_bytes(&seed.0),
        }
    }

    pub fn seed(&self) -> HostKeySeed {
        HostKeySeed(self.signing.to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing.sign(message)
    }
}

pub fn verify(key: &VerifyingKey, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
    key.verify(message, signature)
        .map_err(|_| CryptoError::BadSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_verifies_against_the_matching_key() {
        let key = HostKey::generate();
        let sig = key.sign(b"external settings v3");
        assert!(verify(&key.verifying_key(), b"external settings v3", &sig).is_ok());
    }

    #[test]
    fn signature_fails_against_a_different_key() {
        let key = HostKey::generate();
        let other = HostKey::generate();
        let sig = key.sign(b"external settings v3");
        assert!(verify(&other.verifying_key(), b"external settings v3", &sig).is_err());
    }

    #[test]
    fn round_trips_through_its_seed() {
        let key = HostKey::generate();
        let restored = HostKey::from_seed(key.seed());
        assert_eq!(key.verifying_key(), restored.verifying_key());
    }
}
