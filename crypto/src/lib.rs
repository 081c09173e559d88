// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptographic primitives for the storage host: Merkle accounting over
//! sectors and contracts, salted sector-identifier derivation, and the
//! host's persistent signing key.

mod errors;
pub mod merkle;
mod sector_id;
mod signing;

pub use errors::CryptoError;
pub use merkle::{
    file_root, prove_leaf, sector_root, verify_leaf, MerkleProof, StreamingSegmentTree, SEGMENT_SIZE,
};
pub use sector_id::sector_id;
pub use signing::{verify, HostKey, HostKeySeed};
