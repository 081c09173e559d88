// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use host_clock::BlockHeight;
use host_types::{ConfirmationKind, FileContractId};

use crate::errors::ConsensusError;

/// The contract-relevant content of one block, reduced to exactly what the
/// follower needs: which tracked obligations had an origin, revision, or
/// storage-proof transaction confirmed. Full transaction parsing is the
/// consensus engine's job, not this crate's.
#[derive(Clone, Debug, Default)]
pub struct BlockContractActivity {
    pub height: BlockHeight,
    pub confirmations: Vec<(FileContractId, ConfirmationKind)>,
}

/// A single update from the blockchain delta channel.
#[derive(Clone, Debug)]
pub enum ConsensusEvent {
    Applied(BlockContractActivity),
    Reverted(BlockContractActivity),
    /// The consensus layer's cursor no longer matches anything the host
    /// remembers; the follower must rescan from genesis.
    InvalidCursor,
}

/// Capability interface onto the blockchain consensus engine. The engine
/// itself — block validation, chain selection, transaction parsing — lives
/// entirely outside this crate; a production host wires a real
/// implementation, tests inject [`fake::FakeConsensusSet`].
pub trait ConsensusSet: Send + Sync {
    /// Blocks until the next delta (or invalid-cursor notice) is available.
    fn recv(&self) -> Result<ConsensusEvent, ConsensusError>;

    /// Re-subscribes from genesis after a rescan.
    fn resubscribe_from_genesis(&self) -> Result<(), ConsensusError>;

    /// The segment index a storage proof for `id` must cover, derived from
    /// a block the consensus engine has already committed to.
    fn storage_proof_segment(&self, id: FileContractId) -> Result<u64, ConsensusError>;
}

pub mod fake {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// In-memory `ConsensusSet` for tests: events are pushed by the test,
    /// `recv` pops them in order and blocks (briefly, via spin-park) when
    /// the queue is empty only long enough for the test to push more.
    #[derive(Default)]
    pub struct FakeConsensusSet {
        events: Mutex<VecDeque<ConsensusEvent>>,
        segments: Mutex<std::collections::HashMap<FileContractId, u64>>,
    }

    impl FakeConsensusSet {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, event: ConsensusEvent) {
            self.events.lock().unwrap().push_back(event);
        }

        pub fn set_segment(&self, id: FileContractId, segment: u64) {
            self.segments.lock().unwrap().insert(id, segment);
        }
    }

    impl ConsensusSet for FakeConsensusSet {
        fn recv(&self) -> Result<ConsensusEvent, ConsensusError> {
            self.events
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ConsensusError::Unavailable("no queued events".into()))
        }

        fn resubscribe_from_genesis(&self) -> Result<(), ConsensusError> {
            Ok(())
        }

        fn storage_proof_segment(&self, id: FileContractId) -> Result<u64, ConsensusError> {
            self.segments
                .lock()
                .unwrap()
                .get(&id)
                .copied()
                .ok_or(ConsensusError::SegmentUnavailable)
        }
    }
}
