// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consensus-follower capability interface, block-delta application, and
//! the action scheduler (components 4.D and 4.E).
//!
//! Block validation and chain selection belong to the consensus engine this
//! daemon runs alongside, not to this crate: [`ConsensusSet`] names the
//! narrow slice of that engine the host actually needs, and
//! [`ConsensusFollower`] is the only thing here that calls into it.

mod capability;
mod errors;
mod follower;
mod scheduler;

pub use capability::{fake, BlockContractActivity, ConsensusEvent, ConsensusSet};
pub use errors::ConsensusError;
pub use follower::ConsensusFollower;
pub use scheduler::run_due;
