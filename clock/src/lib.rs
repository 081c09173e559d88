// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Block height arithmetic.
//!
//! The host has no wall clock of its own: every deadline in the negotiation
//! and obligation state machines is expressed as an offset from the chain's
//! current block height, as reported by the consensus follower.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A block height, counted from the chain's genesis block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHeight(u64);

impl BlockHeight {
    pub const GENESIS: BlockHeight = BlockHeight(0);

    pub fn new(height: u64) -> Self {
        BlockHeight(height)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Height after advancing by `delta` blocks, saturating instead of overflowing.
    pub fn saturating_add(self, delta: u64) -> Self {
        BlockHeight(self.0.saturating_add(delta))
    }

    /// Height after reverting by `delta` blocks, saturating at genesis.
    pub fn saturating_sub(self, delta: u64) -> Self {
        BlockHeight(self.0.saturating_sub(delta))
    }

    /// One block after `self`, used when advancing the tracked tip on an applied block.
    pub fn next(self) -> Self {
        self.saturating_add(1)
    }

    /// One block before `self`, used when rewinding the tracked tip on a reverted block.
    /// Genesis never reverts further.
    pub fn prev(self) -> Self {
        if self.0 == 0 {
            self
        } else {
            BlockHeight(self.0 - 1)
        }
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BlockHeight {
    fn from(value: u64) -> Self {
        BlockHeight(value)
    }
}

impl Add<u64> for BlockHeight {
    type Output = BlockHeight;
    fn add(self, rhs: u64) -> BlockHeight {
        self.saturating_add(rhs)
    }
}

impl Sub<u64> for BlockHeight {
    type Output = BlockHeight;
    fn sub(self, rhs: u64) -> BlockHeight {
        self.saturating_sub(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_and_prev_are_inverses_away_from_genesis() {
        let h = BlockHeight::new(10);
        assert_eq!(h.next().prev(), h);
    }

    #[test]
    fn genesis_never_reverts_below_zero() {
        assert_eq!(BlockHeight::GENESIS.prev(), BlockHeight::GENESIS);
    }

    #[test]
    fn ordering_matches_underlying_integer() {
        assert!(BlockHeight::new(5) < BlockHeight::new(6));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn saturating_add_then_saturating_sub_never_goes_past_the_start(
            start in 0u64..=u64::MAX,
            delta in 0u64..=u64::MAX,
        ) {
            let advanced = BlockHeight::new(start).saturating_add(delta);
            prop_assert!(advanced.saturating_sub(delta).as_u64() <= start);
        }
    }
}
