// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use host_clock::BlockHeight;
use proptest::prelude::*;

proptest! {
    #[test]
    fn saturating_add_never_overflows(start in 0u64..=u64::MAX, delta in 0u64..=u64::MAX) {
        let got = BlockHeight::new(start).saturating_add(delta);
        prop_assert!(got.as_u64() >= start || delta == 0);
    }

    #[test]
    fn next_then_prev_returns_to_start_away_from_genesis(start in 1u64..=u64::MAX - 1) {
        let height = BlockHeight::new(start);
        prop_assert_eq!(height.next().prev(), height);
    }

    #[test]
    fn saturating_sub_never_underflows_below_genesis(start in 0u64..=u64::MAX, delta in 0u64..=u64::MAX) {
        let got = BlockHeight::new(start).saturating_sub(delta);
        prop_assert!(got.as_u64() <= start);
    }

    #[test]
    fn ordering_matches_the_underlying_integer(a in 0u64..=u64::MAX, b in 0u64..=u64::MAX) {
        prop_assert_eq!(BlockHeight::new(a) < BlockHeight::new(b), a < b);
    }
}
