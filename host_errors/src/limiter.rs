// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::error::ErrorClass;

/// Per-class occurrence counters and the log-flood guard built on top of
/// them. The first `log_all_limit` occurrences of a class are always
/// logged in full; beyond that, occurrences are sampled at `1 /
/// probability`, and beyond `log_few_limit` the sampling probability is
/// divided by 25 on top of that.
pub struct LogRateLimiter {
    counts: [AtomicU64; 5],
    log_all_limit: u64,
    log_few_limit: u64,
}

impl LogRateLimiter {
    pub fn new(log_all_limit: u64, log_few_limit: u64) -> Self {
        LogRateLimiter {
            counts: Default::default(),
            log_all_limit,
            log_few_limit,
        }
    }

    /// Records one occurrence of `class` and reports whether this
    /// particular occurrence should be logged.
    pub fn should_log(&self, class: ErrorClass) -> bool {
        let count = self.counts[class.index()].fetch_add(1, Ordering::Relaxed) + 1;
        if count <= self.log_all_limit {
            return true;
        }
        let divisor = if count <= self.log_few_limit {
            class.probability()
        } else {
            class.probability().saturating_mul(25)
        };
        rand::thread_rng().gen_ratio(1, divisor.max(1))
    }

    pub fn count(&self, class: ErrorClass) -> u64 {
        self.counts[class.index()].load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_first_log_all_limit_occurrences_always_log() {
        let limiter = LogRateLimiter::new(3, 100);
        for _ in 0..3 {
            assert!(limiter.should_log(ErrorClass::Consensus));
        }
    }

    #[test]
    fn counts_accumulate_per_class_independently() {
        let limiter = LogRateLimiter::new(1, 10);
        limiter.should_log(ErrorClass::Internal);
        limiter.should_log(ErrorClass::Internal);
        limiter.should_log(ErrorClass::Normal);
        assert_eq!(limiter.count(ErrorClass::Internal), 2);
        assert_eq!(limiter.count(ErrorClass::Normal), 1);
    }

    #[test]
    fn consensus_errors_always_log_past_the_limit_since_its_probability_is_one() {
        let limiter = LogRateLimiter::new(1, 1_000_000);
        limiter.should_log(ErrorClass::Consensus);
        assert!(limiter.should_log(ErrorClass::Consensus));
    }
}
