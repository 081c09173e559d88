// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent storage-obligation map (component 4.C): one record per
//! accepted file contract, a bounded per-ID lock so concurrent RPCs on the
//! same contract linearize, and the height-indexed action-item queue that
//! the action scheduler (component 4.D, in `host-consensus`) drains.

mod action_items;
mod errors;
mod lock;
mod metrics;
mod obligation;
mod store;

pub use action_items::{
    clear_all as clear_action_items, drain_up_to as drain_action_items, schedule as schedule_action_item,
};
pub use errors::ObligationError;
pub use lock::ObligationLock;
pub use metrics::FinancialMetrics;
pub use obligation::{ObligationAccounting, ObligationFlags, ObligationStatus, StorageObligation};
pub use store::ObligationStore;
