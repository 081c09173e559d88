// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use host_types::Currency;

use crate::obligation::ObligationAccounting;

/// Host-wide accumulators, updated whenever an obligation finalizes.
/// "Potential" figures move to the matching "actual" accumulator on
/// success, or to `lost_revenue` / `lost_collateral` on failure or
/// rejection; they never move twice for the same obligation.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub potential_storage_revenue: Currency,
    pub storage_revenue: Currency,
    pub potential_download_revenue: Currency,
    pub download_revenue: Currency,
    pub potential_upload_revenue: Currency,
    pub upload_revenue: Currency,
    pub locked_storage_collateral: Currency,
    pub risked_storage_collateral: Currency,
    pub lost_revenue: Currency,
    pub lost_storage_collateral: Currency,
}

impl FinancialMetrics {
    /// Records that an obligation whose accounting fields are `accounting`
    /// has just been added; its figures start out "potential".
    pub fn record_added(&mut self, accounting: &ObligationAccounting) {
        self.potential_storage_revenue =
            self.potential_storage_revenue + accounting.potential_storage_revenue;
        self.potential_download_revenue =
            self.potential_download_revenue + accounting.potential_download_revenue;
        self.potential_upload_revenue =
            self.potential_upload_revenue + accounting.potential_upload_revenue;
        self.locked_storage_collateral = self.locked_storage_collateral + accounting.locked_collateral;
    }

    /// Moves one obligation's potential figures to actual (`succeeded`) or
    /// lost (`failed`/`rejected`) accumulators and releases its locked
    /// collateral.
    pub fn record_finalized(&mut self, accounting: &ObligationAccounting, succeeded: bool) {
        self.locked_storage_collateral = self
            .locked_storage_collateral
            .saturating_sub(accounting.locked_collateral);

        if succeeded {
            self.storage_revenue = self.storage_revenue + accounting.potential_storage_revenue;
            self.download_revenue = self.download_revenue + accounting.potential_download_revenue;
            self.upload_revenue = self.upload_revenue + accounting.potential_upload_revenue;
        } else {
            self.lost_revenue = self.lost_revenue + accounting.potential_storage_revenue;
            self.lost_storage_collateral =
                self.lost_storage_collateral + accounting.locked_collateral;
        }
    }
}
