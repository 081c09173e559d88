// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

/// Which of a storage obligation's three confirmation flags a block's
/// transaction set affects. Shared between the consensus follower, which
/// sets and reverts these flags as blocks apply and revert, and the
/// obligation store, which persists them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationKind {
    Origin,
    Revision,
    Proof,
}
