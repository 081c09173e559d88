// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain primitives shared across the storage host: currency, contract and
//! sector identifiers, and the build-time release presets that size the
//! rest of the system.

mod confirmation;
mod currency;
mod ids;
mod net_address;
mod release;

pub use confirmation::ConfirmationKind;
pub use currency::Currency;
pub use ids::{FileContractId, SectorId, SectorRoot, StorageFolderUid, UnlockHash};
pub use net_address::{NetAddress, NetAddressError};
pub use release::{HostParams, ReleaseFlavor};
