// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings & pricing (component 4.G): operator-editable internal settings,
//! the externally-quoted price table derived from them on every RPC call,
//! and the signed settings response sent to renters.

mod errors;
mod external;
mod internal;
mod store;

pub use errors::SettingsError;
pub use external::{ExternalSettings, SignedExternalSettings};
pub use internal::InternalSettings;
pub use store::SettingsStore;
