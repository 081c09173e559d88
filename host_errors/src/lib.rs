// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error classifier & log rate-limiter (component 4.H): a tagged error
//! taxonomy plus the exponentially-thinned sampling policy that keeps a
//! flood of a single error class from drowning the log.

mod error;
mod limiter;

pub use error::{ErrorClass, HostError};
pub use limiter::LogRateLimiter;
