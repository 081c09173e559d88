// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use host_types::FileContractId;

use crate::errors::ObligationError;

/// Bounded per-ID lock registry. At most `cap` obligations may be locked
/// concurrently, independent of which IDs they are, so a misbehaving
/// renter opening many simultaneous revise sessions cannot grow memory
/// without bound.
pub struct LockRegistry {
    locked: Mutex<HashSet<FileContractId>>,
    cvar: Condvar,
    cap: usize,
}

/// Proof that `id` is locked. Dropping it releases the lock; obligation
/// mutation methods require one to be presented.
pub struct ObligationLock<'a> {
    registry: &'a LockRegistry,
    id: FileContractId,
}

impl ObligationLock<'_> {
    pub fn id(&self) -> FileContractId {
        self.id
    }
}

impl Drop for ObligationLock<'_> {
    fn drop(&mut self) {
        self.registry.locked.lock().remove(&self.id);
        self.registry.cvar.notify_all();
    }
}

impl LockRegistry {
    pub fn new(cap: usize) -> Self {
        LockRegistry {
            locked: Mutex::new(HashSet::new()),
            cvar: Condvar::new(),
            cap,
        }
    }

    pub fn lock(&self, id: FileContractId, timeout: Duration) -> Result<ObligationLock<'_>, ObligationError> {
        let deadline = Instant::now() + timeout;
        let mut locked = self.locked.lock();
        loop {
            if !locked.contains(&id) && locked.len() < self.cap {
                locked.insert(id);
                return Ok(ObligationLock { registry: self, id });
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ObligationError::LockTimeout(id.to_string()));
            }
            let result = self.cvar.wait_for(&mut locked, remaining);
            if result.timed_out() {
                return Err(ObligationError::LockTimeout(id.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn a_locked_id_cannot_be_locked_again_until_released() {
        let registry = Arc::new(LockRegistry::new(4));
        let id = FileContractId([1u8; 32]);
        let guard = registry.lock(id, Duration::from_millis(200)).unwrap();

        let failed = registry.lock(id, Duration::from_millis(50));
        assert!(matches!(failed, Err(ObligationError::LockTimeout(_))));

        drop(guard);
        assert!(registry.lock(id, Duration::from_millis(50)).is_ok());
    }

    #[test]
    fn acquisitions_beyond_the_cap_block_then_fail() {
        let registry = Arc::new(LockRegistry::new(1));
        let a = FileContractId([1u8; 32]);
        let b = FileContractId([2u8; 32]);
        let _guard = registry.lock(a, Duration::from_millis(200)).unwrap();
        assert!(matches!(
            registry.lock(b, Duration::from_millis(50)),
            Err(ObligationError::LockTimeout(_))
        ));
    }

    #[test]
    fn releasing_a_lock_wakes_a_blocked_waiter() {
        let registry = Arc::new(LockRegistry::new(1));
        let a = FileContractId([1u8; 32]);
        let b = FileContractId([2u8; 32]);
        let guard = registry.lock(a, Duration::from_millis(500)).unwrap();

        let waiter_registry = registry.clone();
        let handle = thread::spawn(move || waiter_registry.lock(b, Duration::from_millis(500)).is_ok());

        thread::sleep(Duration::from_millis(50));
        drop(guard);
        assert!(handle.join().unwrap());
    }
}
