//! The lock behind [`IndexRegistry`](crate::search::IndexRegistry).
//!
//! The registry keeps all open indexes in one map guarded by one lock:
//! `parking_lot::Mutex` with the `fast-lock` feature, `std::sync::Mutex`
//! otherwise. Every registry operation changes the map in a single call, so
//! a lock poisoned by a panicking caller still guards a consistent map and
//! is entered as usual.

use crate::{Error, Result};

#[cfg(feature = "fast-lock")]
pub use parking_lot::{Mutex, MutexGuard as Guard};

#[cfg(not(feature = "fast-lock"))]
pub use std::sync::{Mutex, MutexGuard as Guard};

/// Enter the lock, waiting while another caller holds it.
///
/// ```rust
/// use concord::sync::{lock, Mutex};
///
/// let open = Mutex::new(Vec::<u64>::new());
/// lock(&open).push(7);
/// assert_eq!(lock(&open).len(), 1);
/// ```
#[cfg(feature = "fast-lock")]
pub fn lock<T>(mutex: &Mutex<T>) -> Guard<'_, T> {
    mutex.lock()
}

/// Enter the lock, waiting while another caller holds it.
#[cfg(not(feature = "fast-lock"))]
pub fn lock<T>(mutex: &Mutex<T>) -> Guard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Enter the lock only if it is free; a held lock is [`Error::Registry`].
#[cfg(feature = "fast-lock")]
pub fn try_lock<T>(mutex: &Mutex<T>) -> Result<Guard<'_, T>> {
    mutex.try_lock().ok_or_else(busy)
}

/// Enter the lock only if it is free; a held lock is [`Error::Registry`].
#[cfg(not(feature = "fast-lock"))]
pub fn try_lock<T>(mutex: &Mutex<T>) -> Result<Guard<'_, T>> {
    match mutex.try_lock() {
        Ok(guard) => Ok(guard),
        Err(std::sync::TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
        Err(std::sync::TryLockError::WouldBlock) => Err(busy()),
    }
}

fn busy() -> Error {
    Error::registry("index registry is busy")
}
