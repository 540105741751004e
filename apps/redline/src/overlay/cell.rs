//! Latest-value cell
//!
//! Long-lived callbacks hold a clone of the cell and read it at call time,
//! so they always observe the most recent value instead of the one captured
//! when they were registered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Debug)]
struct Inner<T> {
    value: RwLock<Arc<T>>,
    version: AtomicU64,
}

/// Shared, versioned holder of the most recent value
#[derive(Debug)]
pub struct LatestCell<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for LatestCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for LatestCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> LatestCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(Arc::new(value)),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Current value
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.inner.value.read())
    }

    /// Replace the value and return the new version
    pub fn set(&self, value: T) -> u64 {
        let mut slot = self.inner.value.write();
        *slot = Arc::new(value);
        self.inner.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Number of replacements so far
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Value and version read together
    pub fn stamped(&self) -> (u64, Arc<T>) {
        let slot = self.inner.value.read();
        (self.inner.version.load(Ordering::Acquire), Arc::clone(&slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_closure_sees_latest_value() {
        let cell = LatestCell::new(1u32);
        let reader = {
            let cell = cell.clone();
            move || *cell.get()
        };

        assert_eq!(reader(), 1);
        cell.set(2);
        cell.set(3);
        assert_eq!(reader(), 3);
    }

    #[test]
    fn test_version_counts_replacements() {
        let cell: LatestCell<Vec<u8>> = LatestCell::default();
        assert_eq!(cell.version(), 0);
        assert_eq!(cell.set(vec![1]), 1);
        assert_eq!(cell.set(vec![2]), 2);

        let (version, value) = cell.stamped();
        assert_eq!(version, 2);
        assert_eq!(*value, vec![2]);
    }
}
