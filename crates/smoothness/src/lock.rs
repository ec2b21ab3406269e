use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-slot lock serializing processing runs that share work buffers.
///
/// Clones share the same slot. Acquisition never blocks: a caller that
/// finds the lock taken keeps its work pending and tries again later.
#[derive(Debug, Clone, Default)]
pub struct ProcessingLock {
    busy: Arc<AtomicBool>,
}

impl ProcessingLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock if it is free; it is released when the guard drops
    pub fn try_acquire(&self) -> Option<ProcessingGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| ProcessingGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_locked(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the [`ProcessingLock`]
#[derive(Debug)]
pub struct ProcessingGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let lock = ProcessingLock::new();
        let guard = lock.try_acquire().expect("Should acquire");
        assert!(lock.clone().try_acquire().is_none());
        assert!(lock.is_locked());

        drop(guard);
        assert!(!lock.is_locked());
        assert!(lock.try_acquire().is_some());
    }

    #[test]
    fn test_guard_released_across_threads() {
        let lock = ProcessingLock::new();
        let guard = lock.try_acquire().expect("Should acquire");
        std::thread::spawn(move || drop(guard))
            .join()
            .expect("Thread should finish");
        assert!(!lock.is_locked());
    }
}
