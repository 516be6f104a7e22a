//! Cross-handler synchronization.

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::oneshot;

/// Mutual exclusion between capture sequences.
///
/// Shoot and Quit block on it. Idle activities only check it and back off
/// while a sequence runs.
#[derive(Debug, Default)]
pub struct ExclusiveLock {
    inner: Mutex<()>,
}

/// Held for the whole capture sequence. Releases on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ShootingGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl ExclusiveLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is free.
    pub fn acquire(&self) -> ShootingGuard<'_> {
        ShootingGuard {
            _guard: self.inner.lock(),
        }
    }

    pub fn try_acquire(&self) -> Option<ShootingGuard<'_>> {
        self.inner.try_lock().map(|g| ShootingGuard { _guard: g })
    }

    /// Non-blocking check: takes and immediately releases the lock.
    /// Returns `false` while a capture sequence holds it.
    pub fn is_free(&self) -> bool {
        self.try_acquire().is_some()
    }

    pub fn is_held(&self) -> bool {
        self.inner.is_locked()
    }
}

/// Single-assignment slot for the process exit code.
#[derive(Debug)]
pub struct ExitSlot {
    sender: Mutex<Option<oneshot::Sender<i32>>>,
}

/// Receiving half of an [`ExitSlot`].
#[derive(Debug)]
pub struct ExitReceiver(oneshot::Receiver<i32>);

impl ExitSlot {
    pub fn channel() -> (ExitSlot, ExitReceiver) {
        let (tx, rx) = oneshot::channel();
        (
            ExitSlot {
                sender: Mutex::new(Some(tx)),
            },
            ExitReceiver(rx),
        )
    }

    /// Store the exit code.
    ///
    /// # Panics
    ///
    /// Panics on a second write. Callers check [`is_resolved`](Self::is_resolved)
    /// under the exclusive lock first.
    pub fn put(&self, code: i32) {
        let sender = self.sender.lock().take();
        match sender {
            // The receiver is gone only when the booth is already tearing down.
            Some(tx) => {
                let _ = tx.send(code);
            }
            None => panic!("exit code already set, refusing {code}"),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl ExitReceiver {
    /// Wait for the exit code. `None` if the slot was dropped unset.
    pub async fn wait(self) -> Option<i32> {
        self.0.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_acquire_fails_while_held() {
        let lock = ExclusiveLock::new();
        let guard = lock.acquire();
        assert!(lock.is_held());
        assert!(lock.try_acquire().is_none());
        assert!(!lock.is_free());
        drop(guard);
        assert!(lock.is_free());
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn exit_slot_delivers_once() {
        let (slot, rx) = ExitSlot::channel();
        assert!(!slot.is_resolved());
        slot.put(3);
        assert!(slot.is_resolved());
        assert_eq!(rx.wait().await, Some(3));
    }

    #[test]
    #[should_panic(expected = "exit code already set")]
    fn exit_slot_rejects_second_write() {
        let (slot, _rx) = ExitSlot::channel();
        slot.put(0);
        slot.put(4);
    }

    #[tokio::test]
    async fn dropped_slot_yields_none() {
        let (slot, rx) = ExitSlot::channel();
        drop(slot);
        assert_eq!(rx.wait().await, None);
    }
}
