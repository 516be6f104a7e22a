use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// Abstraction over time sources.
/// Implementations: SystemTimeProvider (production), MockTimeProvider (testing).
///
/// Edges are timestamped on driver threads, so providers are shared.
pub trait TimeProvider: Send + Sync {
    /// Current time in microseconds from an arbitrary epoch.
    fn now_us(&self) -> i64;
}

/// System time provider using std::time::Instant.
pub struct SystemTimeProvider {
    start: Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_us(&self) -> i64 {
        self.start.elapsed().as_micros() as i64
    }
}

/// Mock time provider for deterministic testing.
pub struct MockTimeProvider {
    current_us: AtomicI64,
}

impl MockTimeProvider {
    pub fn new() -> Self {
        Self {
            current_us: AtomicI64::new(0),
        }
    }

    pub fn set_time(&self, us: i64) {
        self.current_us.store(us, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_us: i64) {
        self.current_us.fetch_add(delta_us, Ordering::SeqCst);
    }
}

impl Default for MockTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_us(&self) -> i64 {
        self.current_us.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_time_provider_advance() {
        let tp = MockTimeProvider::new();
        assert_eq!(tp.now_us(), 0);
        tp.advance(1_000_000);
        assert_eq!(tp.now_us(), 1_000_000);
        tp.advance(500_000);
        assert_eq!(tp.now_us(), 1_500_000);
    }

    #[test]
    fn system_time_provider_monotonic() {
        let tp = SystemTimeProvider::new();
        let t1 = tp.now_us();
        let t2 = tp.now_us();
        assert!(t2 >= t1);
    }
}
