use std::sync::Arc;
use std::time::Duration;

use fotobox_types::{EdgeCallback, Level, PinEdge, PinId, TimeProvider, Transition};
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Adapter between a pin driver callback and the push aggregator.
///
/// Never emits two edges for the same pin within the bounce window and never
/// blocks: edges go into an unbounded queue.
pub struct Debouncer {
    pin: PinId,
    bounce_us: i64,
    clock: Arc<dyn TimeProvider>,
    last_emitted_us: Option<i64>,
    sink: UnboundedSender<PinEdge>,
}

impl Debouncer {
    pub fn new(
        pin: PinId,
        bounce: Duration,
        clock: Arc<dyn TimeProvider>,
        sink: UnboundedSender<PinEdge>,
    ) -> Self {
        Self {
            pin,
            bounce_us: bounce.as_micros() as i64,
            clock,
            last_emitted_us: None,
            sink,
        }
    }

    /// Handle one level change reported by the driver.
    pub fn on_level(&mut self, level: Level) {
        let now = self.clock.now_us();
        if let Some(last) = self.last_emitted_us
            && now - last < self.bounce_us
        {
            trace!(pin = self.pin, ?level, "edge inside bounce window");
            return;
        }
        self.last_emitted_us = Some(now);

        let edge = PinEdge {
            pin: self.pin,
            transition: Transition::from(level),
            time_us: now,
        };
        // The receiver only disappears during shutdown.
        let _ = self.sink.send(edge);
    }

    /// Move the debouncer into a driver callback.
    pub fn into_callback(mut self) -> EdgeCallback {
        Box::new(move |level| self.on_level(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fotobox_types::MockTimeProvider;
    use tokio::sync::mpsc;

    fn setup() -> (
        Debouncer,
        Arc<MockTimeProvider>,
        mpsc::UnboundedReceiver<PinEdge>,
    ) {
        let clock = Arc::new(MockTimeProvider::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::new(11, Duration::from_millis(200), clock.clone(), tx);
        (debouncer, clock, rx)
    }

    #[test]
    fn test_emits_timestamped_edges() {
        let (mut debouncer, clock, mut rx) = setup();
        clock.set_time(1_000_000);
        debouncer.on_level(Level::High);
        clock.advance(500_000);
        debouncer.on_level(Level::Low);

        assert_eq!(rx.try_recv().unwrap(), PinEdge::pressed(11, 1_000_000));
        assert_eq!(rx.try_recv().unwrap(), PinEdge::released(11, 1_500_000));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_chatter_inside_window_is_dropped() {
        let (mut debouncer, clock, mut rx) = setup();
        debouncer.on_level(Level::High);
        clock.advance(10_000);
        debouncer.on_level(Level::Low);
        clock.advance(10_000);
        debouncer.on_level(Level::High);

        assert_eq!(rx.try_recv().unwrap().transition, Transition::Pressed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_edge_at_window_boundary_passes() {
        let (mut debouncer, clock, mut rx) = setup();
        debouncer.on_level(Level::High);
        clock.advance(200_000);
        debouncer.on_level(Level::Low);

        assert!(rx.try_recv().is_ok());
        assert_eq!(rx.try_recv().unwrap().time_us, 200_000);
    }

    #[test]
    fn test_callback_survives_closed_receiver() {
        let (debouncer, _clock, rx) = setup();
        drop(rx);
        let mut callback = debouncer.into_callback();
        callback(Level::High);
    }
}
