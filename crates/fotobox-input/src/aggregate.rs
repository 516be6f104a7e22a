use std::collections::HashMap;

use fotobox_types::{PinEdge, PinId, Push, Transition};
use tracing::debug;

/// Press/release pairing for a single pin.
///
/// `Idle → Pressed → AwaitingRelease → Released → Idle`; a push is emitted on
/// the release. A repeated press while held re-anchors the press time, since
/// the debouncer may have swallowed the release in between. A release without
/// a press is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushDetector {
    pressed_us: Option<i64>,
    last: Option<Push>,
}

impl PushDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.pressed_us.is_some()
    }

    pub fn feed(&mut self, edge: &PinEdge) -> Option<Push> {
        match (edge.transition, self.pressed_us) {
            (Transition::Pressed, None) => {
                self.pressed_us = Some(edge.time_us);
                None
            }
            (Transition::Pressed, Some(_)) => {
                self.pressed_us = Some(edge.time_us);
                None
            }
            (Transition::Released, None) => None,
            (Transition::Released, Some(pressed_us)) => {
                self.pressed_us = None;
                let push = Push::new(edge.pin, pressed_us, edge.time_us);
                if self.last == Some(push) {
                    return None;
                }
                self.last = Some(push);
                Some(push)
            }
        }
    }
}

/// Cross-button arbitration: at most one push window is active at a time.
///
/// A push is forwarded only if the last forwarded push had already been
/// released when it was pressed; overlapping pushes are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushArbiter {
    candidate: Option<Push>,
}

impl PushArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, push: Push) -> Option<Push> {
        if let Some(candidate) = self.candidate {
            if candidate == push {
                return None;
            }
            if candidate.released_us > push.pressed_us {
                debug!(
                    dropped = %push,
                    active_pin = candidate.pin,
                    "push overlaps the active push"
                );
                return None;
            }
        }
        self.candidate = Some(push);
        Some(push)
    }
}

/// Per-pin detectors feeding one arbiter.
#[derive(Debug, Default)]
pub struct PushAggregator {
    detectors: HashMap<PinId, PushDetector>,
    arbiter: PushArbiter,
}

impl PushAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, edge: PinEdge) -> Option<Push> {
        let push = self.detectors.entry(edge.pin).or_default().feed(&edge)?;
        self.arbiter.offer(push)
    }
}
