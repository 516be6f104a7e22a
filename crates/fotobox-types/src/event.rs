use std::fmt;
use std::time::Duration;

/// Physical pin number (board numbering).
pub type PinId = u8;

/// Callback a pin driver invokes with the new level of an input pin.
///
/// Runs on the driver's interrupt thread and must not block.
pub type EdgeCallback = Box<dyn FnMut(Level) + Send + 'static>;

/// Electrical level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// Logical button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Pressed,
    Released,
}

impl From<Level> for Transition {
    /// Buttons are wired active-high: a high input means the button is held.
    fn from(level: Level) -> Self {
        match level {
            Level::High => Transition::Pressed,
            Level::Low => Transition::Released,
        }
    }
}

/// A debounced transition on one input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEdge {
    pub pin: PinId,
    pub transition: Transition,
    /// Microseconds on the booth clock.
    pub time_us: i64,
}

impl PinEdge {
    pub fn pressed(pin: PinId, time_us: i64) -> Self {
        Self {
            pin,
            transition: Transition::Pressed,
            time_us,
        }
    }

    pub fn released(pin: PinId, time_us: i64) -> Self {
        Self {
            pin,
            transition: Transition::Released,
            time_us,
        }
    }
}

/// A completed press/release pair on one pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Push {
    pub pin: PinId,
    pub pressed_us: i64,
    pub released_us: i64,
}

impl Push {
    /// Creates a push.
    ///
    /// # Panics
    ///
    /// Panics if the release precedes the press. Edge ordering is guaranteed
    /// by the interrupt source, so an inversion is a bug, not input.
    pub fn new(pin: PinId, pressed_us: i64, released_us: i64) -> Self {
        assert!(
            pressed_us <= released_us,
            "pin {pin}: release at {released_us}us precedes press at {pressed_us}us"
        );
        Self {
            pin,
            pressed_us,
            released_us,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_micros((self.released_us - self.pressed_us) as u64)
    }

    /// Whether the closed windows `[pressed, released]` of both pushes share
    /// more than a single boundary instant.
    pub fn overlaps(&self, other: &Push) -> bool {
        self.pressed_us < other.released_us && other.pressed_us < self.released_us
    }
}

impl fmt::Display for Push {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pin {} held {}ms",
            self.pin,
            self.duration().as_millis()
        )
    }
}
