use std::time::Duration;

use anyhow::Result;
use fotobox_types::{EdgeCallback, Level, PinId};

/// Which transitions of an input pin fire the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    Rising,
    Falling,
    Both,
}

/// Abstraction over the GPIO header.
/// Implementations: RppalPins (Raspberry Pi), ConsolePins (stdin), MockPins (testing).
///
/// Methods take `&self`: the driver is shared between the sequencer and the
/// idle activities, so implementations use interior mutability.
pub trait PinDriver: Send + Sync {
    /// Register `callback` for level changes on `pin`.
    ///
    /// `bounce` is a hint for drivers with hardware debouncing. Callers still
    /// debounce in software.
    fn configure_input(
        &self,
        pin: PinId,
        edge: EdgeMode,
        bounce: Duration,
        callback: EdgeCallback,
    ) -> Result<()>;

    fn configure_output(&self, pin: PinId) -> Result<()>;

    fn write(&self, pin: PinId, level: Level) -> Result<()>;

    /// Release every configured pin.
    fn cleanup(&self) -> Result<()> {
        Ok(())
    }
}
