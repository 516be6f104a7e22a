use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use fotobox_config::{Config, LedConfig};
use fotobox_hw::PinDriver;
use fotobox_types::{Level, PinId};
use tracing::{debug, warn};

/// Indicator LEDs and photo lights.
///
/// At rest only the green "ready" LED is lit. A capture sequence turns the
/// photo lights on and green off; the idle blink pulses yellow (idle) or red
/// (busy).
#[derive(Clone)]
pub struct Lights {
    pins: Arc<dyn PinDriver>,
    leds: LedConfig,
    photo: Vec<PinId>,
    blink: Duration,
}

impl Lights {
    pub fn new(pins: Arc<dyn PinDriver>, config: &Config) -> Self {
        Self {
            pins,
            leds: config.leds,
            photo: config.photo.lights.clone(),
            blink: config.blink.interval(),
        }
    }

    fn all(&self) -> impl Iterator<Item = PinId> + '_ {
        [self.leds.red, self.leds.yellow, self.leds.green]
            .into_iter()
            .chain(self.photo.iter().copied())
    }

    /// Configure every light as an output and show the ready state.
    pub fn setup(&self) -> Result<()> {
        for pin in self.all() {
            self.pins
                .configure_output(pin)
                .with_context(|| format!("configure light on pin {pin}"))?;
        }
        self.idle()
    }

    /// Ready state: green on, everything else off.
    pub fn idle(&self) -> Result<()> {
        for pin in self.all() {
            let level = Level::from(pin == self.leds.green);
            self.pins.write(pin, level)?;
        }
        Ok(())
    }

    /// Switch the photo lights on until the returned guard drops.
    pub fn flash(&self) -> Result<FlashGuard<'_>> {
        self.pins.write(self.leds.green, Level::Low)?;
        let guard = FlashGuard { lights: self };
        for &pin in &self.photo {
            self.pins.write(pin, Level::High)?;
        }
        Ok(guard)
    }

    /// Pulse `pin` for half a blink period.
    pub fn blink_once(&self, pin: PinId) -> Result<()> {
        self.pins.write(pin, Level::High)?;
        thread::sleep(self.blink / 2);
        self.pins.write(pin, Level::Low)
    }

    pub fn blink_idle(&self) -> Result<()> {
        self.blink_once(self.leds.yellow)
    }

    pub fn blink_busy(&self) -> Result<()> {
        self.blink_once(self.leds.red)
    }

    /// Walk every light on, then off again, ending dark.
    pub fn lightshow(&self, step: Duration) -> Result<()> {
        debug!("lightshow");
        let pins: Vec<PinId> = self.all().collect();
        for &pin in &pins {
            self.pins.write(pin, Level::High)?;
            thread::sleep(step);
        }
        for &pin in pins.iter().rev() {
            self.pins.write(pin, Level::Low)?;
            thread::sleep(step);
        }
        Ok(())
    }
}

/// Photo lights on while alive. Restores the ready state on drop.
#[must_use = "the photo lights go out as soon as the guard is dropped"]
pub struct FlashGuard<'a> {
    lights: &'a Lights,
}

impl Drop for FlashGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.lights.idle() {
            warn!("failed to restore lights: {err:#}");
        }
    }
}
