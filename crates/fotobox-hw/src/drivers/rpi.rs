use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use fotobox_types::{EdgeCallback, Level, PinId};
use parking_lot::Mutex;
use rppal::gpio::{Event, Gpio, InputPin, OutputPin, Trigger};
use tracing::debug;

use crate::traits::pins::{EdgeMode, PinDriver};

/// BCM GPIO number behind each physical pin of the 40-pin header.
/// `None` for power and ground pins.
#[rustfmt::skip]
const BOARD_TO_BCM: [Option<u8>; 41] = [
    None,
    None, None, Some(2), None, Some(3), None, Some(4), Some(14), None, Some(15),
    Some(17), Some(18), Some(27), None, Some(22), Some(23), None, Some(24), Some(10), None,
    Some(9), Some(25), Some(11), Some(8), None, Some(7), Some(0), Some(1), Some(5), None,
    Some(6), Some(12), Some(13), None, Some(19), Some(16), Some(26), Some(20), None, Some(21),
];

fn bcm(pin: PinId) -> Result<u8> {
    BOARD_TO_BCM
        .get(usize::from(pin))
        .copied()
        .flatten()
        .ok_or_else(|| anyhow!("board pin {pin} is not a GPIO"))
}

/// Raspberry Pi GPIO through rppal. Pins are given in board numbering.
pub struct RppalPins {
    gpio: Gpio,
    inputs: Mutex<HashMap<PinId, InputPin>>,
    outputs: Mutex<HashMap<PinId, OutputPin>>,
}

impl RppalPins {
    pub fn new() -> Result<Self> {
        Ok(Self {
            gpio: Gpio::new().context("open GPIO")?,
            inputs: Mutex::new(HashMap::new()),
            outputs: Mutex::new(HashMap::new()),
        })
    }
}

impl PinDriver for RppalPins {
    fn configure_input(
        &self,
        pin: PinId,
        edge: EdgeMode,
        bounce: Duration,
        mut callback: EdgeCallback,
    ) -> Result<()> {
        let mut input = self
            .gpio
            .get(bcm(pin)?)
            .with_context(|| format!("claim input pin {pin}"))?
            .into_input_pulldown();
        let trigger = match edge {
            EdgeMode::Rising => Trigger::RisingEdge,
            EdgeMode::Falling => Trigger::FallingEdge,
            EdgeMode::Both => Trigger::Both,
        };
        input
            .set_async_interrupt(trigger, Some(bounce), move |event: Event| {
                callback(Level::from(event.trigger == Trigger::RisingEdge));
            })
            .with_context(|| format!("watch input pin {pin}"))?;
        self.inputs.lock().insert(pin, input);
        debug!(pin, "input configured");
        Ok(())
    }

    fn configure_output(&self, pin: PinId) -> Result<()> {
        let output = self
            .gpio
            .get(bcm(pin)?)
            .with_context(|| format!("claim output pin {pin}"))?
            .into_output_low();
        self.outputs.lock().insert(pin, output);
        Ok(())
    }

    fn write(&self, pin: PinId, level: Level) -> Result<()> {
        let mut outputs = self.outputs.lock();
        let output = outputs
            .get_mut(&pin)
            .ok_or_else(|| anyhow!("pin {pin} is not an output"))?;
        match level {
            Level::High => output.set_high(),
            Level::Low => output.set_low(),
        }
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        self.inputs.lock().clear();
        for output in self.outputs.lock().values_mut() {
            output.set_low();
        }
        self.outputs.lock().clear();
        Ok(())
    }
}
