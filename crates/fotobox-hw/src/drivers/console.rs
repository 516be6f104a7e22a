use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use fotobox_types::{EdgeCallback, Level, PinId};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::traits::pins::{EdgeMode, PinDriver};

type Callbacks = Arc<Mutex<HashMap<PinId, EdgeCallback>>>;

/// Pin driver for running the booth on a desktop.
///
/// Inputs are driven from stdin, one command per line:
/// `press <pin>`, `release <pin>`, or `hold <pin> <ms>`.
/// Output writes are logged.
#[derive(Default)]
pub struct ConsolePins {
    callbacks: Callbacks,
    reader_started: AtomicBool,
}

impl ConsolePins {
    pub fn new() -> Self {
        Self::default()
    }

    fn start_reader(&self) -> Result<()> {
        if self.reader_started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let callbacks = Arc::clone(&self.callbacks);
        std::thread::Builder::new()
            .name("console-pins".to_string())
            .spawn(move || read_stdin(callbacks))
            .context("spawn console input thread")?;
        info!("console pins: type `press N`, `release N` or `hold N MS`");
        Ok(())
    }
}

fn read_stdin(callbacks: Callbacks) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        match parse_line(&line) {
            Ok(Some(steps)) => {
                for (pin, level, after) in steps {
                    if !after.is_zero() {
                        std::thread::sleep(after);
                    }
                    fire(&callbacks, pin, level);
                }
            }
            Ok(None) => {}
            Err(err) => warn!("console pins: {err:#}"),
        }
    }
    debug!("console pins: stdin closed");
}

fn fire(callbacks: &Callbacks, pin: PinId, level: Level) {
    match callbacks.lock().get_mut(&pin) {
        Some(callback) => callback(level),
        None => warn!(pin, "console pins: not an input"),
    }
}

/// One input line as a list of (pin, level, delay before the edge).
fn parse_line(line: &str) -> Result<Option<Vec<(PinId, Level, Duration)>>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let pin: PinId = words
        .next()
        .context("missing pin number")?
        .parse()
        .context("bad pin number")?;
    let steps = match verb {
        "press" | "p" => vec![(pin, Level::High, Duration::ZERO)],
        "release" | "r" => vec![(pin, Level::Low, Duration::ZERO)],
        "hold" | "h" => {
            let ms: u64 = words
                .next()
                .context("missing hold time")?
                .parse()
                .context("bad hold time")?;
            vec![
                (pin, Level::High, Duration::ZERO),
                (pin, Level::Low, Duration::from_millis(ms)),
            ]
        }
        other => bail!("unknown command {other:?}"),
    };
    Ok(Some(steps))
}

impl PinDriver for ConsolePins {
    fn configure_input(
        &self,
        pin: PinId,
        _edge: EdgeMode,
        _bounce: Duration,
        callback: EdgeCallback,
    ) -> Result<()> {
        self.callbacks.lock().insert(pin, callback);
        self.start_reader()
    }

    fn configure_output(&self, pin: PinId) -> Result<()> {
        debug!(pin, "console pins: output configured");
        Ok(())
    }

    fn write(&self, pin: PinId, level: Level) -> Result<()> {
        debug!(pin, ?level, "console pins: write");
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        self.callbacks.lock().clear();
        Ok(())
    }
}
