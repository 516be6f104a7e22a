//! Recording doubles for the hardware traits.
//!
//! All doubles built from the same [`Journal`] append to one ordered event
//! log, so tests can assert on the interleaving of lights, preview and screen.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, bail};
use fotobox_types::{EdgeCallback, Level, PinId};
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use crate::traits::camera::{Camera, OverlayId};
use crate::traits::display::Display;
use crate::traits::pins::{EdgeMode, PinDriver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwEvent {
    Write { pin: PinId, level: Level },
    PreviewStarted,
    PreviewStopped,
    Captured { index: usize },
    OverlayAdded(OverlayId),
    OverlayRemoved(OverlayId),
    Blit { size: (u32, u32), offset: (i64, i64) },
    Flip,
    Sound(PathBuf),
}

/// Shared, ordered log of hardware events.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<HwEvent>>>);

impl Journal {
    pub fn record(&self, event: HwEvent) {
        self.0.lock().push(event);
    }

    pub fn events(&self) -> Vec<HwEvent> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    pub fn count(&self, pred: impl Fn(&HwEvent) -> bool) -> usize {
        self.0.lock().iter().filter(|e| pred(e)).count()
    }
}

/// GPIO double: remembers output levels and lets tests fire input edges.
#[derive(Default)]
pub struct MockPins {
    journal: Journal,
    levels: Mutex<HashMap<PinId, Level>>,
    outputs: Mutex<HashSet<PinId>>,
    inputs: Mutex<HashMap<PinId, EdgeCallback>>,
    cleaned_up: AtomicBool,
}

impl MockPins {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    /// Simulate the driver reporting `level` on input `pin`.
    ///
    /// # Panics
    ///
    /// Panics if `pin` was never configured as an input.
    pub fn trigger(&self, pin: PinId, level: Level) {
        let mut inputs = self.inputs.lock();
        let callback = inputs
            .get_mut(&pin)
            .unwrap_or_else(|| panic!("pin {pin} is not an input"));
        callback(level);
    }

    pub fn has_input(&self, pin: PinId) -> bool {
        self.inputs.lock().contains_key(&pin)
    }

    pub fn is_output(&self, pin: PinId) -> bool {
        self.outputs.lock().contains(&pin)
    }

    /// Last level written to `pin`, `Low` if never written.
    pub fn level(&self, pin: PinId) -> Level {
        self.levels.lock().get(&pin).copied().unwrap_or(Level::Low)
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.cleaned_up.load(Ordering::SeqCst)
    }
}

impl PinDriver for MockPins {
    fn configure_input(
        &self,
        pin: PinId,
        _edge: EdgeMode,
        _bounce: Duration,
        callback: EdgeCallback,
    ) -> Result<()> {
        self.inputs.lock().insert(pin, callback);
        Ok(())
    }

    fn configure_output(&self, pin: PinId) -> Result<()> {
        self.outputs.lock().insert(pin);
        Ok(())
    }

    fn write(&self, pin: PinId, level: Level) -> Result<()> {
        if !self.is_output(pin) {
            bail!("pin {pin} is not an output");
        }
        self.levels.lock().insert(pin, level);
        self.journal.record(HwEvent::Write { pin, level });
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        self.inputs.lock().clear();
        self.cleaned_up.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// How a [`MockCamera`] misbehaves on a given capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFault {
    Error(usize),
    Panic(usize),
}

/// Camera double producing solid frames, one colour per capture.
#[derive(Default)]
pub struct MockCamera {
    journal: Journal,
    preview: AtomicBool,
    captures: AtomicUsize,
    next_overlay: AtomicU64,
    overlays: Mutex<HashSet<OverlayId>>,
    fault: Mutex<Option<CaptureFault>>,
    capture_delay: Mutex<Duration>,
}

impl MockCamera {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    /// Make capture number `index` (0-based, counted over the camera's
    /// lifetime) fail.
    pub fn inject(&self, fault: CaptureFault) {
        *self.fault.lock() = Some(fault);
    }

    /// Block every capture for `delay`.
    pub fn set_capture_delay(&self, delay: Duration) {
        *self.capture_delay.lock() = delay;
    }

    pub fn preview_running(&self) -> bool {
        self.preview.load(Ordering::SeqCst)
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.lock().len()
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    /// Colour of the frame returned by capture number `index`.
    pub fn frame_colour(index: usize) -> Rgba<u8> {
        let shade = (index as u8).wrapping_mul(40).wrapping_add(40);
        Rgba([shade, 255 - shade, 128, 255])
    }
}

impl Camera for MockCamera {
    fn start_preview(&self) -> Result<()> {
        self.preview.store(true, Ordering::SeqCst);
        self.journal.record(HwEvent::PreviewStarted);
        Ok(())
    }

    fn stop_preview(&self) -> Result<()> {
        self.preview.store(false, Ordering::SeqCst);
        self.journal.record(HwEvent::PreviewStopped);
        Ok(())
    }

    fn capture_frame(&self, size: (u32, u32)) -> Result<RgbaImage> {
        let delay = *self.capture_delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let index = self.captures.fetch_add(1, Ordering::SeqCst);
        match *self.fault.lock() {
            Some(CaptureFault::Error(at)) if at == index => bail!("sensor timeout"),
            Some(CaptureFault::Panic(at)) if at == index => panic!("camera driver crashed"),
            _ => {}
        }
        self.journal.record(HwEvent::Captured { index });
        Ok(RgbaImage::from_pixel(size.0, size.1, Self::frame_colour(index)))
    }

    fn add_overlay(
        &self,
        _image: &RgbaImage,
        _position: (u32, u32),
        _alpha: u8,
        _layer: u8,
    ) -> Result<OverlayId> {
        let id = OverlayId(self.next_overlay.fetch_add(1, Ordering::SeqCst));
        self.overlays.lock().insert(id);
        self.journal.record(HwEvent::OverlayAdded(id));
        Ok(id)
    }

    fn remove_overlay(&self, id: OverlayId) -> Result<()> {
        if !self.overlays.lock().remove(&id) {
            bail!("overlay {} is not shown", id.0);
        }
        self.journal.record(HwEvent::OverlayRemoved(id));
        Ok(())
    }
}

/// Screen double keeping the last blitted image.
pub struct MockDisplay {
    journal: Journal,
    size: (u32, u32),
    last_blit: Mutex<Option<RgbaImage>>,
}

impl MockDisplay {
    pub fn new(journal: Journal, size: (u32, u32)) -> Self {
        Self {
            journal,
            size,
            last_blit: Mutex::new(None),
        }
    }

    pub fn last_blit(&self) -> Option<RgbaImage> {
        self.last_blit.lock().clone()
    }

    pub fn sounds(&self) -> Vec<PathBuf> {
        self.journal
            .events()
            .into_iter()
            .filter_map(|e| match e {
                HwEvent::Sound(path) => Some(path),
                _ => None,
            })
            .collect()
    }
}

impl Display for MockDisplay {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn blit(&self, image: &RgbaImage, offset: (i64, i64)) -> Result<()> {
        self.journal.record(HwEvent::Blit {
            size: image.dimensions(),
            offset,
        });
        *self.last_blit.lock() = Some(image.clone());
        Ok(())
    }

    fn flip(&self) -> Result<()> {
        self.journal.record(HwEvent::Flip);
        Ok(())
    }

    fn play_sound(&self, path: &Path) -> Result<()> {
        self.journal.record(HwEvent::Sound(path.to_path_buf()));
        Ok(())
    }
}
