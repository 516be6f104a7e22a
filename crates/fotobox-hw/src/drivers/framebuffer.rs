use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::imageops;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use tracing::debug;

use crate::traits::display::Display;
use crate::traits::sound::SoundBackend;

/// Display writing a 32 bpp BGRA back buffer to a Linux framebuffer device.
pub struct FramebufferDisplay {
    device: PathBuf,
    canvas: Mutex<RgbaImage>,
    sound: Mutex<Box<dyn SoundBackend>>,
}

impl FramebufferDisplay {
    pub fn new(device: impl Into<PathBuf>, size: (u32, u32), sound: Box<dyn SoundBackend>) -> Self {
        Self {
            device: device.into(),
            canvas: Mutex::new(RgbaImage::from_pixel(size.0, size.1, Rgba([0, 0, 0, 255]))),
            sound: Mutex::new(sound),
        }
    }
}

/// Convert RGBA pixels to the little-endian BGRA layout of fbdev.
fn to_bgra(image: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.as_raw().len());
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        out.extend_from_slice(&[b, g, r, a]);
    }
    out
}

impl Display for FramebufferDisplay {
    fn size(&self) -> (u32, u32) {
        self.canvas.lock().dimensions()
    }

    fn blit(&self, image: &RgbaImage, offset: (i64, i64)) -> Result<()> {
        imageops::replace(&mut *self.canvas.lock(), image, offset.0, offset.1);
        Ok(())
    }

    fn flip(&self) -> Result<()> {
        let bytes = to_bgra(&self.canvas.lock());
        let mut fb = OpenOptions::new()
            .write(true)
            .open(&self.device)
            .with_context(|| format!("open framebuffer {}", self.device.display()))?;
        fb.write_all(&bytes)
            .with_context(|| format!("write framebuffer {}", self.device.display()))?;
        debug!(bytes = bytes.len(), "frame presented");
        Ok(())
    }

    fn play_sound(&self, path: &Path) -> Result<()> {
        self.sound.lock().play_file(path)
    }
}
