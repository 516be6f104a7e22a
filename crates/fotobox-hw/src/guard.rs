//! Scoped hardware state.
//!
//! Each guard undoes its side effect when dropped, so the preview stops and
//! overlays disappear on every exit path of the capture sequence, including
//! `?` returns and unwinding panics.

use anyhow::{Context, Result};
use image::RgbaImage;
use tracing::warn;

use crate::traits::camera::{Camera, OverlayId};

/// Camera preview that runs while the guard lives.
#[must_use = "the preview stops as soon as the guard is dropped"]
pub struct PreviewGuard<'a> {
    camera: &'a dyn Camera,
}

impl<'a> PreviewGuard<'a> {
    pub fn start(camera: &'a dyn Camera) -> Result<Self> {
        camera.start_preview().context("start camera preview")?;
        Ok(Self { camera })
    }
}

impl Drop for PreviewGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.camera.stop_preview() {
            warn!("failed to stop camera preview: {err:#}");
        }
    }
}

/// Preview overlay shown while the guard lives.
#[must_use = "the overlay is removed as soon as the guard is dropped"]
pub struct OverlayGuard<'a> {
    camera: &'a dyn Camera,
    id: OverlayId,
}

impl<'a> OverlayGuard<'a> {
    pub fn show(
        camera: &'a dyn Camera,
        image: &RgbaImage,
        position: (u32, u32),
        alpha: u8,
        layer: u8,
    ) -> Result<Self> {
        let id = camera
            .add_overlay(image, position, alpha, layer)
            .context("add preview overlay")?;
        Ok(Self { camera, id })
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }
}

impl Drop for OverlayGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.camera.remove_overlay(self.id) {
            warn!(overlay = self.id.0, "failed to remove preview overlay: {err:#}");
        }
    }
}
