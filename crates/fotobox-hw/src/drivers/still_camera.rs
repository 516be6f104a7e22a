use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result, bail};
use image::imageops;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::traits::camera::{Camera, OverlayId};
use crate::traits::display::Display;

struct Overlay {
    image: RgbaImage,
    position: (u32, u32),
}

/// Camera driven through the `rpicam-apps` command line tools.
///
/// The preview is a long-running `rpicam-hello` process. The sensor can only
/// be opened once, so a capture pauses the preview around `rpicam-still`.
/// Overlays are composited by layer and drawn on `display`.
pub struct StillCommandCamera {
    preview_program: String,
    still_program: String,
    capture_path: PathBuf,
    mirror_preview: bool,
    display: Arc<dyn Display>,
    preview: Mutex<Option<Child>>,
    overlays: Mutex<BTreeMap<(u8, u64), Overlay>>,
    next_overlay: AtomicU64,
}

impl StillCommandCamera {
    pub fn new(display: Arc<dyn Display>) -> Self {
        Self {
            preview_program: "rpicam-hello".to_string(),
            still_program: "rpicam-still".to_string(),
            capture_path: std::env::temp_dir().join("fotobox-capture.png"),
            mirror_preview: true,
            display,
            preview: Mutex::new(None),
            overlays: Mutex::new(BTreeMap::new()),
            next_overlay: AtomicU64::new(1),
        }
    }

    pub fn with_programs(mut self, preview: impl Into<String>, still: impl Into<String>) -> Self {
        self.preview_program = preview.into();
        self.still_program = still.into();
        self
    }

    fn spawn_preview(&self) -> Result<Child> {
        let mut cmd = Command::new(&self.preview_program);
        cmd.args(["-t", "0", "--fullscreen"]);
        if self.mirror_preview {
            cmd.arg("--hflip");
        }
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawn {}", self.preview_program))
    }

    fn kill_preview(child: &mut Child) -> Result<()> {
        child.kill().context("stop preview process")?;
        child.wait().context("reap preview process")?;
        Ok(())
    }

    fn redraw_overlays(&self) -> Result<()> {
        let (width, height) = self.display.size();
        let mut frame = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        for overlay in self.overlays.lock().values() {
            imageops::overlay(
                &mut frame,
                &overlay.image,
                i64::from(overlay.position.0),
                i64::from(overlay.position.1),
            );
        }
        self.display.blit(&frame, (0, 0))?;
        self.display.flip()
    }
}

/// Scale the alpha channel of `image` by `alpha / 255`.
fn with_opacity(image: &RgbaImage, alpha: u8) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[3] = ((u16::from(pixel.0[3]) * u16::from(alpha)) / 255) as u8;
    }
    out
}

impl Camera for StillCommandCamera {
    fn start_preview(&self) -> Result<()> {
        let mut preview = self.preview.lock();
        if preview.is_none() {
            *preview = Some(self.spawn_preview()?);
            debug!("preview started");
        }
        Ok(())
    }

    fn stop_preview(&self) -> Result<()> {
        if let Some(mut child) = self.preview.lock().take() {
            Self::kill_preview(&mut child)?;
            debug!("preview stopped");
        }
        Ok(())
    }

    fn capture_frame(&self, size: (u32, u32)) -> Result<RgbaImage> {
        let mut preview = self.preview.lock();
        let resume = match preview.take() {
            Some(mut child) => {
                Self::kill_preview(&mut child)?;
                true
            }
            None => false,
        };

        let output = Command::new(&self.still_program)
            .args(["-n", "-t", "1", "-e", "png"])
            .args(["--width", &size.0.to_string(), "--height", &size.1.to_string()])
            .arg("-o")
            .arg(&self.capture_path)
            .output()
            .with_context(|| format!("run {}", self.still_program));

        if resume {
            match self.spawn_preview() {
                Ok(child) => *preview = Some(child),
                Err(err) => warn!("preview did not resume: {err:#}"),
            }
        }

        let output = output?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.still_program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let image = image::open(&self.capture_path)
            .with_context(|| format!("read capture {}", self.capture_path.display()))?
            .to_rgba8();
        Ok(image)
    }

    fn add_overlay(
        &self,
        image: &RgbaImage,
        position: (u32, u32),
        alpha: u8,
        layer: u8,
    ) -> Result<OverlayId> {
        let id = self.next_overlay.fetch_add(1, Ordering::Relaxed);
        self.overlays.lock().insert(
            (layer, id),
            Overlay {
                image: with_opacity(image, alpha),
                position,
            },
        );
        self.redraw_overlays()?;
        Ok(OverlayId(id))
    }

    fn remove_overlay(&self, id: OverlayId) -> Result<()> {
        let removed = {
            let mut overlays = self.overlays.lock();
            let key = overlays.keys().find(|(_, k)| *k == id.0).copied();
            key.and_then(|key| overlays.remove(&key))
        };
        if removed.is_none() {
            bail!("overlay {} is not shown", id.0);
        }
        self.redraw_overlays()
    }
}

impl Drop for StillCommandCamera {
    fn drop(&mut self) {
        if let Some(mut child) = self.preview.get_mut().take()
            && let Err(err) = Self::kill_preview(&mut child)
        {
            warn!("{err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{HwEvent, Journal, MockDisplay};

    fn camera(journal: &Journal) -> StillCommandCamera {
        let display = Arc::new(MockDisplay::new(journal.clone(), (8, 6)));
        StillCommandCamera::new(display)
            .with_programs("fotobox-missing-preview", "fotobox-missing-still")
    }

    #[test]
    fn opacity_scales_alpha() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255]));
        assert_eq!(with_opacity(&image, 64).get_pixel(0, 0).0, [1, 2, 3, 64]);
    }

    #[test]
    fn overlays_are_drawn_and_removed() {
        let journal = Journal::default();
        let camera = camera(&journal);
        let image = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let id = camera.add_overlay(&image, (1, 1), 255, 3).unwrap();
        camera.remove_overlay(id).unwrap();
        assert!(camera.remove_overlay(id).is_err());
        assert_eq!(journal.count(|e| *e == HwEvent::Flip), 2);
    }

    #[test]
    fn missing_tools_surface_as_errors() {
        let camera = camera(&Journal::default());
        assert!(camera.start_preview().is_err());
        assert!(camera.capture_frame((4, 3)).is_err());
        assert!(camera.stop_preview().is_ok());
    }
}
