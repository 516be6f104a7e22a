use std::fmt::Write as _;
use std::path::Path;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use fotobox_config::format_mask;
use fotobox_hw::PreviewGuard;
use fotobox_types::{Command, Push};
use image::{Rgba, RgbaImage};
use tracing::info;

use crate::booth::Booth;
use crate::composite::{WATERMARK_OPACITY, blend_watermark, paste_into_slot, save_image};
use crate::countdown::count_down;

/// Run one full capture sequence under the exclusive lock.
///
/// Lights and preview are restored on every exit path. The cooldown only
/// follows a successful sequence and keeps the lock held.
pub fn handle_shoot(booth: &Booth, push: Push) -> Result<()> {
    let _shooting = booth.lock.acquire();
    info!(%push, "capture sequence started");
    let started = Instant::now();

    capture_sequence(booth)?;

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "capture sequence finished"
    );
    thread::sleep(booth.config.cooldown());
    Ok(())
}

fn capture_sequence(booth: &Booth) -> Result<()> {
    let config = &booth.config;
    let mut timestamp = String::new();
    write!(timestamp, "{}", Local::now().format(&config.photo.time_mask))
        .map_err(|_| anyhow!("bad photo.time_mask {:?}", config.photo.time_mask))?;
    let (width, height) = config.screen.size();
    let mut montage = RgbaImage::from_pixel(width, height, Rgba(config.montage.background));
    let mut photos = Vec::with_capacity(booth.assets.montage_boxes.len());

    // Dropped in reverse order: preview stops, then the lights go back to ready.
    let _flash = booth.lights.flash()?;
    let _preview = PreviewGuard::start(booth.camera.as_ref())?;

    for (slot, cell) in booth.assets.montage_boxes.iter().enumerate() {
        count_down(booth, slot)?;
        let photo = booth
            .camera
            .capture_frame(config.photo.size())
            .with_context(|| format!("capture photo {}", slot + 1))?;
        paste_into_slot(&mut montage, &photo, cell);
        photos.push(photo);
        info!(photo = slot + 1, "photo taken");
        thread::sleep(config.settle());
    }

    let montage = blend_watermark(&montage, &booth.assets.watermark, WATERMARK_OPACITY);
    let path = format_mask(&config.montage.file_mask, &timestamp);
    save_image(&montage, Path::new(&path))?;
    booth.display.blit(&montage, config.screen.offset)?;
    booth.display.flip()?;
    info!(path, "montage saved");

    booth.post(Command::CreateComposite { photos, timestamp });
    Ok(())
}
