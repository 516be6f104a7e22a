use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use fotobox_config::format_mask;
use fotobox_hw::OverlayGuard;
use image::RgbaImage;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::booth::Booth;

/// Show the countdown for photo `slot` (0-based) over the preview:
/// prepare card, 3-2-1 with sounds, optional song, smile.
pub fn count_down(booth: &Booth, slot: usize) -> Result<()> {
    let countdown = &booth.config.photo.countdown;
    let prepare = booth
        .assets
        .prepare
        .get(slot)
        .with_context(|| format!("no prepare overlay for photo {}", slot + 1))?;
    show(booth, prepare, countdown.prepare.position, countdown.prepare.duration())?;

    let step = Duration::from_millis(countdown.count.step_ms);
    for (n, image) in &booth.assets.count {
        play(booth, &format_mask(&countdown.count.sound_mask, n));
        show(booth, image, countdown.count.position, step)?;
    }

    if countdown.songs.enabled {
        play_random_song(booth);
    }
    show(booth, &booth.assets.smile, countdown.smile.position, countdown.smile.duration())
}

fn show(booth: &Booth, image: &RgbaImage, position: (u32, u32), duration: Duration) -> Result<()> {
    let countdown = &booth.config.photo.countdown;
    let _overlay = OverlayGuard::show(
        booth.camera.as_ref(),
        image,
        position,
        countdown.overlay_alpha,
        countdown.overlay_layer,
    )?;
    thread::sleep(duration);
    Ok(())
}

// A missing sound never stops a capture.
fn play(booth: &Booth, file: &str) {
    if let Err(err) = booth.display.play_sound(Path::new(file)) {
        warn!(file, "sound failed: {err:#}");
    }
}

fn play_random_song(booth: &Booth) {
    let pattern = &booth.config.photo.countdown.songs.glob_mask;
    let songs: Vec<_> = match glob::glob(pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(err) => {
            warn!(pattern, "bad song pattern: {err}");
            return;
        }
    };
    match songs.choose(&mut rand::thread_rng()) {
        Some(song) => play(booth, &song.to_string_lossy()),
        None => debug!(pattern, "no songs found"),
    }
}
