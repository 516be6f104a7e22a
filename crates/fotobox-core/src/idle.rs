use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use fotobox_config::glob_pattern;
use fotobox_hw::scale;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::booth::Booth;

/// Pulse yellow while idle, red while a capture sequence runs.
pub fn handle_blink(booth: &Booth) -> Result<()> {
    if booth.lock.is_free() {
        booth.lights.blink_idle()
    } else {
        booth.lights.blink_busy()
    }
}

/// Put a random saved montage on screen, unless a capture sequence owns it.
pub fn handle_show_random_montage(booth: &Booth) -> Result<()> {
    if !booth.lock.is_free() {
        debug!("capture running, montage skipped");
        return Ok(());
    }

    let pattern = glob_pattern(&booth.config.montage.file_mask);
    let saved: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("bad montage pattern {pattern}"))?
        .filter_map(Result::ok)
        .collect();
    let Some(path) = saved.choose(&mut rand::thread_rng()) else {
        bail!("no saved montage matches {pattern}");
    };

    let montage = image::open(path)
        .with_context(|| format!("failed to load montage {}", path.display()))?
        .to_rgba8();
    let screen = &booth.config.screen;
    booth.display.blit(&scale(&montage, screen.size()), screen.offset)?;
    booth.display.flip()?;
    debug!(path = %path.display(), "random montage shown");
    Ok(())
}
