//! Montage and printout imaging.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use fotobox_config::{Margin, SlotBox, format_mask};
use fotobox_hw::scale;
use image::imageops;
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::info;

use crate::booth::Booth;

/// Opacity of the watermark blended over a finished montage.
pub const WATERMARK_OPACITY: f32 = 0.25;

/// Width of the printout relative to its height.
const PRINTOUT_ASPECT: f64 = 1.5;

/// Resize `photo` to the slot and paste it into `montage`.
pub fn paste_into_slot(montage: &mut RgbaImage, photo: &RgbaImage, slot: &SlotBox) {
    let cell = scale(photo, slot.size());
    imageops::replace(montage, &cell, i64::from(slot.left), i64::from(slot.top));
}

/// `base * (1 - opacity) + watermark * opacity`, per channel.
///
/// The watermark is resized to `base` first if needed.
pub fn blend_watermark(base: &RgbaImage, watermark: &RgbaImage, opacity: f32) -> RgbaImage {
    let watermark = scale(watermark, base.dimensions());
    let opacity = opacity.clamp(0.0, 1.0);
    let mut out = base.clone();
    for (dst, src) in out.pixels_mut().zip(watermark.pixels()) {
        for (d, s) in dst.0.iter_mut().zip(src.0) {
            let mixed = f32::from(*d) * (1.0 - opacity) + f32::from(s) * opacity;
            *d = mixed.round() as u8;
        }
    }
    out
}

/// Arrange four equally sized photos in a 2x2 grid with `margin` around and
/// between them, widening or heightening the canvas to 4:3.
pub fn make_collage(photos: &[RgbaImage], margin: &Margin, background: Rgba<u8>) -> Result<RgbaImage> {
    let [a, b, c, d] = photos else {
        bail!("collage needs 4 photos, got {}", photos.len());
    };
    let (w, h) = a.dimensions();
    ensure!(
        photos.iter().all(|p| p.dimensions() == (w, h)),
        "collage photos differ in size"
    );

    let mut width = f64::from(2 * w + margin.padding + margin.left + margin.right);
    let mut height = f64::from(2 * h + margin.padding + margin.top + margin.bottom);
    let mut left = f64::from(margin.left);
    let mut top = f64::from(margin.top);
    let horizontal = width * 3.0;
    let vertical = height * 4.0;
    if horizontal < vertical {
        let narrow = width;
        width = width * vertical / horizontal;
        left += (width - narrow) / 2.0;
    } else if horizontal > vertical {
        let flat = height;
        height = height * horizontal / vertical;
        top += (height - flat) / 2.0;
    }

    let mut collage = RgbaImage::from_pixel(width as u32, height as u32, background);
    let (x1, y1) = (left as i64, top as i64);
    let x2 = x1 + i64::from(w + margin.padding);
    let y2 = y1 + i64::from(h + margin.padding);
    imageops::replace(&mut collage, a, x1, y1);
    imageops::replace(&mut collage, b, x2, y1);
    imageops::replace(&mut collage, c, x1, y2);
    imageops::replace(&mut collage, d, x2, y2);
    Ok(collage)
}

/// Collage on the left, logo panel on the right, 3:2 overall.
pub fn make_printout(collage: &RgbaImage, logo: &RgbaImage, background: Rgba<u8>) -> RgbaImage {
    let (width, height) = collage.dimensions();
    let total = (f64::from(height) * PRINTOUT_ASPECT) as u32;
    let mut printout = RgbaImage::from_pixel(total.max(width), height, background);
    imageops::replace(&mut printout, collage, 0, 0);
    imageops::replace(&mut printout, logo, i64::from(width), 0);
    printout
}

/// Save as RGB, creating parent directories.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    DynamicImage::ImageRgba8(image.clone())
        .to_rgb8()
        .save(path)
        .with_context(|| format!("save {}", path.display()))
}

/// Build and save the printout for a finished capture sequence.
pub fn handle_create_composite(booth: &Booth, photos: &[RgbaImage], timestamp: &str) -> Result<()> {
    let printout = &booth.config.printout;
    let background = Rgba(printout.background);
    let collage = make_collage(photos, &printout.margin, background)?;
    let image = make_printout(&collage, &booth.assets.logo, background);
    let path = format_mask(&printout.file_mask, timestamp);
    save_image(&image, Path::new(&path))?;
    info!(path, "printout saved");
    Ok(())
}
