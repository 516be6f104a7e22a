use std::path::Path;

use anyhow::{Context, Result};
use fotobox_config::{Config, SlotBox, format_mask};
use fotobox_hw::scale;
use image::{Rgba, RgbaImage};
use tracing::info;

/// Images and geometry prepared once at startup.
pub struct Assets {
    pub montage_boxes: Vec<SlotBox>,
    /// Scaled to the screen size.
    pub watermark: RgbaImage,
    pub logo: RgbaImage,
    /// Prepare overlay per slot, in slot order.
    pub prepare: Vec<RgbaImage>,
    /// Count overlays from `count.from` down to 1.
    pub count: Vec<(u32, RgbaImage)>,
    pub smile: RgbaImage,
}

fn open(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let path = path.as_ref();
    Ok(image::open(path)
        .with_context(|| format!("failed to load image {}", path.display()))?
        .to_rgba8())
}

impl Assets {
    /// Compute the montage layout and decode every overlay image.
    pub fn load(config: &Config) -> Result<Self> {
        let montage_boxes = config.montage_boxes().context("montage grid")?;
        let countdown = &config.photo.countdown;

        let watermark = scale(&open(&config.montage.watermark)?, config.screen.size());
        let logo = open(&config.printout.logo)?;
        let prepare = (1..=montage_boxes.len())
            .map(|slot| open(format_mask(&countdown.prepare.image, slot)))
            .collect::<Result<Vec<_>>>()?;
        let count = (1..=countdown.count.from)
            .rev()
            .map(|n| Ok((n, open(format_mask(&countdown.count.image_mask, n))?)))
            .collect::<Result<Vec<_>>>()?;
        let smile = open(&countdown.smile.image)?;

        info!(
            slots = montage_boxes.len(),
            overlays = prepare.len() + count.len() + 1,
            "assets loaded"
        );
        Ok(Self {
            montage_boxes,
            watermark,
            logo,
            prepare,
            count,
            smile,
        })
    }

    /// Solid-colour stand-ins with the geometry of `config`.
    pub fn placeholder(config: &Config) -> Result<Self> {
        let montage_boxes = config.montage_boxes().context("montage grid")?;
        let (width, height) = config.screen.size();
        let tile = || RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
        Ok(Self {
            watermark: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            logo: RgbaImage::from_pixel(16, 16, Rgba([200, 0, 0, 255])),
            prepare: montage_boxes.iter().map(|_| tile()).collect(),
            count: (1..=config.photo.countdown.count.from)
                .rev()
                .map(|n| (n, tile()))
                .collect(),
            smile: tile(),
            montage_boxes,
        })
    }
}
