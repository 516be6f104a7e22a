use std::path::Path;

use anyhow::Result;
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Abstraction over the booth screen and its speaker.
/// Implementations: FramebufferDisplay (Linux fbdev), MockDisplay (testing).
pub trait Display: Send + Sync {
    /// Screen size in pixels (width, height).
    fn size(&self) -> (u32, u32);

    /// Copy `image` onto the back buffer with its top-left corner at `offset`.
    fn blit(&self, image: &RgbaImage, offset: (i64, i64)) -> Result<()>;

    /// Present the back buffer.
    fn flip(&self) -> Result<()>;

    /// Start playing a sound file, replacing whatever is playing.
    fn play_sound(&self, path: &Path) -> Result<()>;
}

/// Resize `image` to exactly `size`, ignoring its aspect ratio.
pub fn scale(image: &RgbaImage, size: (u32, u32)) -> RgbaImage {
    if image.dimensions() == size {
        return image.clone();
    }
    imageops::resize(image, size.0, size.1, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn scale_hits_target_size() {
        let image = RgbaImage::from_pixel(640, 480, Rgba([10, 20, 30, 255]));
        let scaled = scale(&image, (800, 480));
        assert_eq!(scaled.dimensions(), (800, 480));
        assert_eq!(scaled.get_pixel(400, 240), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn scale_same_size_is_copy() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 4]));
        assert_eq!(scale(&image, (4, 4)), image);
    }
}
