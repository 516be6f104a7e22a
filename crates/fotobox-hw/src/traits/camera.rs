use anyhow::Result;
use image::RgbaImage;

/// Handle of an image layered over the camera preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

/// Abstraction over the camera module.
/// Implementations: StillCommandCamera (rpicam CLI), MockCamera (testing).
pub trait Camera: Send + Sync {
    fn start_preview(&self) -> Result<()>;
    fn stop_preview(&self) -> Result<()>;

    /// Capture one still at `size` (width, height).
    fn capture_frame(&self, size: (u32, u32)) -> Result<RgbaImage>;

    /// Layer `image` over the preview at `position` with the given opacity
    /// (0..=255) and stacking layer.
    fn add_overlay(
        &self,
        image: &RgbaImage,
        position: (u32, u32),
        alpha: u8,
        layer: u8,
    ) -> Result<OverlayId>;

    fn remove_overlay(&self, id: OverlayId) -> Result<()>;
}
