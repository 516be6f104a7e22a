//! Booth configuration (`fotobox.json`) and the geometry derived from it.

mod config;
pub mod layout;
pub mod mask;

pub use config::{
    BlinkConfig, ButtonConfig, Config, CountConfig, CountdownConfig, LedConfig, MontageConfig,
    OverlayConfig, PhotoConfig, PrintoutConfig, ScreenConfig, SongsConfig,
};
pub use layout::{Grid, Margin, SlotBox};
pub use mask::{format_mask, glob_pattern};
