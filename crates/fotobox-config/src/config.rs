use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::format::{Item, StrftimeItems};
use fotobox_types::{ButtonAction, PinId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::layout::{Grid, Margin, SlotBox};

/// One physical push button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonConfig {
    pub pin: PinId,
    /// Minimum push duration for the action to fire.
    pub hold_ms: u64,
    /// Logged when the button is released before `hold_ms`.
    pub info: String,
    pub action: ButtonAction,
}

impl ButtonConfig {
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }
}

/// Indicator LED outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedConfig {
    /// Busy: a capture sequence is running.
    pub red: PinId,
    /// Idle heartbeat.
    pub yellow: PinId,
    /// Ready.
    pub green: PinId,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            red: 33,
            yellow: 35,
            green: 37,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    pub interval_ms: u64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

impl BlinkConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// A camera overlay shown for a fixed time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Image file; `{}` is replaced by the slot or count number.
    pub image: String,
    pub position: (u32, u32),
    pub duration_ms: u64,
}

impl OverlayConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// The 3-2-1 count shown before every capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountConfig {
    pub from: u32,
    pub image_mask: String,
    pub sound_mask: String,
    pub position: (u32, u32),
    pub step_ms: u64,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            from: 3,
            image_mask: "countdown/count-{}.png".to_string(),
            sound_mask: "countdown/count-{}.wav".to_string(),
            position: (0, 0),
            step_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SongsConfig {
    pub enabled: bool,
    pub glob_mask: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    pub prepare: OverlayConfig,
    pub count: CountConfig,
    pub smile: OverlayConfig,
    pub songs: SongsConfig,
    /// Opacity of countdown overlays (0..=255).
    pub overlay_alpha: u8,
    pub overlay_layer: u8,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            prepare: OverlayConfig {
                image: "countdown/prepare-{}.png".to_string(),
                position: (0, 0),
                duration_ms: 2000,
            },
            count: CountConfig::default(),
            smile: OverlayConfig {
                image: "countdown/smile.png".to_string(),
                position: (0, 0),
                duration_ms: 1500,
            },
            songs: SongsConfig::default(),
            overlay_alpha: 64,
            overlay_layer: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    pub width: u32,
    pub height: u32,
    /// Flash/fill lights switched on for the whole capture sequence.
    pub lights: Vec<PinId>,
    /// `chrono` format string for file-name timestamps.
    pub time_mask: String,
    /// Pause after each capture.
    pub settle_ms: u64,
    /// Pause after a completed sequence before the booth accepts the next.
    pub cooldown_ms: u64,
    pub countdown: CountdownConfig,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            width: 1640,
            height: 1232,
            lights: vec![16, 18],
            time_mask: "%Y-%m-%d_%H-%M-%S".to_string(),
            settle_ms: 5000,
            cooldown_ms: 30_000,
            countdown: CountdownConfig::default(),
        }
    }
}

impl PhotoConfig {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
    pub offset: (i64, i64),
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
            offset: (0, 0),
        }
    }
}

impl ScreenConfig {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MontageConfig {
    /// Period of the idle random-montage tick.
    pub interval_ms: u64,
    pub background: [u8; 4],
    pub columns: u32,
    pub rows: u32,
    pub margin: Margin,
    pub watermark: String,
    pub file_mask: String,
}

impl Default for MontageConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            background: [255, 255, 255, 255],
            columns: 2,
            rows: 2,
            margin: Margin::uniform(10, 10),
            watermark: "watermark.png".to_string(),
            file_mask: "montage/montage-{}.jpg".to_string(),
        }
    }
}

impl MontageConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.columns, self.rows, self.margin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintoutConfig {
    /// Logo panel appended right of the collage.
    pub logo: String,
    pub background: [u8; 4],
    pub margin: Margin,
    pub file_mask: String,
}

impl Default for PrintoutConfig {
    fn default() -> Self {
        Self {
            logo: "logo.png".to_string(),
            background: [255, 255, 255, 255],
            margin: Margin::uniform(40, 20),
            file_mask: "printout/printout-{}.jpg".to_string(),
        }
    }
}

/// Whole-booth configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base directory for relative resource files.
    pub resource_path: PathBuf,
    /// Width of the command worker pool.
    pub workers: usize,
    pub bounce_ms: u64,
    pub buttons: Vec<ButtonConfig>,
    pub leds: LedConfig,
    pub blink: BlinkConfig,
    pub photo: PhotoConfig,
    pub screen: ScreenConfig,
    pub montage: MontageConfig,
    pub printout: PrintoutConfig,
    /// Step length of the LED sequence run at shutdown.
    pub lightshow_step_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resource_path: PathBuf::from("resources"),
            workers: 4,
            bounce_ms: 300,
            buttons: vec![
                ButtonConfig {
                    pin: 11,
                    hold_ms: 50,
                    info: "Shoot button released too early".to_string(),
                    action: ButtonAction::Shoot,
                },
                ButtonConfig {
                    pin: 13,
                    hold_ms: 3000,
                    info: "Hold for 3 seconds to quit".to_string(),
                    action: ButtonAction::Quit { code: 0 },
                },
                ButtonConfig {
                    pin: 15,
                    hold_ms: 3000,
                    info: "Hold for 3 seconds to reboot".to_string(),
                    action: ButtonAction::Quit { code: 3 },
                },
                ButtonConfig {
                    pin: 29,
                    hold_ms: 3000,
                    info: "Hold for 3 seconds to shut down".to_string(),
                    action: ButtonAction::Quit { code: 4 },
                },
            ],
            leds: LedConfig::default(),
            blink: BlinkConfig::default(),
            photo: PhotoConfig::default(),
            screen: ScreenConfig::default(),
            montage: MontageConfig::default(),
            printout: PrintoutConfig::default(),
            lightshow_step_ms: 1000,
        }
    }
}

impl Config {
    /// Loads config from a specified path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Saves config to a specified path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load, resolve resource paths and validate in one step.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load_from(path)?;
        config.resolve_resources();
        config.validate()?;
        Ok(config)
    }

    /// Join every relative resource file onto `resource_path`.
    ///
    /// Output masks (montage, printout) are left untouched.
    pub fn resolve_resources(&mut self) {
        let base = self.resource_path.clone();
        let join = |value: &mut String| {
            if !value.is_empty() && Path::new(value.as_str()).is_relative() {
                *value = base.join(value.as_str()).to_string_lossy().into_owned();
            }
        };
        let countdown = &mut self.photo.countdown;
        join(&mut countdown.prepare.image);
        join(&mut countdown.count.image_mask);
        join(&mut countdown.count.sound_mask);
        join(&mut countdown.smile.image);
        join(&mut countdown.songs.glob_mask);
        join(&mut self.montage.watermark);
        join(&mut self.printout.logo);
    }

    /// Reject configurations the booth cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.blink.interval_ms == 0 {
            bail!("blink.interval_ms must be positive");
        }
        if self.montage.interval_ms == 0 {
            bail!("montage.interval_ms must be positive");
        }
        if self.photo.width == 0 || self.photo.height == 0 {
            bail!(
                "photo size {}x{} is empty",
                self.photo.width,
                self.photo.height
            );
        }
        if StrftimeItems::new(&self.photo.time_mask).any(|item| matches!(item, Item::Error)) {
            bail!(
                "photo.time_mask {:?} is not a valid strftime format",
                self.photo.time_mask
            );
        }
        self.montage
            .grid()
            .cell_size(self.screen.size())
            .context("montage grid")?;

        let mut seen = HashSet::new();
        let outputs = [self.leds.red, self.leds.yellow, self.leds.green];
        let pins = self
            .buttons
            .iter()
            .map(|b| b.pin)
            .chain(outputs)
            .chain(self.photo.lights.iter().copied());
        for pin in pins {
            if !seen.insert(pin) {
                bail!("pin {pin} is assigned twice");
            }
        }

        if !self
            .buttons
            .iter()
            .any(|b| matches!(b.action, ButtonAction::Quit { .. }))
        {
            warn!("no quit button configured, the booth can only be stopped externally");
        }
        if self.number_of_photos() != 4 {
            warn!(
                photos = self.number_of_photos(),
                "printout collage needs exactly 4 photos and will be skipped"
            );
        }
        Ok(())
    }

    /// Photos taken per capture sequence: one per montage cell.
    pub fn number_of_photos(&self) -> usize {
        self.montage.grid().cells()
    }

    /// Montage slot rectangles on the screen.
    pub fn montage_boxes(&self) -> Result<Vec<SlotBox>> {
        self.montage.grid().slot_boxes(self.screen.size())
    }

    pub fn bounce(&self) -> Duration {
        Duration::from_millis(self.bounce_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.photo.settle_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.photo.cooldown_ms)
    }

    pub fn lightshow_step(&self) -> Duration {
        Duration::from_millis(self.lightshow_step_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.number_of_photos(), 4);
        assert_eq!(config.workers, 4);
        assert_eq!(config.photo.countdown.overlay_alpha, 64);
    }

    #[test]
    fn test_invalid_time_mask_rejected() {
        let mut config = Config::default();
        config.photo.time_mask = "%Y-%Q".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("time_mask"), "{err}");

        config.photo.time_mask = "%d.%m.%Y %H:%M".to_string();
        config.validate().unwrap();
    }

    #[test]
    fn test_file_io() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("fotobox.json");

        let mut config = Config::default();
        config.workers = 2;
        config.screen.offset = (5, 7);

        config.save_to(&file_path).unwrap();
        let loaded = Config::load_from(&file_path).unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "workers": 1,
            "buttons": [
                {"pin": 7, "hold_ms": 100, "info": "tap", "action": {"type": "shoot"}}
            ],
            "screen": {"width": 1024}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.workers, 1);
        assert_eq!(config.buttons.len(), 1);
        assert_eq!(config.buttons[0].hold(), Duration::from_millis(100));
        assert_eq!(config.screen.width, 1024);
        assert_eq!(config.screen.height, 480);
        assert_eq!(config.montage, MontageConfig::default());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = Config::load_from(dir.path().join("missing.json")).unwrap_err();
        assert!(format!("{err:#}").contains("missing.json"));
    }

    #[test]
    fn test_resolve_resources() {
        let mut config = Config::default();
        config.resource_path = PathBuf::from("/opt/fotobox");
        config.printout.logo = "/abs/logo.png".to_string();
        config.resolve_resources();

        assert_eq!(config.montage.watermark, "/opt/fotobox/watermark.png");
        assert_eq!(config.printout.logo, "/abs/logo.png");
        assert_eq!(
            config.photo.countdown.count.sound_mask,
            "/opt/fotobox/countdown/count-{}.wav"
        );
        // Output masks stay relative to the working directory.
        assert_eq!(config.montage.file_mask, "montage/montage-{}.jpg");
    }

    #[test]
    fn test_duplicate_pin_rejected() {
        let mut config = Config::default();
        config.leds.red = config.buttons[0].pin;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("assigned twice"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = Config {
            workers: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.blink.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_montage_boxes_follow_screen() {
        let mut config = Config::default();
        config.screen.width = 800;
        config.screen.height = 600;
        let boxes = config.montage_boxes().unwrap();
        assert_eq!(boxes[3].as_tuple(), (410, 310, 800, 600));
    }
}
