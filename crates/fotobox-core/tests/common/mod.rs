#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use fotobox_config::Config;
use fotobox_core::{Assets, Booth, ExitReceiver};
use fotobox_hw::mock::{Journal, MockCamera, MockDisplay, MockPins};
use fotobox_types::Command;
use tempfile::TempDir;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Config with every wait set to zero and outputs under `dir`.
pub fn fast_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.photo.width = 64;
    config.photo.height = 48;
    config.photo.settle_ms = 0;
    config.photo.cooldown_ms = 0;
    config.photo.countdown.prepare.duration_ms = 0;
    config.photo.countdown.count.step_ms = 0;
    config.photo.countdown.smile.duration_ms = 0;
    config.blink.interval_ms = 2;
    config.lightshow_step_ms = 0;
    config.montage.file_mask = dir.join("montage/montage-{}.jpg").to_string_lossy().into_owned();
    config.printout.file_mask = dir
        .join("printout/printout-{}.jpg")
        .to_string_lossy()
        .into_owned();
    config
}

pub fn count_files(dir: &Path, sub: &str) -> usize {
    std::fs::read_dir(dir.join(sub)).map(|d| d.count()).unwrap_or(0)
}

pub struct Rig {
    pub booth: Arc<Booth>,
    pub pins: Arc<MockPins>,
    pub camera: Arc<MockCamera>,
    pub display: Arc<MockDisplay>,
    pub journal: Journal,
    pub feedback: UnboundedReceiver<Command>,
    pub exit: Option<ExitReceiver>,
    pub dir: TempDir,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(tweak: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fast_config(dir.path());
        tweak(&mut config);
        let journal = Journal::default();
        let pins = Arc::new(MockPins::new(journal.clone()));
        let camera = Arc::new(MockCamera::new(journal.clone()));
        let display = Arc::new(MockDisplay::new(journal.clone(), config.screen.size()));
        let (tx, feedback) = mpsc::unbounded_channel();
        let assets = Assets::placeholder(&config).unwrap();
        let (booth, exit) = Booth::new(
            config,
            assets,
            pins.clone(),
            camera.clone(),
            display.clone(),
            tx,
        );
        booth.lights.setup().unwrap();
        journal.clear();
        Self {
            booth: Arc::new(booth),
            pins,
            camera,
            display,
            journal,
            feedback,
            exit: Some(exit),
            dir,
        }
    }

    /// Everything posted to the bus so far.
    pub fn drain_feedback(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        while let Ok(command) = self.feedback.try_recv() {
            out.push(command);
        }
        out
    }
}
