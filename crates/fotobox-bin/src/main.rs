// fotobox: photo booth driven by GPIO push buttons.
//
// Exit codes are chosen by the quit buttons; a supervising script maps them
// to quit (0), reboot (3) and power-off (4).

mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fotobox_config::Config;
use fotobox_core::{Assets, Hardware};
use fotobox_hw::drivers::{ConsolePins, FramebufferDisplay, SilentSound, StillCommandCamera};
use fotobox_hw::{Display, PinDriver, SoundBackend};
use fotobox_types::SystemTimeProvider;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "fotobox", about = "Photo booth: countdown, four shots, montage and printout")]
struct Args {
    /// Path to the booth config JSON file.
    #[arg(default_value = "fotobox.json")]
    config: PathBuf,

    /// Show debug logs.
    #[arg(short, long)]
    verbose: bool,

    /// Also write logs to a daily rolling file in this directory.
    #[arg(long, env = "FOTOBOX_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Read button presses from stdin instead of the GPIO header.
    #[arg(long)]
    console: bool,

    /// Framebuffer device of the booth screen.
    #[arg(long, default_value = "/dev/fb0")]
    framebuffer: PathBuf,

    /// Write the default config to this path and exit.
    #[arg(long)]
    write_default_config: Option<PathBuf>,
}

fn open_pins(console: bool) -> Result<Arc<dyn PinDriver>> {
    #[cfg(feature = "rpi")]
    if !console {
        let pins = fotobox_hw::drivers::RppalPins::new()?;
        return Ok(Arc::new(pins));
    }
    if !console {
        warn!("built without GPIO support, reading buttons from stdin");
    }
    Ok(Arc::new(ConsolePins::new()))
}

fn open_sound() -> Box<dyn SoundBackend> {
    #[cfg(feature = "audio")]
    match fotobox_hw::drivers::KiraSound::new() {
        Ok(sound) => return Box::new(sound),
        Err(err) => warn!("no audio output, sounds muted: {err:#}"),
    }
    Box::new(SilentSound)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_guard = logging::init_logging(args.log_dir.as_deref(), args.verbose)?;

    if let Some(path) = &args.write_default_config {
        Config::default().save_to(path)?;
        info!(path = %path.display(), "default config written");
        return Ok(());
    }

    info!("fotobox starting");
    let config = Config::open(&args.config).with_context(|| {
        format!(
            "invalid configuration (create one with --write-default-config {})",
            args.config.display()
        )
    })?;
    let assets = Assets::load(&config)?;

    let display: Arc<dyn Display> = Arc::new(FramebufferDisplay::new(
        &args.framebuffer,
        config.screen.size(),
        open_sound(),
    ));
    let hardware = Hardware {
        pins: open_pins(args.console)?,
        camera: Arc::new(StillCommandCamera::new(Arc::clone(&display))),
        display,
        clock: Arc::new(SystemTimeProvider::new()),
    };

    let code = fotobox_core::run(config, assets, hardware).await?;
    info!(code, "fotobox stopped");

    drop(log_guard);
    std::process::exit(code);
}
