use std::sync::Arc;

use anyhow::Result;
use fotobox_config::Config;
use fotobox_hw::{Camera, Display, PinDriver};
use fotobox_types::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::assets::Assets;
use crate::bus::CommandHandler;
use crate::lights::Lights;
use crate::lock::{ExclusiveLock, ExitReceiver, ExitSlot};
use crate::{composite, idle, shoot};

/// Shared state every command handler runs against.
pub struct Booth {
    pub config: Config,
    pub assets: Assets,
    pub lights: Lights,
    pub camera: Arc<dyn Camera>,
    pub display: Arc<dyn Display>,
    pub lock: ExclusiveLock,
    exit: ExitSlot,
    feedback: UnboundedSender<Command>,
}

impl Booth {
    /// `feedback` is where handlers post follow-up commands, normally
    /// [`EventBus::feedback`](crate::EventBus::feedback).
    pub fn new(
        config: Config,
        assets: Assets,
        pins: Arc<dyn PinDriver>,
        camera: Arc<dyn Camera>,
        display: Arc<dyn Display>,
        feedback: UnboundedSender<Command>,
    ) -> (Self, ExitReceiver) {
        let (exit, exit_rx) = ExitSlot::channel();
        let lights = Lights::new(pins, &config);
        let booth = Self {
            config,
            assets,
            lights,
            camera,
            display,
            lock: ExclusiveLock::new(),
            exit,
            feedback,
        };
        (booth, exit_rx)
    }

    /// Queue a follow-up command on the bus.
    pub fn post(&self, command: Command) {
        if self.feedback.send(command).is_err() {
            debug!("event bus gone, follow-up dropped");
        }
    }

    /// Run the handler for `command` to completion on the calling thread.
    ///
    /// Recoverable failures are logged and reported as a [`Command::Log`] on
    /// the bus.
    pub fn dispatch(&self, command: Command) {
        let name = command.name();
        let result = match command {
            Command::Log { text } => {
                info!(target: "fotobox::log", "{text}");
                Ok(())
            }
            Command::Shoot { event } => shoot::handle_shoot(self, event),
            Command::Quit { code } => self.handle_quit(code),
            Command::Blink => idle::handle_blink(self),
            Command::ShowRandomMontage => idle::handle_show_random_montage(self),
            Command::CreateComposite { photos, timestamp } => {
                composite::handle_create_composite(self, &photos, &timestamp)
            }
        };
        if let Err(err) = result {
            let text = format!("{name} failed: {err:#}");
            warn!(command = name, "{err:#}");
            self.post(Command::log(text));
        }
    }

    /// Resolve the exit code once no capture sequence is running.
    fn handle_quit(&self, code: i32) -> Result<()> {
        let _shooting = self.lock.acquire();
        if self.exit.is_resolved() {
            info!(code, "quit already requested, ignoring");
            return Ok(());
        }
        info!(code, "quit requested");
        self.exit.put(code);
        Ok(())
    }
}

impl CommandHandler for Booth {
    fn handle(&self, command: Command) {
        self.dispatch(command);
    }
}
