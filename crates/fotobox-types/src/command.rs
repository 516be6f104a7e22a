use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::event::Push;

/// Primary action bound to a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ButtonAction {
    Shoot,
    Quit { code: i32 },
}

/// Everything the booth can be asked to do.
///
/// Commands are plain values; behavior lives in the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Informational message, written to the log.
    Log { text: String },
    /// Run one capture sequence. Carries the push that triggered it.
    Shoot { event: Push },
    /// Stop the booth and exit the process with `code`.
    Quit { code: i32 },
    /// Ambient indicator tick.
    Blink,
    /// Idle tick: show a previously saved montage.
    ShowRandomMontage,
    /// Compose the printout from the photos of one capture sequence.
    CreateComposite {
        photos: Vec<RgbaImage>,
        timestamp: String,
    },
}

impl Command {
    pub fn log(text: impl Into<String>) -> Self {
        Command::Log { text: text.into() }
    }

    /// Build the primary command for a button action.
    pub fn from_action(action: ButtonAction, push: Push) -> Self {
        match action {
            ButtonAction::Shoot => Command::Shoot { event: push },
            ButtonAction::Quit { code } => Command::Quit { code },
        }
    }

    /// Variant name, for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Log { .. } => "log",
            Command::Shoot { .. } => "shoot",
            Command::Quit { .. } => "quit",
            Command::Blink => "blink",
            Command::ShowRandomMontage => "show_random_montage",
            Command::CreateComposite { .. } => "create_composite",
        }
    }
}
