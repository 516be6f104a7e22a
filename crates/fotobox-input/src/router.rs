use std::collections::HashMap;

use fotobox_config::ButtonConfig;
use fotobox_types::{Command, PinId, Push};
use tracing::warn;

/// Map a push on `button` to a command.
///
/// A push held at least `hold_ms` fires the button's action; anything
/// shorter only logs the button's info text.
pub fn route(push: &Push, button: &ButtonConfig) -> Command {
    if push.duration() >= button.hold() {
        Command::from_action(button.action, *push)
    } else {
        Command::log(button.info.clone())
    }
}

/// Button table keyed by pin.
#[derive(Debug, Clone, Default)]
pub struct CommandRouter {
    buttons: HashMap<PinId, ButtonConfig>,
}

impl CommandRouter {
    pub fn new(buttons: &[ButtonConfig]) -> Self {
        Self {
            buttons: buttons.iter().map(|b| (b.pin, b.clone())).collect(),
        }
    }

    pub fn route(&self, push: &Push) -> Option<Command> {
        match self.buttons.get(&push.pin) {
            Some(button) => Some(route(push, button)),
            None => {
                warn!(pin = push.pin, "push on a pin without button");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fotobox_types::ButtonAction;

    fn quit_button() -> ButtonConfig {
        ButtonConfig {
            pin: 13,
            hold_ms: 3000,
            info: "hold to quit".to_string(),
            action: ButtonAction::Quit { code: 7 },
        }
    }

    #[test]
    fn test_hold_threshold_is_inclusive() {
        let push = Push::new(13, 0, 3_000_000);
        assert_eq!(route(&push, &quit_button()), Command::Quit { code: 7 });
    }

    #[test]
    fn test_short_push_logs() {
        let push = Push::new(13, 0, 2_999_999);
        assert_eq!(route(&push, &quit_button()), Command::log("hold to quit"));
    }

    #[test]
    fn test_long_push_fires() {
        let push = Push::new(13, 0, 60_000_000);
        assert_eq!(route(&push, &quit_button()), Command::Quit { code: 7 });
    }

    #[test]
    fn test_shoot_carries_push() {
        let button = ButtonConfig {
            pin: 11,
            hold_ms: 0,
            info: String::new(),
            action: ButtonAction::Shoot,
        };
        let push = Push::new(11, 10, 10);
        assert_eq!(route(&push, &button), Command::Shoot { event: push });
    }

    #[test]
    fn test_router_unknown_pin() {
        let router = CommandRouter::new(&[quit_button()]);
        assert_eq!(router.route(&Push::new(40, 0, 1)), None);
    }
}
