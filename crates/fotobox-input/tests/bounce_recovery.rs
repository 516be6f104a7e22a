//! Debouncer, aggregator and router wired together on the stock config.

use std::sync::Arc;
use std::time::Duration;

use fotobox_config::Config;
use fotobox_input::{CommandRouter, Debouncer, PushAggregator};
use fotobox_types::{Command, Level, MockTimeProvider, Push};
use tokio::sync::mpsc;

const QUIT_PIN: u8 = 13;

/// Replays level changes at the given times and routes every push.
fn replay(levels: &[(i64, Level)]) -> (Vec<Push>, Vec<Command>) {
    let config = Config::default();
    let clock = Arc::new(MockTimeProvider::new());
    let (edge_tx, mut edge_rx) = mpsc::unbounded_channel();
    let mut debouncer = Debouncer::new(
        QUIT_PIN,
        Duration::from_millis(config.bounce_ms),
        clock.clone(),
        edge_tx,
    );
    for &(time_us, level) in levels {
        clock.set_time(time_us);
        debouncer.on_level(level);
    }

    let mut aggregator = PushAggregator::new();
    let router = CommandRouter::new(&config.buttons);
    let mut pushes = Vec::new();
    let mut commands = Vec::new();
    while let Ok(edge) = edge_rx.try_recv() {
        if let Some(push) = aggregator.feed(edge) {
            pushes.push(push);
            commands.extend(router.route(&push));
        }
    }
    (pushes, commands)
}

#[test]
fn test_swallowed_release_does_not_fake_a_hold() {
    // 100 ms tap (release lands inside the 300 ms bounce window), then a
    // 400 ms tap ten seconds later.
    let (pushes, commands) = replay(&[
        (0, Level::High),
        (100_000, Level::Low),
        (10_000_000, Level::High),
        (10_400_000, Level::Low),
    ]);

    assert_eq!(pushes, vec![Push::new(QUIT_PIN, 10_000_000, 10_400_000)]);
    assert_eq!(commands, vec![Command::log("Hold for 3 seconds to quit")]);
}

#[test]
fn test_real_hold_still_quits() {
    let (_, commands) = replay(&[(0, Level::High), (3_500_000, Level::Low)]);
    assert_eq!(commands, vec![Command::Quit { code: 0 }]);
}
