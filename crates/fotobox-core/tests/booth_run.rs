mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{count_files, fast_config};
use fotobox_config::ButtonConfig;
use fotobox_core::{Assets, Hardware, run};
use fotobox_hw::mock::{Journal, MockCamera, MockDisplay, MockPins};
use fotobox_types::{ButtonAction, Level, MockTimeProvider};

async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 5s");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shoot_then_quit_through_buttons() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fast_config(dir.path());
    config.montage.interval_ms = 5;
    config.buttons = vec![
        ButtonConfig {
            pin: 11,
            hold_ms: 50,
            info: "too short".to_string(),
            action: ButtonAction::Shoot,
        },
        ButtonConfig {
            pin: 13,
            hold_ms: 2000,
            info: "hold to quit".to_string(),
            action: ButtonAction::Quit { code: 7 },
        },
    ];

    let journal = Journal::default();
    let pins = Arc::new(MockPins::new(journal.clone()));
    let clock = Arc::new(MockTimeProvider::new());
    let hardware = Hardware {
        pins: pins.clone(),
        camera: Arc::new(MockCamera::new(journal.clone())),
        display: Arc::new(MockDisplay::new(journal.clone(), config.screen.size())),
        clock: clock.clone(),
    };
    let assets = Assets::placeholder(&config).unwrap();
    let booth = tokio::spawn(run(config, assets, hardware));

    wait_for(|| pins.has_input(11) && pins.has_input(13)).await;
    assert_eq!(pins.level(37), Level::High);

    pins.trigger(11, Level::High);
    clock.advance(400_000);
    pins.trigger(11, Level::Low);
    let out = dir.path().to_path_buf();
    wait_for(|| count_files(&out, "printout") == 1).await;
    assert_eq!(count_files(&out, "montage"), 1);

    // Too short: only logged.
    clock.advance(1_000_000);
    pins.trigger(13, Level::High);
    clock.advance(500_000);
    pins.trigger(13, Level::Low);

    clock.advance(1_000_000);
    pins.trigger(13, Level::High);
    clock.advance(2_500_000);
    pins.trigger(13, Level::Low);

    let code = tokio::time::timeout(Duration::from_secs(5), booth)
        .await
        .expect("booth did not stop")
        .unwrap()
        .unwrap();
    assert_eq!(code, 7);
    assert!(pins.is_cleaned_up());
    assert_eq!(pins.level(37), Level::Low);
}
