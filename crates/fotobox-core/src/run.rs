use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use fotobox_config::Config;
use fotobox_hw::{Camera, Display, EdgeMode, PinDriver};
use fotobox_input::{CommandRouter, Debouncer, run_aggregator};
use fotobox_types::TimeProvider;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::assets::Assets;
use crate::booth::Booth;
use crate::bus::EventBus;

/// The drivers a booth runs on.
pub struct Hardware {
    pub pins: Arc<dyn PinDriver>,
    pub camera: Arc<dyn Camera>,
    pub display: Arc<dyn Display>,
    pub clock: Arc<dyn TimeProvider>,
}

/// Run the booth until a quit button resolves the exit code.
///
/// Returns that code after the bus has drained and the shutdown lightshow
/// has played.
pub async fn run(config: Config, assets: Assets, hardware: Hardware) -> Result<i32> {
    let Hardware {
        pins,
        camera,
        display,
        clock,
    } = hardware;

    let bus = EventBus::new(config.workers, config.blink.interval(), config.montage.interval());
    let (booth, exit) = Booth::new(
        config,
        assets,
        Arc::clone(&pins),
        camera,
        display,
        bus.feedback(),
    );
    let booth = Arc::new(booth);
    let config = &booth.config;
    booth.lights.setup().context("set up lights")?;

    let (edge_tx, edge_rx) = mpsc::unbounded_channel();
    for button in &config.buttons {
        let debouncer = Debouncer::new(button.pin, config.bounce(), Arc::clone(&clock), edge_tx.clone());
        pins.configure_input(button.pin, EdgeMode::Both, config.bounce(), debouncer.into_callback())
            .with_context(|| format!("configure button on pin {}", button.pin))?;
    }
    drop(edge_tx);
    let aggregator = tokio::spawn(run_aggregator(
        edge_rx,
        CommandRouter::new(&config.buttons),
        bus.commands(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let bus_task = tokio::spawn(bus.run(Arc::clone(&booth), shutdown_rx));
    info!(buttons = config.buttons.len(), "booth ready");

    let code = exit.wait().await;
    let _ = shutdown_tx.send(true);
    bus_task.await.context("event bus task failed")?;
    aggregator.abort();

    let code = code.ok_or_else(|| anyhow!("exit slot dropped without a code"))?;
    info!(code, "shutting down");

    let lights = booth.lights.clone();
    let step = config.lightshow_step();
    tokio::task::spawn_blocking(move || lights.lightshow(step))
        .await
        .context("lightshow task failed")??;
    if let Err(err) = pins.cleanup() {
        warn!("pin cleanup failed: {err:#}");
    }
    Ok(code)
}
