use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use fotobox_types::Command;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Semaphore, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

/// Something that executes commands. Runs on a blocking worker thread.
pub trait CommandHandler: Send + Sync + 'static {
    fn handle(&self, command: Command);
}

/// Merges every command source onto a pool of `workers` handler threads.
///
/// Sources are the button pipeline, follow-ups posted by handlers, and two
/// periodic ticks (blink and random montage). A command is only taken off a
/// queue once a worker is free, so backlog accumulates in the queues.
pub struct EventBus {
    commands_tx: UnboundedSender<Command>,
    commands_rx: UnboundedReceiver<Command>,
    feedback_tx: UnboundedSender<Command>,
    feedback_rx: UnboundedReceiver<Command>,
    workers: usize,
    blink_every: Duration,
    montage_every: Duration,
}

fn ticker(period: Duration) -> Interval {
    // First tick one period after start, not immediately.
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

impl EventBus {
    pub fn new(workers: usize, blink_every: Duration, montage_every: Duration) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();
        Self {
            commands_tx,
            commands_rx,
            feedback_tx,
            feedback_rx,
            workers: workers.max(1),
            blink_every,
            montage_every,
        }
    }

    /// Input for routed button commands.
    pub fn commands(&self) -> UnboundedSender<Command> {
        self.commands_tx.clone()
    }

    /// Input for commands posted by handlers.
    pub fn feedback(&self) -> UnboundedSender<Command> {
        self.feedback_tx.clone()
    }

    /// Dispatch until `shutdown` flips, then wait for in-flight handlers.
    pub async fn run<H: CommandHandler>(self, handler: Arc<H>, mut shutdown: watch::Receiver<bool>) {
        let Self {
            commands_tx,
            mut commands_rx,
            feedback_tx,
            mut feedback_rx,
            workers,
            blink_every,
            montage_every,
        } = self;
        // Our own senders keep the queues open for the bus lifetime.
        let _keep = (commands_tx, feedback_tx);

        let pool = Arc::new(Semaphore::new(workers));
        let mut blink = ticker(blink_every);
        let mut montage = ticker(montage_every);
        info!(workers, "event bus started");

        loop {
            let permit = tokio::select! {
                permit = pool.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = shutdown.changed() => break,
            };

            let command = tokio::select! {
                Some(command) = commands_rx.recv() => command,
                Some(command) = feedback_rx.recv() => command,
                _ = blink.tick() => Command::Blink,
                _ = montage.tick() => Command::ShowRandomMontage,
                _ = shutdown.changed() => break,
            };

            debug!(command = command.name(), "dispatch");
            let handler = Arc::clone(&handler);
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                execute(&*handler, command);
            });
        }

        info!("event bus draining");
        // Every permit back means every handler has returned.
        let _drained = pool.acquire_many(workers as u32).await;

        // Follow-ups of finished handlers (printouts, failure logs) still run;
        // button and timer commands are dropped.
        let mut flushed = 0usize;
        while let Ok(command) = feedback_rx.try_recv() {
            debug!(command = command.name(), "flush");
            let handler = Arc::clone(&handler);
            let _ = tokio::task::spawn_blocking(move || execute(&*handler, command)).await;
            flushed += 1;
        }
        info!(flushed, "event bus stopped");
    }
}

fn execute<H: CommandHandler + ?Sized>(handler: &H, command: Command) {
    let name = command.name();
    if catch_unwind(AssertUnwindSafe(|| handler.handle(command))).is_err() {
        error!(command = name, "command handler panicked, aborting");
        std::process::abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Command>>,
        running: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    impl CommandHandler for Recorder {
        fn handle(&self, command: Command) {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.seen.lock().push(command);
            self.running.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn quiet_bus(workers: usize) -> EventBus {
        EventBus::new(workers, Duration::from_secs(3600), Duration::from_secs(3600))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pool_bounds_concurrency() {
        let bus = quiet_bus(2);
        let commands = bus.commands();
        let recorder = Arc::new(Recorder {
            delay: Duration::from_millis(30),
            ..Recorder::default()
        });
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(bus.run(recorder.clone(), stop_rx));

        for i in 0..6 {
            commands.send(Command::log(format!("{i}"))).unwrap();
        }
        while recorder.seen.lock().len() < 6 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        stop_tx.send(true).unwrap();
        task.await.unwrap();

        assert_eq!(recorder.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_feedback_and_button_commands_both_arrive() {
        let bus = quiet_bus(1);
        let commands = bus.commands();
        let feedback = bus.feedback();
        let recorder = Arc::new(Recorder::default());
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(bus.run(recorder.clone(), stop_rx));

        commands.send(Command::Quit { code: 1 }).unwrap();
        feedback.send(Command::log("follow-up")).unwrap();
        while recorder.seen.lock().len() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        stop_tx.send(true).unwrap();
        task.await.unwrap();

        let seen = recorder.seen.lock();
        assert!(seen.contains(&Command::Quit { code: 1 }));
        assert!(seen.contains(&Command::log("follow-up")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_timers_produce_idle_commands() {
        let bus = EventBus::new(2, Duration::from_millis(10), Duration::from_millis(25));
        let recorder = Arc::new(Recorder::default());
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(bus.run(recorder.clone(), stop_rx));

        tokio::time::sleep(Duration::from_millis(120)).await;
        stop_tx.send(true).unwrap();
        task.await.unwrap();

        let seen = recorder.seen.lock();
        assert!(seen.iter().any(|c| *c == Command::Blink));
        assert!(seen.iter().any(|c| *c == Command::ShowRandomMontage));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_waits_for_running_handler() {
        let bus = quiet_bus(1);
        let commands = bus.commands();
        let recorder = Arc::new(Recorder {
            delay: Duration::from_millis(80),
            ..Recorder::default()
        });
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(bus.run(recorder.clone(), stop_rx));

        commands.send(Command::Blink).unwrap();
        while recorder.running.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        stop_tx.send(true).unwrap();
        task.await.unwrap();

        assert_eq!(recorder.seen.lock().len(), 1);
        assert_eq!(recorder.running.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_flushes_pending_feedback() {
        let bus = quiet_bus(1);
        let commands = bus.commands();
        let feedback = bus.feedback();
        let recorder = Arc::new(Recorder {
            delay: Duration::from_millis(50),
            ..Recorder::default()
        });
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(bus.run(recorder.clone(), stop_rx));

        commands.send(Command::Blink).unwrap();
        while recorder.running.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        // Queued behind the busy worker when the quit lands.
        let printout = Command::CreateComposite {
            photos: Vec::new(),
            timestamp: "2026-01-01_00-00-00".into(),
        };
        feedback.send(printout.clone()).unwrap();
        commands.send(Command::Blink).unwrap();
        stop_tx.send(true).unwrap();
        task.await.unwrap();

        let seen = recorder.seen.lock();
        assert!(seen.contains(&printout));
        assert!(seen.len() <= 3);
    }
}
