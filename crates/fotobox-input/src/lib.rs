//! Button input: from raw pin levels to commands.
//!
//! This crate provides:
//! - [`Debouncer`]: turns driver callbacks into timestamped [`PinEdge`]s
//! - [`PushAggregator`]: pairs presses with releases and keeps pushes from overlapping
//! - [`CommandRouter`]: maps a push to its button's action or to a log line
//! - [`run_aggregator`]: the task wiring the three together
//!
//! [`PinEdge`]: fotobox_types::PinEdge

mod aggregate;
mod debounce;
mod router;

pub use aggregate::{PushAggregator, PushArbiter, PushDetector};
pub use debounce::Debouncer;
pub use router::{CommandRouter, route};

use fotobox_types::{Command, PinEdge};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

/// Consume debounced edges until every debouncer is gone, forwarding routed
/// commands onto `commands`.
pub async fn run_aggregator(
    mut edges: UnboundedReceiver<PinEdge>,
    router: CommandRouter,
    commands: UnboundedSender<Command>,
) {
    let mut aggregator = PushAggregator::new();
    while let Some(edge) = edges.recv().await {
        let Some(push) = aggregator.feed(edge) else {
            continue;
        };
        debug!(%push, "push accepted");
        let Some(command) = router.route(&push) else {
            continue;
        };
        if commands.send(command).is_err() {
            break;
        }
    }
    info!("button aggregator stopped");
}
