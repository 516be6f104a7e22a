//! Event bus and capture sequencer of the booth.
//!
//! This crate provides:
//! - [`EventBus`]: merges button, feedback and timer commands onto a bounded worker pool
//! - [`Booth`]: the shared context every command handler runs against
//! - the handlers: [`shoot`], [`countdown`], [`idle`], [`composite`]
//! - [`run`]: wires drivers, input pipeline and bus together until a quit code arrives

pub mod assets;
pub mod booth;
pub mod bus;
pub mod composite;
pub mod countdown;
pub mod idle;
pub mod lights;
pub mod lock;
pub mod run;
pub mod shoot;

pub use assets::Assets;
pub use booth::Booth;
pub use bus::{CommandHandler, EventBus};
pub use lights::Lights;
pub use lock::{ExclusiveLock, ExitReceiver, ExitSlot, ShootingGuard};
pub use run::{Hardware, run};
