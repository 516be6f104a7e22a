//! Value types shared by every fotobox crate.
//!
//! This crate provides:
//! - [`PinEdge`] / [`Push`]: debounced input events and completed button pushes
//! - [`Command`]: the closed set of commands travelling over the event bus
//! - [`TimeProvider`]: monotonic microsecond clock used to timestamp edges

pub mod command;
pub mod event;
pub mod time;

pub use command::{ButtonAction, Command};
pub use event::{EdgeCallback, Level, PinEdge, PinId, Push, Transition};
pub use time::{MockTimeProvider, SystemTimeProvider, TimeProvider};
