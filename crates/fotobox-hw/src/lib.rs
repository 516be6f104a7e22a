//! Hardware seams of the booth.
//!
//! The sequencer only ever talks to these traits:
//! - [`PinDriver`]: digital inputs with edge callbacks and digital outputs
//! - [`Camera`]: preview, still capture and preview overlays
//! - [`Display`]: screen blits and sound playback
//!
//! Concrete drivers live in [`drivers`]. Recording doubles for tests live in
//! [`mock`] behind the `test-support` feature.

pub mod drivers;
pub mod guard;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use guard::{OverlayGuard, PreviewGuard};
pub use traits::camera::{Camera, OverlayId};
pub use traits::display::{Display, scale};
pub use traits::pins::{EdgeMode, PinDriver};
pub use traits::sound::SoundBackend;
