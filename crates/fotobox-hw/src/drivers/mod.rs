//! Concrete drivers.

mod console;
mod framebuffer;
mod sound;
mod still_camera;

#[cfg(feature = "rpi")]
mod rpi;

pub use console::ConsolePins;
pub use framebuffer::FramebufferDisplay;
pub use sound::SilentSound;
pub use still_camera::StillCommandCamera;

#[cfg(feature = "audio")]
pub use sound::KiraSound;

#[cfg(feature = "rpi")]
pub use rpi::RppalPins;
