pub mod camera;
pub mod display;
pub mod pins;
pub mod sound;
