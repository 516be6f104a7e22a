use std::path::Path;

use anyhow::Result;

/// Abstraction over audio backends.
/// Implementations: KiraSound (kira, `audio` feature), SilentSound (no device).
///
/// The booth has one music channel: starting a sound stops the previous one.
pub trait SoundBackend: Send {
    fn play_file(&mut self, path: &Path) -> Result<()>;
    fn stop_all(&mut self) -> Result<()>;
}
