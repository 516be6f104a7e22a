use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::traits::sound::SoundBackend;

/// Sound backend for machines without an audio device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSound;

impl SoundBackend for SilentSound {
    fn play_file(&mut self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "sound muted");
        Ok(())
    }

    fn stop_all(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(feature = "audio")]
pub use kira_backend::KiraSound;

#[cfg(feature = "audio")]
mod kira_backend {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use anyhow::{Result, anyhow};
    use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
    use kira::{AudioManager, AudioManagerSettings, DefaultBackend, Tween};

    use crate::traits::sound::SoundBackend;

    /// Sound backend backed by kira. Decoded files are cached by path.
    pub struct KiraSound {
        manager: AudioManager<DefaultBackend>,
        sounds: HashMap<PathBuf, StaticSoundData>,
        current: Option<StaticSoundHandle>,
    }

    impl KiraSound {
        pub fn new() -> Result<Self> {
            let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
                .map_err(|e| anyhow!("Failed to create audio manager: {e}"))?;
            Ok(Self {
                manager,
                sounds: HashMap::new(),
                current: None,
            })
        }

        fn load(&mut self, path: &Path) -> Result<StaticSoundData> {
            if let Some(data) = self.sounds.get(path) {
                return Ok(data.clone());
            }
            let data = StaticSoundData::from_file(path)
                .map_err(|e| anyhow!("Failed to load sound {}: {e}", path.display()))?;
            self.sounds.insert(path.to_path_buf(), data.clone());
            Ok(data)
        }
    }

    impl SoundBackend for KiraSound {
        fn play_file(&mut self, path: &Path) -> Result<()> {
            let data = self.load(path)?;
            self.stop_all()?;
            let handle = self
                .manager
                .play(data)
                .map_err(|e| anyhow!("Failed to play sound: {e}"))?;
            self.current = Some(handle);
            Ok(())
        }

        fn stop_all(&mut self) -> Result<()> {
            if let Some(mut handle) = self.current.take() {
                handle.stop(Tween::default());
            }
            Ok(())
        }
    }
}
