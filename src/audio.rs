//! Audio and haptic cues
//!
//! The level never plays sound itself; it emits `SoundEffect` / `Haptic`
//! events for the host. Background music is the one long-lived resource: a
//! single handle owned by the director, loaded lazily and shared by every
//! level instance.

use std::path::{Path, PathBuf};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// A vine was cut
    Slice,
    /// Prize fell in the water
    Splash,
    /// Crocodile ate the prize
    NomNom,
}

impl SoundEffect {
    /// Bundled file for this effect
    pub fn file_name(&self) -> &'static str {
        match self {
            SoundEffect::Slice => "Slice.caf",
            SoundEffect::Splash => "Splash.caf",
            SoundEffect::NomNom => "NomNom.caf",
        }
    }
}

/// Impact feedback strength
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haptic {
    Light,
    Heavy,
}

/// Process-wide background music handle
#[derive(Debug, Default)]
pub struct BackgroundMusic {
    /// Track that loaded successfully
    track: Option<PathBuf>,
    load_attempted: bool,
    playing: bool,
    volume: f32,
    starts: u32,
}

impl BackgroundMusic {
    pub fn new() -> Self {
        Self {
            volume: 0.7,
            ..Default::default()
        }
    }

    /// Load the track the first time this is called; later calls do nothing.
    /// A missing or unreadable file leaves the handle silent.
    pub fn load_once(&mut self, path: impl AsRef<Path>) {
        if self.load_attempted {
            return;
        }
        self.load_attempted = true;

        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(data) => {
                log::info!("Loaded background music {} ({} bytes)", path.display(), data.len());
                self.track = Some(path.to_path_buf());
            }
            Err(e) => {
                log::warn!(
                    "Failed to load background music {}: {e} - music disabled",
                    path.display()
                );
            }
        }
    }

    /// Start looping the track unless it is already playing.
    /// Returns true only if playback started on this call.
    pub fn ensure_playing(&mut self) -> bool {
        if self.playing || self.track.is_none() {
            return false;
        }
        self.playing = true;
        self.starts += 1;
        log::debug!("Background music started (volume {:.2})", self.volume);
        true
    }

    pub fn is_loaded(&self) -> bool {
        self.track.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// How many times playback has been (re)started
    pub fn start_count(&self) -> u32 {
        self.starts
    }

    /// Set volume (0.0 - 1.0)
    pub fn set_volume(&mut self, vol: f32) {
        self.volume = vol.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_track(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("snip-the-vine-{}-{name}", std::process::id()));
        std::fs::write(&path, b"not really audio").unwrap();
        path
    }

    #[test]
    fn test_missing_music_is_tolerated() {
        let mut music = BackgroundMusic::new();
        music.load_once("no/such/music.mp3");
        assert!(!music.is_loaded());
        assert!(!music.ensure_playing());
        assert!(!music.is_playing());
    }

    #[test]
    fn test_ensure_playing_is_idempotent() {
        let path = temp_track("idempotent.mp3");
        let mut music = BackgroundMusic::new();
        music.load_once(&path);
        assert!(music.is_loaded());

        assert!(music.ensure_playing());
        assert!(!music.ensure_playing());
        // Reloading for the next level does not restart the track
        music.load_once(&path);
        assert!(!music.ensure_playing());
        assert_eq!(music.start_count(), 1);
        assert!(music.is_playing());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_happens_once() {
        let path = temp_track("once.mp3");
        let mut music = BackgroundMusic::new();
        music.load_once("no/such/music.mp3");
        // A later good path is ignored: loading is attempted only once
        music.load_once(&path);
        assert!(!music.is_loaded());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_volume() {
        let mut music = BackgroundMusic::new();
        assert_eq!(music.volume(), 0.7);
        music.set_volume(1.5);
        assert_eq!(music.volume(), 1.0);
        music.set_volume(-1.0);
        assert_eq!(music.volume(), 0.0);
    }
}
