//! Game settings
//!
//! Loaded from a JSON file next to the game data; anything missing falls back
//! to the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether one swipe may cut more than one vine
    pub can_cut_multiple_vines_at_once: bool,

    // === Data ===
    /// Vine layout for the level
    pub vine_data_file: PathBuf,
    /// Looping background track
    pub background_music_file: PathBuf,

    // === Audio ===
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    /// Seed for the crocodile's idle timing; `None` picks one per level
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            can_cut_multiple_vines_at_once: false,
            vine_data_file: PathBuf::from("assets/VineData.json"),
            background_music_file: PathBuf::from("assets/CheeZeeJungle.caf"),
            music_volume: 0.7,
            seed: None,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
