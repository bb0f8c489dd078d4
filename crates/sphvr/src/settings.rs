use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sink::SinkKind;

/// Persisted playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphvrConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Period of the orientation tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Radians added to pitch on every tick.
    #[serde(default = "default_pitch_step")]
    pub pitch_step: f64,
    #[serde(default)]
    pub initial_roll: f64,
    #[serde(default)]
    pub initial_pitch: f64,
    #[serde(default)]
    pub initial_yaw: f64,
    #[serde(default)]
    pub sink: SinkKind,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Quit the loop on end-of-stream instead of idling on the last frame.
    #[serde(default)]
    pub stop_on_eos: bool,
}

fn default_version() -> u32 { 1 }
fn default_tick_interval_ms() -> u64 { 10 }
fn default_pitch_step() -> f64 { 0.01 }
fn default_window_width() -> u32 { 1280 }
fn default_window_height() -> u32 { 720 }

impl Default for SphvrConfig {
    fn default() -> Self {
        Self {
            version: 1,
            tick_interval_ms: 10,
            pitch_step: 0.01,
            initial_roll: 0.0,
            initial_pitch: 0.0,
            initial_yaw: 0.0,
            sink: SinkKind::default(),
            window_width: 1280,
            window_height: 720,
            stop_on_eos: false,
        }
    }
}

impl SphvrConfig {
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("sphvr").join("settings.json")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded settings from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse settings: {e}");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No settings found, using defaults");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &std::path::Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create config dir: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    log::error!("Failed to write settings: {e}");
                } else {
                    log::debug!("Saved settings to {}", path.display());
                }
            }
            Err(e) => log::error!("Failed to serialize settings: {e}"),
        }
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        // A zero period would spin the main loop.
        std::time::Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
