//! Game settings and preferences
//!
//! Persisted separately from the progression record, under its own key.

use serde::{Deserialize, Serialize};

use crate::persistence::{BlobStore, StoreError};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    /// Background stars for this preset
    pub fn star_count(&self) -> usize {
        match self {
            QualityPreset::Low => 40,
            QualityPreset::Medium => 100,
            QualityPreset::High => 160,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    /// Screen shake on hits and kills
    pub screen_shake: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Mute (and pause) when the window loses focus
    pub mute_on_blur: bool,

    /// Reduced motion (disables shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            screen_shake: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            mute_on_blur: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "spaceDefenderSettings";

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    pub fn star_count(&self) -> usize {
        self.quality.star_count()
    }

    /// Clamp volumes into range
    pub fn sanitize(&mut self) {
        for vol in [
            &mut self.master_volume,
            &mut self.sfx_volume,
            &mut self.music_volume,
        ] {
            *vol = if vol.is_nan() { 1.0 } else { vol.clamp(0.0, 1.0) };
        }
    }

    /// Load settings, falling back to defaults
    pub fn load(store: &impl BlobStore) -> Self {
        match store.load(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Self>(&json) {
                Ok(mut settings) => {
                    settings.sanitize();
                    log::info!("Loaded settings ({} quality)", settings.quality.as_str());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring unreadable settings: {e}");
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to load settings: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut impl BlobStore) {
        let result = serde_json::to_string(self)
            .map_err(StoreError::from)
            .and_then(|json| store.save(Self::STORAGE_KEY, &json));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {e}"),
        }
    }
}
