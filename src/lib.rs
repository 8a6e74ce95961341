//! Space Defender - A vertical arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, combo, difficulty, tick)
//! - `progression`: Persistent economy (coins, skins, music, upgrades, stats)
//! - `game`: Session orchestrator tying the simulation to progression and sinks
//! - `renderer`: Render sink abstraction (+ Canvas 2D on the web)
//! - `audio`: Sound cues, music sequencer (+ Web Audio on the web)
//! - `platform`: Browser/native input mapping
//! - `persistence`: Key-value blob stores

pub mod audio;
pub mod game;
pub mod persistence;
pub mod platform;
pub mod progression;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use game::{FrameStatus, Game, Hud};
pub use progression::{ProgressionRecord, ProgressionStore};
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Nominal frame duration (one tick per display refresh at 60 Hz)
    pub const TICK_MS: f64 = 1000.0 / 60.0;

    /// Default play field dimensions
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Player ship
    pub const PLAYER_SIZE: f32 = 50.0;
    pub const PLAYER_BASE_SPEED: f32 = 7.0;
    /// Distance from the bottom edge to the player's top edge
    pub const PLAYER_BOTTOM_OFFSET: f32 = 80.0;
    pub const BASE_LIVES: u32 = 3;
    /// Health pickups can raise lives up to this (+ health upgrades)
    pub const MAX_LIVES_CAP: u32 = 5;

    /// Fire cooldown in ticks (200 ms / 100 ms with rapid fire)
    pub const FIRE_COOLDOWN_TICKS: u32 = 12;
    pub const RAPID_FIRE_COOLDOWN_TICKS: u32 = 6;

    /// Buff durations in ticks
    pub const SHIELD_TICKS: u32 = 600;
    pub const RAPID_FIRE_TICKS: u32 = 480;
    pub const MULTI_SHOT_TICKS: u32 = 480;

    /// Combo window
    pub const COMBO_TIMEOUT_MS: f64 = 3000.0;
    pub const COMBO_BONUS_PER_STEP: u64 = 50;

    /// Boss intro delay (3000 ms)
    pub const BOSS_INTRO_TICKS: u32 = 180;
    /// Boss encounters happen on every multiple of this level
    pub const BOSS_LEVEL_INTERVAL: u32 = 5;
    pub const BOSS_FIRE_INTERVAL_TICKS: i32 = 40;

    /// Score needed per level
    pub const SCORE_PER_LEVEL: u64 = 500;

    /// Chance a regular kill drops a power-up
    pub const POWERUP_DROP_CHANCE: f64 = 0.15;

    /// Score granted by a health pickup
    pub const HEALTH_PICKUP_SCORE: u64 = 50;

    /// Background stars (Medium quality)
    pub const STAR_COUNT: usize = 100;

    /// Explosion particles
    pub const EXPLOSION_PARTICLES: usize = 15;
    pub const BIG_EXPLOSION_PARTICLES: usize = 30;
    pub const PARTICLE_LIFE_TICKS: u32 = 30;

    /// Screen shake kicks
    pub const SHAKE_PLAYER_HIT: f32 = 10.0;
    pub const SHAKE_SHIELD_DEFLECT: f32 = 3.0;
    pub const SHAKE_ENEMY_RAM: f32 = 8.0;
    pub const SHAKE_BOSS_RAM: f32 = 20.0;
    pub const SHAKE_KILL: f32 = 5.0;
    pub const SHAKE_BOSS_KILL: f32 = 15.0;
}
