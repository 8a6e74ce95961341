//! Level-driven difficulty curve
//!
//! Pure functions of the current level. Levels start at 1.

use crate::consts::{BOSS_LEVEL_INTERVAL, SCORE_PER_LEVEL};

/// Minimum delay between regular enemy spawns (ms)
pub const MIN_SPAWN_INTERVAL_MS: f64 = 300.0;
/// Spawn delay at level 0 (ms)
pub const BASE_SPAWN_INTERVAL_MS: f64 = 2000.0;
/// Spawn delay reduction per level (ms)
pub const SPAWN_INTERVAL_STEP_MS: f64 = 200.0;

/// Delay between regular enemy spawns
pub fn spawn_interval_ms(level: u32) -> f64 {
    (BASE_SPAWN_INTERVAL_MS - SPAWN_INTERVAL_STEP_MS * level as f64).max(MIN_SPAWN_INTERVAL_MS)
}

/// Multiplier applied to a regular enemy's random base speed
pub fn enemy_speed_multiplier(level: u32) -> f32 {
    1.0 + 0.5 * level as f32
}

/// Base speed before the level multiplier; `roll` is uniform in [0, 1)
pub fn enemy_base_speed(level: u32, roll: f32) -> f32 {
    1.0 + roll * 2.0 + 0.5 * level as f32
}

/// Hit points for a freshly spawned enemy
pub fn enemy_health(level: u32, boss: bool) -> u32 {
    if boss { 50 + 15 * level } else { 1 + level / 3 }
}

/// Boss vertical drift speed
pub fn boss_speed(level: u32) -> f32 {
    0.5 + 0.2 * level as f32
}

/// Boss horizontal oscillation speed
pub fn boss_sway_speed(level: u32) -> f32 {
    2.0 + 0.3 * level as f32
}

/// Global projectile speed scale
pub fn projectile_speed_scale(level: u32) -> f32 {
    1.0 + 0.15 * level as f32
}

/// Signed vertical velocity for a projectile fired at `level`
///
/// Player shots travel up (negative y), enemy shots travel down.
pub fn projectile_velocity(level: u32, from_enemy: bool) -> f32 {
    let lvl = level as f32;
    let base = if from_enemy { 5.0 + lvl * 0.5 } else { -10.0 - lvl * 0.3 };
    base * projectile_speed_scale(level)
}

/// Per-tick probability that a regular enemy with no cooldown fires
pub fn enemy_fire_chance(level: u32) -> f64 {
    let lvl = level as f64;
    0.005 * lvl * (1.0 + lvl * 0.1)
}

/// Cooldown (ticks) after a regular enemy fires
pub fn enemy_fire_cooldown(level: u32) -> i32 {
    (60 - 2 * level as i32).max(40)
}

/// Score required to leave `level`
pub fn level_threshold(level: u32) -> u64 {
    level as u64 * SCORE_PER_LEVEL
}

/// Whether reaching `level` starts a boss encounter
pub fn is_boss_level(level: u32) -> bool {
    level > 0 && level % BOSS_LEVEL_INTERVAL == 0
}

/// Progress through the current level (0.0 - 1.0) for the HUD bar
pub fn level_progress(level: u32, score: u64) -> f32 {
    let floor = level_threshold(level.saturating_sub(1));
    let ceil = level_threshold(level);
    if ceil <= floor {
        return 0.0;
    }
    (score.saturating_sub(floor) as f32 / (ceil - floor) as f32).clamp(0.0, 1.0)
}
