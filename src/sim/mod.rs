//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one tick = [`crate::consts::TICK_MS`])
//! - Seeded RNG only
//! - Stable iteration order (stored order, visited back to front)
//! - Drawing goes through [`crate::renderer::RenderSink`] only

pub mod collision;
pub mod combo;
pub mod difficulty;
pub mod entity;
pub mod state;
pub mod tick;

pub use collision::{Rect, aabb_intersects};
pub use combo::{Combo, KillTarget, Reward, bomb_reward, kill_reward};
pub use entity::{Enemy, Explosion, Owner, Player, Powerup, PowerupKind, Projectile};
pub use state::{Buffs, Field, GameEvent, GamePhase, GameState, Loadout, ScreenShake, Starfield};
pub use tick::{TickInput, activate_powerup, check_level_up, tick, trigger_boss};
