//! Render sink abstraction
//!
//! The simulation hands every live entity to a [`RenderSink`] once per tick
//! through the tagged [`Drawable`] view. The browser build draws with a
//! Canvas 2D context; tests and headless runs use [`NullRenderer`] or
//! [`RecordingRenderer`].

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;

use glam::Vec2;

use crate::sim::entity::{Enemy, Explosion, Player, Powerup, Projectile};
use crate::sim::state::Star;

/// One item to draw this tick
#[derive(Debug, Clone, Copy)]
pub enum Drawable<'a> {
    /// Cleared frame plus starfield, offset by screen shake
    Background { stars: &'a [Star], shake: Vec2 },
    Player { player: &'a Player, shielded: bool },
    Projectile(&'a Projectile),
    Enemy(&'a Enemy),
    Powerup(&'a Powerup),
    Explosion(&'a Explosion),
}

/// Receives draw calls from the simulation
pub trait RenderSink {
    fn draw(&mut self, item: Drawable<'_>);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn draw(&mut self, _item: Drawable<'_>) {}
}

/// Counts draw calls per kind
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingRenderer {
    pub backgrounds: usize,
    pub players: usize,
    pub projectiles: usize,
    pub enemies: usize,
    pub powerups: usize,
    pub explosions: usize,
}

impl RecordingRenderer {
    pub fn total(&self) -> usize {
        self.backgrounds
            + self.players
            + self.projectiles
            + self.enemies
            + self.powerups
            + self.explosions
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl RenderSink for RecordingRenderer {
    fn draw(&mut self, item: Drawable<'_>) {
        match item {
            Drawable::Background { .. } => self.backgrounds += 1,
            Drawable::Player { .. } => self.players += 1,
            Drawable::Projectile(_) => self.projectiles += 1,
            Drawable::Enemy(_) => self.enemies += 1,
            Drawable::Powerup(_) => self.powerups += 1,
            Drawable::Explosion(_) => self.explosions += 1,
        }
    }
}
