//! Field entities: player, projectiles, enemies, power-ups, explosions
//!
//! Each transient entity implements [`Entity`]: one movement step, one
//! removal predicate and one draw per tick. Rendering goes through the
//! tagged [`Drawable`] view so the sink never needs to know concrete types.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::difficulty;
use super::state::Field;
use crate::consts::*;
use crate::progression::SkinId;
use crate::renderer::{Drawable, RenderSink};

/// Uniform per-tick behaviour for transient entities
pub trait Entity {
    /// Collision box
    fn bounds(&self) -> Rect;

    /// Advance one tick
    fn update(&mut self, field: &Field);

    /// Removal predicate evaluated once per tick after `update`
    fn is_expired(&self, field: &Field) -> bool;

    /// Tagged view handed to the render sink
    fn drawable(&self) -> Drawable<'_>;

    fn draw(&self, sink: &mut dyn RenderSink) {
        sink.draw(self.drawable());
    }
}

// === Player ===

/// The player's ship
#[derive(Debug, Clone)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub base_speed: f32,
    /// Effective speed (upgrades + sensitivity)
    pub speed: f32,
    /// Equipped cosmetic
    pub skin: SkinId,
}

impl Player {
    pub fn new(field: &Field) -> Self {
        let mut player = Self {
            pos: Vec2::ZERO,
            size: Vec2::splat(PLAYER_SIZE),
            base_speed: PLAYER_BASE_SPEED,
            speed: PLAYER_BASE_SPEED,
            skin: SkinId::default(),
        };
        player.reset_position(field);
        player
    }

    /// Park the ship at bottom centre
    pub fn reset_position(&mut self, field: &Field) {
        self.pos = Vec2::new(
            field.width / 2.0 - self.size.x / 2.0,
            field.height - PLAYER_BOTTOM_OFFSET,
        );
    }

    /// Move from held direction input, clamped to the field
    pub fn update(&mut self, left: bool, right: bool, field: &Field) {
        if left {
            self.pos.x = (self.pos.x - self.speed).max(0.0);
        }
        if right {
            self.pos.x = (self.pos.x + self.speed).min(field.width - self.size.x);
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    /// Spawn point of the main gun
    pub fn nose(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.size.x / 2.0 - PROJECTILE_SIZE.x / 2.0, self.pos.y)
    }

    /// Spawn points of the wing guns (multi-shot)
    pub fn wings(&self) -> [Vec2; 2] {
        [
            Vec2::new(self.pos.x + 10.0, self.pos.y + 10.0),
            Vec2::new(self.pos.x + self.size.x - 10.0, self.pos.y + 10.0),
        ]
    }

    pub fn draw(&self, sink: &mut dyn RenderSink, shielded: bool) {
        sink.draw(Drawable::Player {
            player: self,
            shielded,
        });
    }
}

// === Projectiles ===

pub const PROJECTILE_SIZE: Vec2 = Vec2::new(4.0, 15.0);
/// Margin past the top/bottom edge before a shot is discarded
const PROJECTILE_MARGIN: f32 = 20.0;

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

/// A shot travelling vertically
#[derive(Debug, Clone)]
pub struct Projectile {
    pub pos: Vec2,
    /// Vertical velocity (negative = upward)
    pub vel_y: f32,
    pub owner: Owner,
}

impl Projectile {
    /// Create a shot whose speed scales with `level`
    pub fn new(pos: Vec2, level: u32, owner: Owner) -> Self {
        Self {
            pos,
            vel_y: difficulty::projectile_velocity(level, owner == Owner::Enemy),
            owner,
        }
    }

    pub fn is_enemy(&self) -> bool {
        self.owner == Owner::Enemy
    }
}

impl Entity for Projectile {
    fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.pos, PROJECTILE_SIZE)
    }

    fn update(&mut self, _field: &Field) {
        self.pos.y += self.vel_y;
    }

    fn is_expired(&self, field: &Field) -> bool {
        self.pos.y < -PROJECTILE_MARGIN || self.pos.y > field.height + PROJECTILE_MARGIN
    }

    fn drawable(&self) -> Drawable<'_> {
        Drawable::Projectile(self)
    }
}

// === Enemies ===

pub const ENEMY_SIZE: f32 = 40.0;
pub const BOSS_SIZE: f32 = 80.0;
/// How far below the field an enemy may drift before it is discarded
const ENEMY_EXIT_MARGIN: f32 = 50.0;
/// Boss descent per wall bounce
const BOSS_BOUNCE_DROP: f32 = 10.0;
/// Number of regular enemy hull variants
pub const ENEMY_VARIANTS: u8 = 3;

/// A hostile ship (regular or boss)
#[derive(Debug, Clone)]
pub struct Enemy {
    /// Top-left corner
    pub pos: Vec2,
    /// Square side length
    pub size: f32,
    /// Vertical speed per tick
    pub speed: f32,
    pub health: f32,
    pub max_health: u32,
    pub boss: bool,
    /// Hull variant (cosmetic, regular enemies)
    pub variant: u8,
    /// Ticks until the next shot may be fired
    pub shoot_cooldown: i32,
    /// Horizontal velocity (boss only)
    pub sway: f32,
}

impl Enemy {
    /// Regular enemy entering from above at a random column
    pub fn spawn_regular(level: u32, field: &Field, rng: &mut impl Rng) -> Self {
        let size = ENEMY_SIZE;
        let x = rng.random::<f32>() * (field.width - size).max(0.0);
        let base = difficulty::enemy_base_speed(level, rng.random::<f32>());
        let health = difficulty::enemy_health(level, false);
        Self {
            pos: Vec2::new(x, -size),
            size,
            speed: base * difficulty::enemy_speed_multiplier(level),
            health: health as f32,
            max_health: health,
            boss: false,
            variant: rng.random_range(0..ENEMY_VARIANTS),
            shoot_cooldown: 0,
            sway: 0.0,
        }
    }

    /// Boss entering at the top centre
    pub fn spawn_boss(level: u32, field: &Field) -> Self {
        let size = BOSS_SIZE;
        let health = difficulty::enemy_health(level, true);
        Self {
            pos: Vec2::new(field.width / 2.0 - size / 2.0, -size),
            size,
            speed: difficulty::boss_speed(level),
            health: health as f32,
            max_health: health,
            boss: true,
            variant: 0,
            shoot_cooldown: 0,
            sway: difficulty::boss_sway_speed(level),
        }
    }

    /// Apply `damage`; returns true when the enemy is destroyed
    pub fn take_damage(&mut self, damage: f32) -> bool {
        self.health -= damage;
        self.health <= 0.0
    }

    /// Fraction of health left (health bar)
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        (self.health / self.max_health as f32).clamp(0.0, 1.0)
    }

    /// Tick the gun; returns any shots fired this tick
    pub fn fire(&mut self, level: u32, rng: &mut impl Rng) -> Vec<Projectile> {
        self.shoot_cooldown -= 1;
        if self.shoot_cooldown > 0 {
            return Vec::new();
        }

        let muzzle_y = self.pos.y + self.size;
        if self.boss {
            self.shoot_cooldown = BOSS_FIRE_INTERVAL_TICKS;
            return vec![
                Projectile::new(
                    Vec2::new(self.pos.x + self.size / 2.0 - PROJECTILE_SIZE.x / 2.0, muzzle_y),
                    level,
                    Owner::Enemy,
                ),
                Projectile::new(Vec2::new(self.pos.x + 20.0, muzzle_y), level, Owner::Enemy),
                Projectile::new(
                    Vec2::new(self.pos.x + self.size - 20.0, muzzle_y),
                    level,
                    Owner::Enemy,
                ),
            ];
        }

        let chance = difficulty::enemy_fire_chance(level).clamp(0.0, 1.0);
        if rng.random_bool(chance) {
            self.shoot_cooldown = difficulty::enemy_fire_cooldown(level);
            vec![Projectile::new(
                Vec2::new(self.pos.x + self.size / 2.0 - PROJECTILE_SIZE.x / 2.0, muzzle_y),
                level,
                Owner::Enemy,
            )]
        } else {
            Vec::new()
        }
    }
}

impl Entity for Enemy {
    fn bounds(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size, self.size)
    }

    fn update(&mut self, field: &Field) {
        if self.boss {
            self.pos.x += self.sway;
            if self.pos.x <= 0.0 || self.pos.x >= field.width - self.size {
                self.sway = -self.sway;
                self.pos.y += BOSS_BOUNCE_DROP;
            }
        } else {
            self.pos.y += self.speed;
        }
    }

    fn is_expired(&self, field: &Field) -> bool {
        self.pos.y > field.height + ENEMY_EXIT_MARGIN
    }

    fn drawable(&self) -> Drawable<'_> {
        Drawable::Enemy(self)
    }
}

// === Power-ups ===

pub const POWERUP_SIZE: f32 = 30.0;
const POWERUP_FALL_SPEED: f32 = 2.0;
const POWERUP_SPIN: f32 = 0.05;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerupKind {
    Shield,
    RapidFire,
    MultiShot,
    Health,
    Bomb,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 5] = [
        PowerupKind::Shield,
        PowerupKind::RapidFire,
        PowerupKind::MultiShot,
        PowerupKind::Health,
        PowerupKind::Bomb,
    ];

    /// Drop weight (weights sum to 100)
    pub fn weight(&self) -> f32 {
        match self {
            PowerupKind::Shield => 20.0,
            PowerupKind::RapidFire => 25.0,
            PowerupKind::MultiShot => 20.0,
            PowerupKind::Health => 15.0,
            PowerupKind::Bomb => 20.0,
        }
    }

    /// Map a roll in [0, 100) onto the cumulative weight table
    pub fn from_roll(roll: f32) -> Self {
        let mut cumulative = 0.0;
        for kind in Self::ALL {
            cumulative += kind.weight();
            if roll <= cumulative {
                return kind;
            }
        }
        PowerupKind::Bomb
    }

    /// Draw a weighted random type
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::from_roll(rng.random::<f32>() * 100.0)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerupKind::Shield => "shield",
            PowerupKind::RapidFire => "rapidFire",
            PowerupKind::MultiShot => "multiShot",
            PowerupKind::Health => "health",
            PowerupKind::Bomb => "bomb",
        }
    }
}

/// A falling pickup
#[derive(Debug, Clone)]
pub struct Powerup {
    /// Top-left corner
    pub pos: Vec2,
    pub kind: PowerupKind,
    pub speed: f32,
    /// Cosmetic spin (radians)
    pub rotation: f32,
}

impl Powerup {
    /// Pickup centred on `center`
    pub fn new(center: Vec2, kind: PowerupKind) -> Self {
        Self {
            pos: center - Vec2::splat(POWERUP_SIZE / 2.0),
            kind,
            speed: POWERUP_FALL_SPEED,
            rotation: 0.0,
        }
    }
}

impl Entity for Powerup {
    fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.pos, Vec2::splat(POWERUP_SIZE))
    }

    fn update(&mut self, _field: &Field) {
        self.pos.y += self.speed;
        self.rotation += POWERUP_SPIN;
    }

    fn is_expired(&self, field: &Field) -> bool {
        self.pos.y > field.height
    }

    fn drawable(&self) -> Drawable<'_> {
        Drawable::Powerup(self)
    }
}

// === Explosions ===

/// Number of explosion palette entries
pub const PARTICLE_COLORS: u8 = 4;

/// One explosion particle
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Ticks left to live
    pub life: u32,
    pub size: f32,
    /// Palette index
    pub color: u8,
}

/// A burst of particles
#[derive(Debug, Clone)]
pub struct Explosion {
    pub particles: Vec<Particle>,
}

impl Explosion {
    /// Burst centred on `center`; big bursts have twice the particles and 1.5x spread
    pub fn new(center: Vec2, big: bool, rng: &mut impl Rng) -> Self {
        let count = if big { BIG_EXPLOSION_PARTICLES } else { EXPLOSION_PARTICLES };
        let spread = if big { 1.5 } else { 1.0 };
        let particles = (0..count)
            .map(|_| Particle {
                pos: center,
                vel: Vec2::new(
                    (rng.random::<f32>() - 0.5) * 8.0 * spread,
                    (rng.random::<f32>() - 0.5) * 8.0 * spread,
                ),
                life: PARTICLE_LIFE_TICKS,
                size: rng.random::<f32>() * 3.0 + 2.0,
                color: rng.random_range(0..PARTICLE_COLORS),
            })
            .collect();
        Self { particles }
    }

    /// No particles left
    pub fn is_done(&self) -> bool {
        self.particles.is_empty()
    }
}

impl Entity for Explosion {
    fn bounds(&self) -> Rect {
        let Some(first) = self.particles.first() else {
            return Rect::new(0.0, 0.0, 0.0, 0.0);
        };
        let (min, max) = self
            .particles
            .iter()
            .fold((first.pos, first.pos), |(lo, hi), p| (lo.min(p.pos), hi.max(p.pos)));
        Rect::from_pos_size(min, max - min)
    }

    fn update(&mut self, _field: &Field) {
        for p in &mut self.particles {
            p.pos += p.vel;
            p.life = p.life.saturating_sub(1);
        }
        self.particles.retain(|p| p.life > 0);
    }

    fn is_expired(&self, _field: &Field) -> bool {
        self.is_done()
    }

    fn drawable(&self) -> Drawable<'_> {
        Drawable::Explosion(self)
    }
}
