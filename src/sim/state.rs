//! Session state and core simulation types
//!
//! Everything a run mutates lives in [`GameState`]. It is rebuilt from
//! scratch at the start of every run and never persisted.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combo::{Combo, coin_multiplier_pct};
use super::difficulty;
use super::entity::{Enemy, Explosion, Player, PowerupKind, Powerup, Projectile};
use crate::audio::SoundCue;
use crate::consts::*;
use crate::progression::{RunSummary, SkinId};

/// Play field dimensions (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
        }
    }
}

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Running,
    Paused,
    /// Lives ran out
    GameOver,
}

/// Simulation parameters derived from progression for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Loadout {
    pub skin: SkinId,
    /// Player speed per tick (upgrades x sensitivity)
    pub player_speed: f32,
    /// Damage per player projectile hit
    pub damage: f32,
    /// Coin multiplier in percent
    pub coin_pct: u64,
    /// Extra lives from health upgrades
    pub bonus_lives: u32,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            skin: SkinId::default(),
            player_speed: PLAYER_BASE_SPEED,
            damage: 1.0,
            coin_pct: coin_multiplier_pct(false, 0),
            bonus_lives: 0,
        }
    }
}

impl Loadout {
    pub fn starting_lives(&self) -> u32 {
        BASE_LIVES + self.bonus_lives
    }

    pub fn max_lives(&self) -> u32 {
        MAX_LIVES_CAP + self.bonus_lives
    }
}

/// Timed buffs, in remaining ticks (0 = inactive)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buffs {
    pub shield: u32,
    pub rapid_fire: u32,
    pub multi_shot: u32,
}

impl Buffs {
    pub fn tick(&mut self) {
        self.shield = self.shield.saturating_sub(1);
        self.rapid_fire = self.rapid_fire.saturating_sub(1);
        self.multi_shot = self.multi_shot.saturating_sub(1);
    }

    pub fn shield_active(&self) -> bool {
        self.shield > 0
    }

    pub fn rapid_fire_active(&self) -> bool {
        self.rapid_fire > 0
    }

    pub fn multi_shot_active(&self) -> bool {
        self.multi_shot > 0
    }

    /// Start (or restart) the timer for a timed kind; false for instant kinds
    pub fn activate(&mut self, kind: PowerupKind) -> bool {
        match kind {
            PowerupKind::Shield => self.shield = SHIELD_TICKS,
            PowerupKind::RapidFire => self.rapid_fire = RAPID_FIRE_TICKS,
            PowerupKind::MultiShot => self.multi_shot = MULTI_SHOT_TICKS,
            PowerupKind::Health | PowerupKind::Bomb => return false,
        }
        true
    }
}

/// Screen shake (render offset, decays every tick)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenShake {
    pub offset: Vec2,
    pub intensity: f32,
    pub enabled: bool,
}

impl Default for ScreenShake {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            intensity: 0.0,
            enabled: true,
        }
    }
}

impl ScreenShake {
    pub fn kick(&mut self, intensity: f32) {
        if self.enabled {
            self.intensity = intensity;
        }
    }

    pub fn decay(&mut self, rng: &mut impl Rng) {
        if self.intensity <= 0.0 {
            return;
        }
        self.offset = Vec2::new(
            (rng.random::<f32>() - 0.5) * self.intensity,
            (rng.random::<f32>() - 0.5) * self.intensity,
        );
        self.intensity *= 0.9;
        if self.intensity < 0.5 {
            self.intensity = 0.0;
            self.offset = Vec2::ZERO;
        }
    }
}

/// A background star
#[derive(Debug, Clone, Copy)]
pub struct Star {
    pub pos: Vec2,
    pub size: f32,
    pub speed: f32,
}

/// Scrolling starfield (decoration only)
#[derive(Debug, Clone, Default)]
pub struct Starfield {
    pub stars: Vec<Star>,
}

impl Starfield {
    pub fn new(count: usize, field: &Field, rng: &mut impl Rng) -> Self {
        let stars = (0..count)
            .map(|_| Star {
                pos: Vec2::new(rng.random::<f32>() * field.width, rng.random::<f32>() * field.height),
                size: rng.random::<f32>() * 2.0,
                speed: rng.random::<f32>() * 2.0 + 0.5,
            })
            .collect();
        Self { stars }
    }

    /// Scroll down, wrapping stars back to the top at a new column
    pub fn advance(&mut self, field: &Field, rng: &mut impl Rng) {
        for star in &mut self.stars {
            star.pos.y += star.speed;
            if star.pos.y > field.height {
                star.pos.y = 0.0;
                star.pos.x = rng.random::<f32>() * field.width;
            }
        }
    }
}

/// Something that happened during a tick (consumed by audio/UI)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Player fired
    Shot,
    /// Player lost a life
    PlayerHit { lives_left: u32 },
    /// Shield absorbed a hit
    ShieldDeflect,
    EnemyKilled {
        boss: bool,
        score: u64,
        coins: u64,
    },
    /// Kill chain grew to `count` (>= 2)
    ComboExtended { count: u32, bonus: u64 },
    PowerupCollected(PowerupKind),
    /// Bomb wiped the field
    Bomb { destroyed: u32 },
    LevelUp { level: u32 },
    /// Boss encounter started; boss arrives after the intro delay
    BossIncoming { level: u32 },
    BossSpawned,
    /// Boss removed (killed, rammed, bombed or escaped)
    BossGone,
    GameOver { score: u64, level: u32 },
}

impl GameEvent {
    /// Sound cue for this event, if any
    pub fn cue(&self) -> Option<SoundCue> {
        match self {
            GameEvent::Shot => Some(SoundCue::Shoot),
            GameEvent::PlayerHit { .. } => Some(SoundCue::Hit),
            GameEvent::EnemyKilled { .. } | GameEvent::Bomb { .. } => Some(SoundCue::Explosion),
            GameEvent::ComboExtended { .. } | GameEvent::PowerupCollected(_) => {
                Some(SoundCue::Powerup)
            }
            GameEvent::LevelUp { .. } => Some(SoundCue::LevelUp),
            GameEvent::BossIncoming { .. } => Some(SoundCue::Boss),
            GameEvent::ShieldDeflect
            | GameEvent::BossSpawned
            | GameEvent::BossGone
            | GameEvent::GameOver { .. } => None,
        }
    }
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct GameState {
    pub rng: Pcg32,
    pub field: Field,
    pub loadout: Loadout,
    pub phase: GamePhase,
    /// Unpaused ticks since run start (the session clock)
    pub time_ticks: u64,

    pub score: u64,
    pub lives: u32,
    pub level: u32,

    /// Current delay between regular spawns (ms)
    pub spawn_interval_ms: f64,
    /// Session clock at the last regular spawn (ms)
    pub last_spawn_ms: f64,

    // Session counters
    pub kills: u32,
    pub powerups_collected: u32,
    pub coins_earned: u64,
    pub bosses_killed: u32,

    /// Boss encounter in progress (spawning suspended)
    pub boss_active: bool,
    /// Ticks until the boss arrives (`None` once spawned / no encounter)
    pub boss_intro: Option<u32>,

    pub combo: Combo,
    pub buffs: Buffs,
    /// Ticks until the player may fire again
    pub fire_cooldown: u32,
    pub shake: ScreenShake,
    pub stars: Starfield,

    pub player: Player,
    pub projectiles: Vec<Projectile>,
    pub enemies: Vec<Enemy>,
    pub powerups: Vec<Powerup>,
    pub explosions: Vec<Explosion>,

    /// Events raised during the most recent tick
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Fresh run with the given seed, field and loadout
    pub fn new(seed: u64, field: Field, loadout: Loadout, star_count: usize) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let stars = Starfield::new(star_count, &field, &mut rng);

        let mut player = Player::new(&field);
        player.speed = loadout.player_speed;
        player.skin = loadout.skin;

        let level = 1;
        Self {
            rng,
            field,
            lives: loadout.starting_lives(),
            loadout,
            phase: GamePhase::Running,
            time_ticks: 0,
            score: 0,
            level,
            spawn_interval_ms: difficulty::BASE_SPAWN_INTERVAL_MS,
            last_spawn_ms: 0.0,
            kills: 0,
            powerups_collected: 0,
            coins_earned: 0,
            bosses_killed: 0,
            boss_active: false,
            boss_intro: None,
            combo: Combo::default(),
            buffs: Buffs::default(),
            fire_cooldown: 0,
            shake: ScreenShake::default(),
            stars,
            player,
            projectiles: Vec::new(),
            enemies: Vec::new(),
            powerups: Vec::new(),
            explosions: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Session clock in milliseconds
    pub fn clock_ms(&self) -> f64 {
        self.time_ticks as f64 * TICK_MS
    }

    pub fn max_lives(&self) -> u32 {
        self.loadout.max_lives()
    }

    /// Swap in a new loadout mid-run (e.g. sensitivity changed)
    pub fn apply_loadout(&mut self, loadout: Loadout) {
        self.player.speed = loadout.player_speed;
        self.player.skin = loadout.skin;
        self.loadout = loadout;
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Totals to flush into lifetime stats
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            score: self.score,
            level: self.level,
            kills: self.kills,
            bosses_killed: self.bosses_killed,
            coins_earned: self.coins_earned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = GameState::new(42, Field::default(), Loadout::default(), STAR_COUNT);
        assert_eq!(state.lives, 3);
        assert_eq!(state.score, 0);
        assert_eq!(state.level, 1);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.spawn_interval_ms, 2000.0);
        assert_eq!(state.stars.stars.len(), STAR_COUNT);
        assert!(state.enemies.is_empty());
        assert_eq!(state.max_lives(), 5);
    }

    #[test]
    fn test_bonus_lives_from_loadout() {
        let loadout = Loadout {
            bonus_lives: 2,
            ..Default::default()
        };
        let state = GameState::new(1, Field::default(), loadout, 0);
        assert_eq!(state.lives, 5);
        assert_eq!(state.max_lives(), 7);
    }

    #[test]
    fn test_buff_timers() {
        let mut buffs = Buffs::default();
        assert!(buffs.activate(PowerupKind::Shield));
        assert!(!buffs.activate(PowerupKind::Bomb));
        assert_eq!(buffs.shield, SHIELD_TICKS);
        for _ in 0..SHIELD_TICKS {
            assert!(buffs.shield_active());
            buffs.tick();
        }
        assert!(!buffs.shield_active());
        buffs.tick();
        assert_eq!(buffs.shield, 0);
    }

    #[test]
    fn test_shake_decays_to_rest() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut shake = ScreenShake::default();
        shake.kick(10.0);
        let mut ticks = 0;
        while shake.intensity > 0.0 {
            shake.decay(&mut rng);
            assert!(shake.offset.x.abs() <= 5.0 && shake.offset.y.abs() <= 5.0);
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(shake.offset, Vec2::ZERO);
    }

    #[test]
    fn test_disabled_shake_ignores_kicks() {
        let mut shake = ScreenShake {
            enabled: false,
            ..Default::default()
        };
        shake.kick(20.0);
        assert_eq!(shake.intensity, 0.0);
    }

    #[test]
    fn test_starfield_wraps() {
        let field = Field::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut stars = Starfield::new(10, &field, &mut rng);
        stars.stars[0].pos.y = field.height;
        stars.stars[0].speed = 1.0;
        stars.advance(&field, &mut rng);
        assert_eq!(stars.stars[0].pos.y, 0.0);
    }
}
