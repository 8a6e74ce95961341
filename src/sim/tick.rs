//! Per-frame simulation tick
//!
//! Advances the session by exactly one step in a fixed order. Collections
//! are walked by descending index so removal never disturbs the entries
//! still to be visited.

use glam::Vec2;
use rand::Rng;

use super::collision::aabb_intersects;
use super::combo::{KillTarget, bomb_reward, kill_reward};
use super::difficulty;
use super::entity::{Enemy, Entity, Explosion, Owner, Powerup, PowerupKind, Projectile};
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;
use crate::renderer::{Drawable, RenderSink};

/// Input signals for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Move left (held)
    pub left: bool,
    /// Move right (held)
    pub right: bool,
    /// Fire (held)
    pub fire: bool,
    /// Pause toggle (edge)
    pub pause: bool,
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput, render: &mut dyn RenderSink) {
    state.events.clear();

    if input.pause {
        match state.phase {
            GamePhase::Running => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Running,
            GamePhase::GameOver => {}
        }
    }

    if state.phase != GamePhase::Running {
        return;
    }

    state.time_ticks += 1;
    let now = state.clock_ms();

    // 1. Combo window
    state.combo.expire(now);

    // 2. Screen shake
    state.shake.decay(&mut state.rng);

    // 3. Starfield
    state.stars.advance(&state.field, &mut state.rng);
    render.draw(Drawable::Background {
        stars: &state.stars.stars,
        shake: state.shake.offset,
    });

    // 4. Countdowns
    update_timers(state);

    // 5. Regular spawns
    spawn_enemy(state, now);

    // 6. Player
    update_player(state, input, render);

    // 7-10. Transient entities
    if update_projectiles(state, render) {
        return;
    }
    update_powerups(state, render);
    if update_enemies(state, now, render) {
        return;
    }
    update_explosions(state, render);
}

fn update_timers(state: &mut GameState) {
    state.buffs.tick();
    state.fire_cooldown = state.fire_cooldown.saturating_sub(1);

    if let Some(remaining) = state.boss_intro {
        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            state.boss_intro = None;
            state.enemies.push(Enemy::spawn_boss(state.level, &state.field));
            state.events.push(GameEvent::BossSpawned);
            log::info!("Boss spawned at level {}", state.level);
        } else {
            state.boss_intro = Some(remaining);
        }
    }
}

fn spawn_enemy(state: &mut GameState, now: f64) {
    if state.boss_active || now - state.last_spawn_ms <= state.spawn_interval_ms {
        return;
    }
    let enemy = Enemy::spawn_regular(state.level, &state.field, &mut state.rng);
    state.enemies.push(enemy);
    state.last_spawn_ms = now;
}

fn update_player(state: &mut GameState, input: &TickInput, render: &mut dyn RenderSink) {
    state.player.update(input.left, input.right, &state.field);

    if input.fire && state.fire_cooldown == 0 {
        let level = state.level;
        state
            .projectiles
            .push(Projectile::new(state.player.nose(), level, Owner::Player));
        if state.buffs.multi_shot_active() {
            for wing in state.player.wings() {
                state.projectiles.push(Projectile::new(wing, level, Owner::Player));
            }
        }
        state.fire_cooldown = if state.buffs.rapid_fire_active() {
            RAPID_FIRE_COOLDOWN_TICKS
        } else {
            FIRE_COOLDOWN_TICKS
        };
        state.events.push(GameEvent::Shot);
    }

    state.player.draw(render, state.buffs.shield_active());
}

/// Returns true when the run ended
fn update_projectiles(state: &mut GameState, render: &mut dyn RenderSink) -> bool {
    let field = state.field;
    let mut i = state.projectiles.len();
    while i > 0 {
        i -= 1;

        let shot = &mut state.projectiles[i];
        shot.update(&field);
        if shot.is_expired(&field) {
            state.projectiles.remove(i);
            continue;
        }

        if shot.is_enemy() && aabb_intersects(&shot.bounds(), &state.player.bounds()) {
            state.projectiles.remove(i);
            if state.buffs.shield_active() {
                state.shake.kick(SHAKE_SHIELD_DEFLECT);
                state.events.push(GameEvent::ShieldDeflect);
            } else {
                state.shake.kick(SHAKE_PLAYER_HIT);
                if lose_life(state) {
                    return true;
                }
            }
            continue;
        }

        state.projectiles[i].draw(render);
    }
    false
}

fn update_powerups(state: &mut GameState, render: &mut dyn RenderSink) {
    let field = state.field;
    let mut i = state.powerups.len();
    while i > 0 {
        i -= 1;

        let pickup = &mut state.powerups[i];
        pickup.update(&field);
        if pickup.is_expired(&field) {
            state.powerups.remove(i);
            continue;
        }

        if aabb_intersects(&pickup.bounds(), &state.player.bounds()) {
            let pickup = state.powerups.remove(i);
            state.powerups_collected += 1;
            activate_powerup(state, pickup.kind);
            continue;
        }

        state.powerups[i].draw(render);
    }
}

/// Returns true when the run ended
fn update_enemies(state: &mut GameState, now: f64, render: &mut dyn RenderSink) -> bool {
    let field = state.field;
    let level = state.level;
    let damage = state.loadout.damage;

    let mut i = state.enemies.len();
    loop {
        // A boss trigger may clear the field mid-pass
        i = i.min(state.enemies.len());
        if i == 0 {
            break;
        }
        i -= 1;

        let enemy = &mut state.enemies[i];
        enemy.update(&field);
        if enemy.is_expired(&field) {
            let gone = state.enemies.remove(i);
            if gone.boss {
                end_boss_encounter(state);
            }
            continue;
        }

        let shots = enemy.fire(level, &mut state.rng);
        let bounds = enemy.bounds();
        state.projectiles.extend(shots);

        // First player shot in stored order wins
        let hit = state
            .projectiles
            .iter()
            .position(|p| !p.is_enemy() && aabb_intersects(&p.bounds(), &bounds));
        if let Some(j) = hit {
            state.projectiles.remove(j);
            if state.enemies[i].take_damage(damage) {
                let dead = state.enemies.remove(i);
                kill_enemy(state, dead, now);
                continue;
            }
        }

        if aabb_intersects(&bounds, &state.player.bounds()) {
            let rammed = state.enemies.remove(i);
            if ram_player(state, &rammed) {
                return true;
            }
            continue;
        }

        state.enemies[i].draw(render);
    }
    false
}

fn update_explosions(state: &mut GameState, render: &mut dyn RenderSink) {
    let field = state.field;
    let mut i = state.explosions.len();
    while i > 0 {
        i -= 1;
        let burst = &mut state.explosions[i];
        burst.update(&field);
        if burst.is_expired(&field) {
            state.explosions.remove(i);
            continue;
        }
        state.explosions[i].draw(render);
    }
}

fn explode(state: &mut GameState, center: Vec2, big: bool) {
    let burst = Explosion::new(center, big, &mut state.rng);
    state.explosions.push(burst);
}

fn enemy_center(enemy: &Enemy) -> Vec2 {
    enemy.bounds().center()
}

/// Reward a destroyed enemy and roll its drop
fn kill_enemy(state: &mut GameState, enemy: Enemy, now: f64) {
    let center = enemy_center(&enemy);
    explode(state, center, enemy.boss);
    state
        .shake
        .kick(if enemy.boss { SHAKE_BOSS_KILL } else { SHAKE_KILL });

    let chain = state.combo.register_kill(now);
    let target = if enemy.boss {
        KillTarget::Boss
    } else {
        KillTarget::Regular {
            max_health: enemy.max_health,
        }
    };
    let reward = kill_reward(target, chain.multiplier_tenths, state.loadout.coin_pct);
    state.score += reward.score + chain.bonus;
    state.coins_earned += reward.coins;
    state.kills += 1;
    state.events.push(GameEvent::EnemyKilled {
        boss: enemy.boss,
        score: reward.score,
        coins: reward.coins,
    });
    if chain.bonus > 0 {
        state.events.push(GameEvent::ComboExtended {
            count: chain.count,
            bonus: chain.bonus,
        });
    }

    if enemy.boss {
        state.bosses_killed += 1;
        end_boss_encounter(state);
        let kind = PowerupKind::random(&mut state.rng);
        state.powerups.push(Powerup::new(center, kind));
    } else if state.rng.random_bool(POWERUP_DROP_CHANCE) {
        let kind = PowerupKind::random(&mut state.rng);
        state.powerups.push(Powerup::new(center, kind));
    }

    check_level_up(state);
}

/// Enemy flew into the player; returns true when the run ended
fn ram_player(state: &mut GameState, enemy: &Enemy) -> bool {
    explode(state, enemy_center(enemy), false);
    state
        .shake
        .kick(if enemy.boss { SHAKE_BOSS_RAM } else { SHAKE_ENEMY_RAM });
    if enemy.boss {
        end_boss_encounter(state);
    }

    if state.buffs.shield_active() {
        state.events.push(GameEvent::ShieldDeflect);
        false
    } else {
        lose_life(state)
    }
}

/// Returns true when that was the last life
fn lose_life(state: &mut GameState) -> bool {
    state.lives = state.lives.saturating_sub(1);
    state.events.push(GameEvent::PlayerHit {
        lives_left: state.lives,
    });
    if state.lives == 0 {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::GameOver {
            score: state.score,
            level: state.level,
        });
        log::info!(
            "Game over: score {}, level {}, {} kills",
            state.score,
            state.level,
            state.kills
        );
        return true;
    }
    false
}

fn end_boss_encounter(state: &mut GameState) {
    if state.boss_active {
        state.boss_active = false;
        state.events.push(GameEvent::BossGone);
    }
}

/// Apply a power-up effect (pickup or inventory)
pub fn activate_powerup(state: &mut GameState, kind: PowerupKind) {
    state.events.push(GameEvent::PowerupCollected(kind));
    if state.buffs.activate(kind) {
        return;
    }

    match kind {
        PowerupKind::Health => {
            state.lives = (state.lives + 1).min(state.max_lives());
            state.score += HEALTH_PICKUP_SCORE;
            check_level_up(state);
        }
        PowerupKind::Bomb => detonate_bomb(state),
        PowerupKind::Shield | PowerupKind::RapidFire | PowerupKind::MultiShot => {}
    }
}

fn detonate_bomb(state: &mut GameState) {
    let enemies = std::mem::take(&mut state.enemies);
    let destroyed = enemies.len() as u32;
    for enemy in &enemies {
        explode(state, enemy_center(enemy), enemy.boss);
        let reward = bomb_reward(enemy.boss, state.loadout.coin_pct);
        state.score += reward.score;
        state.coins_earned += reward.coins;
        state.kills += 1;
        if enemy.boss {
            state.bosses_killed += 1;
            end_boss_encounter(state);
        }
    }
    state.events.push(GameEvent::Bomb { destroyed });
    check_level_up(state);
}

/// Raise the level by one if the score reached the current threshold
pub fn check_level_up(state: &mut GameState) {
    if state.score < difficulty::level_threshold(state.level) {
        return;
    }
    state.level += 1;
    state.spawn_interval_ms = difficulty::spawn_interval_ms(state.level);
    state.events.push(GameEvent::LevelUp { level: state.level });
    log::info!("Level up: {} (score {})", state.level, state.score);

    if difficulty::is_boss_level(state.level) {
        trigger_boss(state);
    }
}

/// Clear the field and start the boss intro countdown
pub fn trigger_boss(state: &mut GameState) {
    state.enemies.retain(|e| e.boss);
    state.boss_active = true;
    state.boss_intro = Some(BOSS_INTRO_TICKS);
    state.events.push(GameEvent::BossIncoming { level: state.level });
    log::info!("Boss incoming at level {}", state.level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{NullRenderer, RecordingRenderer};
    use crate::sim::state::{Field, Loadout};

    fn new_state() -> GameState {
        GameState::new(12345, Field::default(), Loadout::default(), 10)
    }

    fn run(state: &mut GameState, input: &TickInput) {
        tick(state, input, &mut NullRenderer);
    }

    /// Stationary regular enemy that will not shoot this tick
    fn parked_enemy(state: &mut GameState, x: f32, y: f32) -> Enemy {
        let mut enemy = Enemy::spawn_regular(state.level, &state.field, &mut state.rng);
        enemy.pos = Vec2::new(x, y);
        enemy.speed = 0.0;
        enemy.health = 1.0;
        enemy.max_health = 1;
        enemy.shoot_cooldown = 1000;
        enemy
    }

    #[test]
    fn test_pause_freezes_state() {
        let mut state = new_state();
        let e = parked_enemy(&mut state, 100.0, 100.0);
        state.enemies.push(e);
        state.enemies[0].speed = 3.0;

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        run(&mut state, &pause);
        assert_eq!(state.phase, GamePhase::Paused);
        assert_eq!(state.time_ticks, 0);

        let held = TickInput {
            left: true,
            fire: true,
            ..Default::default()
        };
        let player_x = state.player.pos.x;
        for _ in 0..30 {
            run(&mut state, &held);
        }
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.enemies[0].pos, Vec2::new(100.0, 100.0));
        assert_eq!(state.player.pos.x, player_x);
        assert!(state.projectiles.is_empty());

        run(&mut state, &pause);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.time_ticks, 1);
        assert_eq!(state.enemies[0].pos.y, 103.0);
    }

    #[test]
    fn test_fire_cooldown_and_multishot() {
        let mut state = new_state();
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        run(&mut state, &fire);
        assert_eq!(state.projectiles.len(), 1);
        assert!(state.events.contains(&GameEvent::Shot));

        for _ in 0..(FIRE_COOLDOWN_TICKS - 1) {
            run(&mut state, &fire);
        }
        assert_eq!(state.projectiles.len(), 1);
        run(&mut state, &fire);
        assert_eq!(state.projectiles.len(), 2);

        state.projectiles.clear();
        state.fire_cooldown = 0;
        state.buffs.activate(PowerupKind::MultiShot);
        state.buffs.activate(PowerupKind::RapidFire);
        run(&mut state, &fire);
        assert_eq!(state.projectiles.len(), 3);
        assert_eq!(state.fire_cooldown, RAPID_FIRE_COOLDOWN_TICKS);
    }

    #[test]
    fn test_level_up_on_exact_threshold() {
        let mut state = new_state();
        state.score = 400;
        let e = parked_enemy(&mut state, 100.0, 100.0);
        state.enemies.push(e);
        state.projectiles.push(Projectile::new(Vec2::new(110.0, 110.0), 1, Owner::Player));

        run(&mut state, &TickInput::default());
        assert_eq!(state.score, 500);
        assert_eq!(state.level, 2);
        assert_eq!(state.spawn_interval_ms, 1600.0);
        assert!(state.events.contains(&GameEvent::LevelUp { level: 2 }));
        assert_eq!(state.kills, 1);
        assert_eq!(state.coins_earned, 5);
    }

    #[test]
    fn test_boss_trigger_clears_field_and_spawns_after_intro() {
        let mut state = new_state();
        state.level = 4;
        state.score = 1900;
        for x in [100.0, 300.0, 500.0] {
            let e = parked_enemy(&mut state, x, 100.0);
            state.enemies.push(e);
        }
        // First enemy visited dies; the other two are still pending in the pass
        state.projectiles.push(Projectile::new(Vec2::new(510.0, 110.0), 4, Owner::Player));

        run(&mut state, &TickInput::default());
        assert_eq!(state.level, 5);
        assert!(state.boss_active);
        assert!(state.enemies.is_empty());
        assert_eq!(state.boss_intro, Some(BOSS_INTRO_TICKS));

        // Normal spawning is suspended for the whole intro
        for _ in 0..(BOSS_INTRO_TICKS - 1) {
            run(&mut state, &TickInput::default());
            assert!(state.enemies.is_empty());
        }
        run(&mut state, &TickInput::default());
        assert_eq!(state.enemies.len(), 1);
        assert!(state.enemies[0].boss);
        assert!(state.events.contains(&GameEvent::BossSpawned));
        assert_eq!(state.boss_intro, None);
    }

    #[test]
    fn test_boss_escape_resumes_spawning() {
        let mut state = new_state();
        state.boss_active = true;
        let mut boss = Enemy::spawn_boss(5, &state.field);
        boss.pos.y = state.field.height + 100.0;
        state.enemies.push(boss);

        run(&mut state, &TickInput::default());
        assert!(!state.boss_active);
        assert!(state.events.contains(&GameEvent::BossGone));
    }

    #[test]
    fn test_shot_kill_prevents_ram() {
        let mut state = new_state();
        let p = state.player.pos;
        let e = parked_enemy(&mut state, p.x, p.y);
        state.enemies.push(e);
        state
            .projectiles
            .push(Projectile::new(Vec2::new(p.x + 15.0, p.y + 10.0), 1, Owner::Player));

        run(&mut state, &TickInput::default());
        assert_eq!(state.lives, 3);
        assert_eq!(state.kills, 1);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_ram_costs_life_unless_shielded() {
        let mut state = new_state();
        let p = state.player.pos;
        let e = parked_enemy(&mut state, p.x, p.y);
        state.enemies.push(e);
        run(&mut state, &TickInput::default());
        assert_eq!(state.lives, 2);
        assert!(state.enemies.is_empty());
        assert_eq!(state.explosions.len(), 1);

        state.buffs.activate(PowerupKind::Shield);
        let e = parked_enemy(&mut state, p.x, p.y);
        state.enemies.push(e);
        run(&mut state, &TickInput::default());
        assert_eq!(state.lives, 2);
        assert!(state.events.contains(&GameEvent::ShieldDeflect));
    }

    #[test]
    fn test_last_life_ends_run() {
        let mut state = new_state();
        state.lives = 1;
        let p = state.player.pos;
        let mut shot = Projectile::new(Vec2::new(p.x + 20.0, p.y), 1, Owner::Enemy);
        shot.vel_y = 0.0;
        state.projectiles.push(shot);

        run(&mut state, &TickInput::default());
        assert_eq!(state.lives, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::GameOver { .. }))
        );

        let ticks = state.time_ticks;
        run(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_each_entity_drawn_once() {
        let mut state = new_state();
        for x in [50.0, 200.0, 350.0] {
            let e = parked_enemy(&mut state, x, 50.0);
            state.enemies.push(e);
        }
        state
            .projectiles
            .push(Projectile::new(Vec2::new(700.0, 300.0), 1, Owner::Player));
        state
            .projectiles
            .push(Projectile::new(Vec2::new(750.0, 300.0), 1, Owner::Player));
        state
            .powerups
            .push(Powerup::new(Vec2::new(600.0, 100.0), PowerupKind::Shield));
        let burst = Explosion::new(Vec2::new(400.0, 300.0), false, &mut state.rng);
        state.explosions.push(burst);

        let mut recorder = RecordingRenderer::default();
        tick(&mut state, &TickInput::default(), &mut recorder);
        assert_eq!(recorder.backgrounds, 1);
        assert_eq!(recorder.players, 1);
        assert_eq!(recorder.enemies, 3);
        assert_eq!(recorder.projectiles, 2);
        assert_eq!(recorder.powerups, 1);
        assert_eq!(recorder.explosions, 1);
    }

    #[test]
    fn test_bomb_clears_and_pays() {
        let mut state = new_state();
        for x in [50.0, 200.0, 350.0] {
            let e = parked_enemy(&mut state, x, 50.0);
            state.enemies.push(e);
        }
        activate_powerup(&mut state, PowerupKind::Bomb);
        assert!(state.enemies.is_empty());
        assert_eq!(state.score, 150);
        assert_eq!(state.coins_earned, 6);
        assert_eq!(state.kills, 3);
        assert_eq!(state.explosions.len(), 3);
        assert!(state.events.contains(&GameEvent::Bomb { destroyed: 3 }));
    }

    #[test]
    fn test_bomb_ends_boss_encounter() {
        let mut state = new_state();
        state.boss_active = true;
        let boss = Enemy::spawn_boss(5, &state.field);
        state.enemies.push(boss);
        activate_powerup(&mut state, PowerupKind::Bomb);
        assert!(!state.boss_active);
        assert_eq!(state.bosses_killed, 1);
        assert_eq!(state.kills, 1);
        assert_eq!(state.score, 100);
        assert_eq!(state.coins_earned, 10);
    }

    #[test]
    fn test_health_pickup_caps_lives() {
        let mut state = new_state();
        activate_powerup(&mut state, PowerupKind::Health);
        activate_powerup(&mut state, PowerupKind::Health);
        activate_powerup(&mut state, PowerupKind::Health);
        assert_eq!(state.lives, 5);
        assert_eq!(state.score, 150);
    }

    #[test]
    fn test_pickup_collection() {
        let mut state = new_state();
        let center = state.player.bounds().center();
        state.powerups.push(Powerup::new(center, PowerupKind::RapidFire));
        run(&mut state, &TickInput::default());
        assert!(state.powerups.is_empty());
        assert_eq!(state.powerups_collected, 1);
        assert!(state.buffs.rapid_fire_active());
    }

    #[test]
    fn test_same_seed_same_run() {
        let input = TickInput {
            fire: true,
            right: true,
            ..Default::default()
        };
        let mut a = new_state();
        let mut b = new_state();
        for _ in 0..1200 {
            run(&mut a, &input);
            run(&mut b, &input);
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.lives, b.lives);
        assert_eq!(a.kills, b.kills);
        assert_eq!(a.enemies.len(), b.enemies.len());
        for (ea, eb) in a.enemies.iter().zip(&b.enemies) {
            assert_eq!(ea.pos, eb.pos);
        }
    }

    #[test]
    fn test_regular_spawns_follow_interval() {
        let mut state = new_state();
        // 2000 ms at 60 Hz
        for _ in 0..119 {
            run(&mut state, &TickInput::default());
        }
        assert!(state.enemies.is_empty());
        run(&mut state, &TickInput::default());
        run(&mut state, &TickInput::default());
        assert_eq!(state.enemies.len(), 1);
    }
}
