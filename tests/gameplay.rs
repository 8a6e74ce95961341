//! End-to-end runs through the public API

use glam::Vec2;

use space_defender::audio::{RecordingAudio, SoundCue};
use space_defender::persistence::MemoryStore;
use space_defender::progression::{DATA_KEY, UpgradeKind};
use space_defender::renderer::{NullRenderer, RecordingRenderer};
use space_defender::sim::{Enemy, Field, GameEvent, GamePhase, Owner, Projectile, TickInput};
use space_defender::{FrameStatus, Game, ProgressionRecord, Settings};

fn new_game(store: MemoryStore) -> Game<MemoryStore> {
    Game::new(store, Settings::default(), 2024, Field::default())
}

/// Park a one-hit enemy at `pos` with a player shot already inside it
fn stage_kill(game: &mut Game<MemoryStore>, pos: Vec2) {
    let state = game.state_mut();
    let mut enemy = Enemy::spawn_regular(state.level, &state.field, &mut state.rng);
    enemy.pos = pos;
    enemy.speed = 0.0;
    enemy.health = 1.0;
    enemy.max_health = 1;
    enemy.shoot_cooldown = 1000;
    state.enemies.push(enemy);

    let level = state.level;
    state.projectiles.push(Projectile::new(
        pos + Vec2::new(18.0, 25.0),
        level,
        Owner::Player,
    ));
}

#[test]
fn five_quick_kills_score_with_combo() {
    let mut game = new_game(MemoryStore::new());
    let hud = game.hud();
    assert_eq!((hud.lives, hud.score, hud.level), (3, 0, 1));

    let mut audio = RecordingAudio::default();
    for i in 0..5 {
        stage_kill(&mut game, Vec2::new(100.0 + 120.0 * i as f32, 150.0));
        let status = game.frame(&TickInput::default(), &mut NullRenderer, &mut audio);
        assert_eq!(status, FrameStatus::Continue);
        assert!(
            game.events()
                .iter()
                .any(|e| matches!(e, GameEvent::EnemyKilled { boss: false, .. }))
        );
    }

    // 100 x (1.0 + 1.1 + 1.2 + 1.3 + 1.4) + 50 x (2 + 3 + 4 + 5)
    let hud = game.hud();
    assert_eq!(hud.score, 1300);
    assert_eq!(hud.combo, 5);
    assert_eq!(hud.lives, 3);
    assert_eq!(game.state().kills, 5);
    assert!(audio.cues.contains(&SoundCue::Explosion));
    assert!(audio.cues.contains(&SoundCue::LevelUp));
    assert!(hud.level > 1);
}

#[test]
fn game_over_persists_stats_once() {
    let mut game = new_game(MemoryStore::new());
    game.state_mut().lives = 1;

    // Enemy shot parked on the player
    let state = game.state_mut();
    let target = state.player.pos + Vec2::new(20.0, 0.0);
    let mut shot = Projectile::new(target, 1, Owner::Enemy);
    shot.vel_y = 0.0;
    state.projectiles.push(shot);

    let mut audio = RecordingAudio::default();
    let status = game.frame(&TickInput::default(), &mut NullRenderer, &mut audio);
    assert_eq!(status, FrameStatus::Halt);
    assert_eq!(game.hud().phase, GamePhase::GameOver);
    assert!(audio.cues.contains(&SoundCue::Hit));

    let record = game.progression().record();
    assert_eq!(record.stats.games_played, 1);
    assert_eq!(game.progression().store().writes(), 1);

    // Later frames do nothing
    let ticks = game.state().time_ticks;
    let mut render = RecordingRenderer::default();
    for _ in 0..10 {
        let status = game.frame(&TickInput::default(), &mut render, &mut audio);
        assert_eq!(status, FrameStatus::Halt);
    }
    assert_eq!(render.total(), 0);
    assert_eq!(game.state().time_ticks, ticks);
    assert_eq!(game.progression().store().writes(), 1);

    let saved = game.progression().store().get(DATA_KEY).unwrap();
    let reloaded = ProgressionRecord::from_json(saved);
    assert_eq!(reloaded.stats.games_played, 1);
}

#[test]
fn progression_carries_into_next_session() {
    let record = ProgressionRecord {
        total_coins: 1000,
        ..Default::default()
    };
    let blob = record.to_json().unwrap();
    let mut game = new_game(MemoryStore::new().with_blob(DATA_KEY, &blob));

    assert!(game.progression_mut().buy_upgrade(UpgradeKind::HealthBoost));
    assert_eq!(game.progression().coins(), 600);

    // Loadout applies from the next run
    game.start_run(1, Field::default());
    let hud = game.hud();
    assert_eq!(hud.lives, 4);
    assert_eq!(hud.max_lives, 6);
}

#[test]
fn pause_holds_the_run() {
    let mut game = new_game(MemoryStore::new());
    let pause = TickInput {
        pause: true,
        ..Default::default()
    };
    game.frame(&pause, &mut NullRenderer, &mut RecordingAudio::default());
    assert_eq!(game.hud().phase, GamePhase::Paused);

    let mut audio = RecordingAudio::default();
    for _ in 0..120 {
        let status = game.frame(&TickInput::default(), &mut NullRenderer, &mut audio);
        assert_eq!(status, FrameStatus::Continue);
    }
    assert_eq!(game.state().time_ticks, 0);
    assert!(audio.notes.is_empty());

    game.frame(&pause, &mut NullRenderer, &mut audio);
    assert_eq!(game.hud().phase, GamePhase::Running);
    assert_eq!(game.state().time_ticks, 1);
}
