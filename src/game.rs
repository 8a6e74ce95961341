//! Session orchestrator
//!
//! [`Game`] ties one run's [`GameState`] to the persistent progression
//! record, the player's settings and the music sequencer. The platform layer
//! calls [`Game::frame`] once per display refresh and stops scheduling when it
//! returns [`FrameStatus::Halt`].

use crate::audio::{AudioSink, MusicSequencer};
use crate::consts::TICK_MS;
use crate::persistence::BlobStore;
use crate::progression::ProgressionStore;
use crate::renderer::RenderSink;
use crate::settings::Settings;
use crate::sim::combo::coin_multiplier;
use crate::sim::difficulty;
use crate::sim::entity::PowerupKind;
use crate::sim::state::{Field, GameEvent, GamePhase, GameState};
use crate::sim::tick::{TickInput, activate_powerup, tick};

/// Whether the frame loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    /// Run is over; do not schedule another frame
    Halt,
}

/// Snapshot of everything the HUD shows
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub score: u64,
    pub level: u32,
    pub lives: u32,
    pub max_lives: u32,
    /// Coin balance
    pub coins: u64,
    /// Coins earned this run (not yet banked)
    pub coins_earned: u64,
    pub shield_ticks: u32,
    pub rapid_fire_ticks: u32,
    pub multi_shot_ticks: u32,
    pub combo: u32,
    /// Multiplier the next kill scores with
    pub combo_multiplier: f64,
    /// Combo banner opacity; 0.0 while hidden
    pub combo_alpha: f32,
    /// Coin payout factor from skin and upgrades
    pub coin_multiplier: f64,
    /// Progress toward the next level (0.0 - 1.0)
    pub level_progress: f32,
    pub boss_active: bool,
    pub phase: GamePhase,
}

/// One play session: a run plus the persistent record around it
pub struct Game<S: BlobStore> {
    state: GameState,
    progression: ProgressionStore<S>,
    settings: Settings,
    music: MusicSequencer,
    /// Stats already recorded for the current run
    stats_flushed: bool,
}

impl<S: BlobStore> Game<S> {
    /// Load progression from `store` and prepare an initial run
    pub fn new(store: S, settings: Settings, seed: u64, field: Field) -> Self {
        let progression = ProgressionStore::load(store);
        let state = GameState::new(seed, field, progression.loadout(), settings.star_count());
        let mut game = Self {
            state,
            progression,
            settings,
            music: MusicSequencer::new(),
            stats_flushed: false,
        };
        game.start_run(seed, field);
        game
    }

    /// Reset the session state and begin a new run
    pub fn start_run(&mut self, seed: u64, field: Field) {
        let loadout = self.progression.loadout();
        log::info!(
            "Starting run (seed {}, {} lives, skin {})",
            seed,
            loadout.starting_lives(),
            loadout.skin.name()
        );
        self.state = GameState::new(seed, field, loadout, self.settings.star_count());
        self.state.shake.enabled = self.settings.effective_screen_shake();
        self.stats_flushed = false;

        let record = self.progression.record();
        if record.music_enabled {
            self.music.start(record.equipped_music);
        } else {
            self.music.stop();
        }
    }

    /// Advance one frame: simulate, forward sound, and flush stats at game over
    pub fn frame(
        &mut self,
        input: &TickInput,
        render: &mut dyn RenderSink,
        audio: &mut dyn AudioSink,
    ) -> FrameStatus {
        if self.stats_flushed {
            return FrameStatus::Halt;
        }

        tick(&mut self.state, input, render);
        self.dispatch_events(0, audio);

        if self.state.phase == GamePhase::Running {
            self.music.advance(TICK_MS, audio);
        }

        if self.state.is_over() {
            self.finish_run();
            return FrameStatus::Halt;
        }
        FrameStatus::Continue
    }

    /// Forward events from index `from` on to the audio sink and music
    fn dispatch_events(&mut self, from: usize, audio: &mut dyn AudioSink) {
        for event in &self.state.events[from..] {
            if let Some(cue) = event.cue() {
                audio.play_cue(cue);
            }
            match event {
                GameEvent::BossIncoming { .. } => self.music.stop(),
                GameEvent::BossGone => {
                    let record = self.progression.record();
                    if record.music_enabled {
                        self.music.start(record.equipped_music);
                    }
                }
                _ => {}
            }
        }
    }

    fn finish_run(&mut self) {
        if self.stats_flushed {
            return;
        }
        self.stats_flushed = true;
        self.music.stop();
        let summary = self.state.summary();
        self.progression.record_run(&summary);
    }

    /// Abandon the current run, banking its coins without recording stats
    pub fn quit_run(&mut self) {
        if self.stats_flushed {
            return;
        }
        self.stats_flushed = true;
        self.music.stop();
        log::info!(
            "Run abandoned at score {}, banking {} coins",
            self.state.score,
            self.state.coins_earned
        );
        self.progression.bank_coins(self.state.coins_earned);
    }

    /// Spend an inventory charge and apply it to the running session
    ///
    /// Runs between frames, so its events are forwarded here rather than by
    /// the next [`Game::frame`].
    pub fn use_powerup(&mut self, kind: PowerupKind, audio: &mut dyn AudioSink) -> bool {
        if self.state.phase != GamePhase::Running {
            return false;
        }
        if !self.progression.use_powerup(kind) {
            return false;
        }
        let from = self.state.events.len();
        activate_powerup(&mut self.state, kind);
        self.dispatch_events(from, audio);
        true
    }

    /// Replace the settings, persist them and apply shake to the current run
    pub fn update_settings(&mut self, mut settings: Settings) {
        settings.sanitize();
        if settings == self.settings {
            return;
        }
        settings.save(self.progression.store_mut());
        self.state.shake.enabled = settings.effective_screen_shake();
        self.settings = settings;
    }

    /// Change sensitivity; applies to the player immediately
    pub fn set_sensitivity(&mut self, value: f32) -> bool {
        let changed = self.progression.set_sensitivity(value);
        if changed {
            self.state.apply_loadout(self.progression.loadout());
        }
        changed
    }

    pub fn toggle_music(&mut self) -> bool {
        let changed = self.progression.toggle_music();
        let record = self.progression.record();
        if !record.music_enabled {
            self.music.stop();
        } else if !self.state.boss_active && !self.state.is_over() {
            self.music.start(record.equipped_music);
        }
        changed
    }

    /// Pause outside the frame input (e.g. focus lost)
    pub fn pause(&mut self) {
        if self.state.phase == GamePhase::Running {
            self.state.phase = GamePhase::Paused;
        }
    }

    pub fn hud(&self) -> Hud {
        let state = &self.state;
        let combo_alpha = if state.combo.is_displayed() {
            state.combo.display_alpha(state.clock_ms())
        } else {
            0.0
        };
        Hud {
            score: state.score,
            level: state.level,
            lives: state.lives,
            max_lives: state.max_lives(),
            coins: self.progression.coins(),
            coins_earned: state.coins_earned,
            shield_ticks: state.buffs.shield,
            rapid_fire_ticks: state.buffs.rapid_fire,
            multi_shot_ticks: state.buffs.multi_shot,
            combo: state.combo.count,
            combo_multiplier: state.combo.multiplier(),
            combo_alpha,
            coin_multiplier: coin_multiplier(state.loadout.coin_pct),
            level_progress: difficulty::level_progress(state.level, state.score),
            boss_active: state.boss_active,
            phase: state.phase,
        }
    }

    /// Events raised by the most recent frame
    pub fn events(&self) -> &[GameEvent] {
        &self.state.events
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn music(&self) -> &MusicSequencer {
        &self.music
    }

    pub fn progression(&self) -> &ProgressionStore<S> {
        &self.progression
    }

    /// Shop access between runs
    pub fn progression_mut(&mut self) -> &mut ProgressionStore<S> {
        &mut self.progression
    }
}
