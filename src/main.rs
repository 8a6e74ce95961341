//! Space Defender entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

    use space_defender::audio::AudioManager;
    use space_defender::persistence::LocalStorage;
    use space_defender::platform::InputState;
    use space_defender::renderer::CanvasRenderer;
    use space_defender::sim::{Field, GamePhase, PowerupKind};
    use space_defender::{FrameStatus, Game, Settings};

    /// Everything the browser callbacks share
    struct App {
        game: Game<LocalStorage>,
        renderer: CanvasRenderer,
        audio: AudioManager,
        input: InputState,
        field: Field,
        /// Frame loop stopped (game over)
        halted: bool,
    }

    impl App {
        /// Run one frame; returns false when the loop should stop
        fn frame(&mut self) -> bool {
            let input = self.input.take_tick_input();
            let status = self
                .game
                .frame(&input, &mut self.renderer, &mut self.audio);
            self.update_hud();
            if status == FrameStatus::Halt {
                self.halted = true;
                return false;
            }
            true
        }

        fn restart(&mut self) {
            let seed = js_sys::Date::now() as u64;
            self.input.clear();
            // Banks coins of a run cut short; no-op after game over
            self.game.quit_run();
            self.game.start_run(seed, self.field);
            log::info!("Game restarted with seed: {}", seed);
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud = self.game.hud();

            set_text(&document, "hud-score", &hud.score.to_string());
            set_text(&document, "hud-level", &hud.level.to_string());
            set_text(&document, "hud-lives", &format!("{}/{}", hud.lives, hud.max_lives));
            set_text(
                &document,
                "hud-coins",
                &format!(
                    "{} (+{}, x{:.2})",
                    hud.coins, hud.coins_earned, hud.coin_multiplier
                ),
            );
            set_text(
                &document,
                "hud-progress",
                &format!("{:.0}%", hud.level_progress * 100.0),
            );

            let combo_shown = hud.combo_alpha > 0.0;
            set_visible(&document, "hud-combo", combo_shown);
            if combo_shown {
                set_text(
                    &document,
                    "hud-combo",
                    &format!("{} combo (x{:.1})", hud.combo, hud.combo_multiplier),
                );
                if let Some(el) = document.get_element_by_id("hud-combo") {
                    let _ = el.set_attribute("style", &format!("opacity: {:.2}", hud.combo_alpha));
                }
            }

            set_visible(&document, "boss-warning", hud.boss_active);
            set_visible(&document, "pause-menu", hud.phase == GamePhase::Paused);

            let over = hud.phase == GamePhase::GameOver;
            set_visible(&document, "game-over", over);
            if over {
                set_text(&document, "final-score", &hud.score.to_string());
                set_text(&document, "final-level", &hud.level.to_string());
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Space Defender starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let field = Field::default();
        canvas.set_width(field.width as u32);
        canvas.set_height(field.height as u32);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .expect("get_context failed")
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");
        let renderer = CanvasRenderer::new(ctx, field.width as f64, field.height as f64);

        let settings = Settings::load(&LocalStorage);
        let mut audio = AudioManager::new();
        audio.set_volumes(
            settings.master_volume,
            settings.sfx_volume,
            settings.music_volume,
        );

        let seed = js_sys::Date::now() as u64;
        let game = Game::new(LocalStorage, settings, seed, field);
        log::info!("Game initialized with seed: {}", seed);

        let app = Rc::new(RefCell::new(App {
            game,
            renderer,
            audio,
            input: InputState::new(),
            field,
            halted: false,
        }));

        setup_input_handlers(app.clone());
        setup_restart_button(app.clone());
        setup_settings_buttons(app.clone());
        setup_auto_pause(app.clone());

        request_animation_frame(app);

        log::info!("Space Defender running!");
    }

    fn setup_input_handlers(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");

        // Key down
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut a = app.borrow_mut();
                // Browsers only allow audio after a user gesture
                a.audio.resume();

                let code = event.code();
                if a.input.key_down(&code) {
                    event.prevent_default();
                    return;
                }

                // Digit1..Digit5 spend an inventory charge
                let slot = code
                    .strip_prefix("Digit")
                    .and_then(|n| n.parse::<usize>().ok())
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| PowerupKind::ALL.get(i).copied());
                let App { game, audio, .. } = &mut *a;
                if let Some(kind) = slot
                    && !event.repeat()
                    && game.use_powerup(kind, audio)
                {
                    log::info!("Used {} from inventory", kind.as_str());
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                app.borrow_mut().input.key_up(&event.code());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            game_loop(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>) {
        let keep_going = app.borrow_mut().frame();
        if keep_going {
            request_animation_frame(app);
        } else {
            log::info!("Frame loop stopped");
        }
    }

    fn setup_restart_button(app: Rc<RefCell<App>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let was_halted = {
                    let mut a = app.borrow_mut();
                    a.restart();
                    std::mem::replace(&mut a.halted, false)
                };
                // Loop stopped at game over; start it again
                if was_halted {
                    request_animation_frame(app.clone());
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Pause-menu toggles for music and screen shake
    fn setup_settings_buttons(app: Rc<RefCell<App>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("music-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut a = app.borrow_mut();
                a.game.toggle_music();
                log::info!(
                    "Music {}",
                    if a.game.progression().record().music_enabled { "on" } else { "off" }
                );
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("shake-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut a = app.borrow_mut();
                let mut settings = a.game.settings().clone();
                settings.screen_shake = !settings.screen_shake;
                a.game.update_settings(settings);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut a = app.borrow_mut();
                    a.input.clear();
                    a.game.pause();
                    log::info!("Auto-paused (tab hidden)");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut a = app.borrow_mut();
                a.input.clear();
                a.game.pause();
                if a.game.settings().mute_on_blur {
                    a.audio.set_muted(true);
                }
                log::info!("Auto-paused (window blur)");
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Focus regained: unmute, stay paused until the player resumes
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                app.borrow_mut().audio.set_muted(false);
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Space Defender (native) starting...");
    log::info!("Native mode runs a headless autopilot session - use `trunk serve` to play");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0x5eed);
    headless::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use space_defender::audio::NullAudio;
    use space_defender::persistence::FileStore;
    use space_defender::renderer::NullRenderer;
    use space_defender::sim::{Field, GameState, TickInput};
    use space_defender::{FrameStatus, Game, Settings};

    /// Five minutes at 60 Hz
    const MAX_FRAMES: u32 = 60 * 60 * 5;

    /// Steer under the lowest enemy and hold fire
    fn autopilot(state: &GameState) -> TickInput {
        let player_x = state.player.pos.x + state.player.size.x / 2.0;
        let target = state
            .enemies
            .iter()
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|e| e.pos.x + e.size / 2.0);

        let mut input = TickInput {
            fire: true,
            ..Default::default()
        };
        if let Some(x) = target {
            input.left = x < player_x - 4.0;
            input.right = x > player_x + 4.0;
        }
        input
    }

    pub fn run(seed: u64) {
        let dir = std::env::temp_dir().join("space-defender");
        let store = FileStore::new(&dir);
        let settings = Settings::load(&store);
        let mut game = Game::new(store, settings, seed, Field::default());

        let mut frames = 0;
        while frames < MAX_FRAMES {
            let input = autopilot(game.state());
            frames += 1;
            if game.frame(&input, &mut NullRenderer, &mut NullAudio) == FrameStatus::Halt {
                break;
            }
        }
        if frames >= MAX_FRAMES {
            game.quit_run();
        }

        let hud = game.hud();
        let record = game.progression().record();
        log::info!(
            "Session over after {} frames: score {}, level {}, {} kills",
            frames,
            hud.score,
            hud.level,
            game.state().kills
        );
        log::info!(
            "Lifetime: {} games, high score {}, {} coins (saved in {})",
            record.stats.games_played,
            record.stats.high_score,
            record.total_coins,
            dir.display()
        );
    }
}
