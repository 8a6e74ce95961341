//! Keyboard input
//!
//! Key codes follow `KeyboardEvent.code`. Held actions stay set until the key
//! is released; pause is an edge reported once per press.

use crate::sim::tick::TickInput;

/// Game action bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Fire,
    Pause,
}

/// Map a `KeyboardEvent.code` to its action
pub fn action_for_code(code: &str) -> Option<Action> {
    match code {
        "ArrowLeft" | "KeyA" => Some(Action::Left),
        "ArrowRight" | "KeyD" => Some(Action::Right),
        "Space" => Some(Action::Fire),
        "KeyP" => Some(Action::Pause),
        _ => None,
    }
}

/// Held/pressed state accumulated between frames
#[derive(Debug, Clone, Default)]
pub struct InputState {
    left: bool,
    right: bool,
    fire: bool,
    pause_pressed: bool,
    /// Pause key currently down (suppresses auto-repeat)
    pause_held: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key pressed; returns true if the code is bound
    pub fn key_down(&mut self, code: &str) -> bool {
        let Some(action) = action_for_code(code) else {
            return false;
        };
        match action {
            Action::Left => self.left = true,
            Action::Right => self.right = true,
            Action::Fire => self.fire = true,
            Action::Pause => {
                if !self.pause_held {
                    self.pause_pressed = true;
                }
                self.pause_held = true;
            }
        }
        true
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        let Some(action) = action_for_code(code) else {
            return false;
        };
        match action {
            Action::Left => self.left = false,
            Action::Right => self.right = false,
            Action::Fire => self.fire = false,
            Action::Pause => self.pause_held = false,
        }
        true
    }

    /// Release everything (focus lost)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Input for the next tick; consumes the pause edge
    pub fn take_tick_input(&mut self) -> TickInput {
        let input = TickInput {
            left: self.left,
            right: self.right,
            fire: self.fire,
            pause: self.pause_pressed,
        };
        self.pause_pressed = false;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(action_for_code("ArrowLeft"), Some(Action::Left));
        assert_eq!(action_for_code("KeyA"), Some(Action::Left));
        assert_eq!(action_for_code("KeyD"), Some(Action::Right));
        assert_eq!(action_for_code("Space"), Some(Action::Fire));
        assert_eq!(action_for_code("KeyP"), Some(Action::Pause));
        assert_eq!(action_for_code("KeyQ"), None);
    }

    #[test]
    fn test_held_keys_persist() {
        let mut input = InputState::new();
        assert!(input.key_down("ArrowRight"));
        assert!(input.key_down("Space"));
        for _ in 0..3 {
            let tick = input.take_tick_input();
            assert!(tick.right && tick.fire && !tick.left);
        }
        input.key_up("Space");
        assert!(!input.take_tick_input().fire);
    }

    #[test]
    fn test_pause_is_one_shot() {
        let mut input = InputState::new();
        input.key_down("KeyP");
        // Auto-repeat while held
        input.key_down("KeyP");
        assert!(input.take_tick_input().pause);
        assert!(!input.take_tick_input().pause);

        input.key_up("KeyP");
        input.key_down("KeyP");
        assert!(input.take_tick_input().pause);
    }

    #[test]
    fn test_unbound_keys_ignored() {
        let mut input = InputState::new();
        assert!(!input.key_down("F5"));
        assert_eq!(input.take_tick_input(), TickInput::default());
    }

    #[test]
    fn test_clear_releases_all() {
        let mut input = InputState::new();
        input.key_down("KeyA");
        input.key_down("Space");
        input.clear();
        assert_eq!(input.take_tick_input(), TickInput::default());
    }
}
