//! Platform abstraction layer
//!
//! Translates device events into simulation input. Storage backends live in
//! [`crate::persistence`], sinks in [`crate::renderer`] and [`crate::audio`].

pub mod input;

pub use input::{Action, InputState, action_for_code};
